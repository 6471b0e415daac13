//! Handler reassignment after a decline.
//!
//! A new target must be checked against the directory before it can be
//! handed to the state machine. [`resolve_target`] is the only way to get a
//! [`VerifiedTarget`], so the machine never sees an unchecked pair, and the
//! swap of target and status happens in one [`crate::machine::apply`] call.

use crate::{
  directory::Directory,
  error::{Error, Result, TransitionError},
  request::{DelegationRequest, Target},
  status::Role,
};

/// A (division, person) pair whose membership and handler role have been
/// confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedTarget(Target);

impl VerifiedTarget {
  pub fn target(&self) -> Target { self.0 }

  #[cfg(test)]
  pub(crate) fn assume_verified(target: Target) -> Self { Self(target) }
}

/// Confirm that `target.person_id` is a handler in `target.division_id`.
pub async fn resolve_target<D: Directory>(
  directory: &D,
  target: Target,
) -> Result<VerifiedTarget> {
  let divisions = directory.list_divisions().await.map_err(Error::upstream)?;
  if !divisions.iter().any(|d| d.id == target.division_id) {
    return Err(
      TransitionError::validation(format!(
        "division {} does not exist",
        target.division_id
      ))
      .into(),
    );
  }

  let people = directory
    .list_people(target.division_id)
    .await
    .map_err(Error::upstream)?;
  let Some(person) = people.iter().find(|p| p.id == target.person_id) else {
    return Err(
      TransitionError::validation(format!(
        "person {} is not a member of division {}",
        target.person_id, target.division_id
      ))
      .into(),
    );
  };
  if person.role != Role::Handler {
    return Err(
      TransitionError::validation(format!(
        "person {} is not a delegation handler",
        target.person_id
      ))
      .into(),
    );
  }

  Ok(VerifiedTarget(target))
}

pub(crate) fn retarget(request: &mut DelegationRequest, target: VerifiedTarget) {
  request.target = target.0;
}
