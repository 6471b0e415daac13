//! The authorization policy: a static (role, operation) lookup.
//!
//! There are no per-request ACLs. A handler's authority over a particular
//! delegation additionally depends on being its current target, which the
//! state machine checks; this module only answers "may this role ever do
//! this".

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  error::TransitionError,
  status::{Action, Role, Status},
};

/// Everything an actor can ask the engine to do to a delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  Transition(Action),
  Create,
  EditContent,
  Respond,
  ManageDirectory,
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operation::Transition(action) => f.write_str(action.as_str()),
      Operation::Create => f.write_str("create"),
      Operation::EditContent => f.write_str("edit_content"),
      Operation::Respond => f.write_str("respond"),
      Operation::ManageDirectory => f.write_str("manage_directory"),
    }
  }
}

/// The single role allowed to perform `action`.
pub fn required_role(action: Action) -> Role {
  match action {
    Action::Accept
    | Action::Reject
    | Action::FinalApprove
    | Action::FinalReject => Role::Verificator,
    Action::Confirm | Action::Decline => Role::Handler,
    Action::Fix | Action::Reassign => Role::Admin,
  }
}

pub fn permits(role: Role, operation: Operation) -> bool {
  match operation {
    Operation::Transition(action) => role == required_role(action),
    Operation::Create | Operation::EditContent | Operation::ManageDirectory => {
      role == Role::Admin
    }
    Operation::Respond => role == Role::Handler,
  }
}

pub fn authorize(role: Role, operation: Operation) -> Result<(), TransitionError> {
  if permits(role, operation) {
    Ok(())
  } else {
    Err(TransitionError::Unauthorized { role, operation })
  }
}

/// Content edits need the admin role and an editable status.
pub fn can_edit_content(role: Role, status: Status) -> bool {
  permits(role, Operation::EditContent) && status.content_editable()
}
