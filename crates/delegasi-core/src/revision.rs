//! The revision loop: an admin edits a rejected delegation and sends the
//! same entity back to verification with `fix`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  error::TransitionError,
  machine::Actor,
  policy::{self, Operation},
  request::{Attachment, DelegationRequest},
};

/// Whether `fix` insists on a content edit since the rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionPolicy {
  #[default]
  RequireEdit,
  Permissive,
}

impl RevisionPolicy {
  pub fn from_require_edit(require_edit: bool) -> Self {
    if require_edit { Self::RequireEdit } else { Self::Permissive }
  }
}

/// A partial content update. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEdit {
  #[serde(default)]
  pub title:                   Option<String>,
  #[serde(default)]
  pub description:             Option<String>,
  #[serde(default)]
  pub description_image_url:   Option<String>,
  /// Drop the description image. Ignored when a new image URL is given.
  #[serde(default)]
  pub clear_description_image: bool,
  /// Replaces the whole file list.
  #[serde(default)]
  pub files:                   Option<Vec<Attachment>>,
  #[serde(default)]
  pub date:                    Option<DateTime<Utc>>,
}

impl ContentEdit {
  /// URLs this edit introduces, which must already exist in the store.
  pub fn urls(&self) -> impl Iterator<Item = &str> {
    self
      .description_image_url
      .as_deref()
      .into_iter()
      .chain(self.files.iter().flatten().map(|f| f.url.as_str()))
  }
}

/// Apply `edit` to a copy of `request`.
///
/// Only admins may edit, only while the content is editable, and the edit
/// has to change something. A successful edit bumps `content_revision`.
pub fn edit_content(
  request: &DelegationRequest,
  actor: &Actor,
  edit: ContentEdit,
) -> Result<DelegationRequest, TransitionError> {
  policy::authorize(actor.role, Operation::EditContent)?;
  if !policy::can_edit_content(actor.role, request.status) {
    return Err(TransitionError::InvalidTransition {
      operation: Operation::EditContent,
      status:    request.status,
    });
  }

  let mut next = request.clone();
  let content = &mut next.content;

  if let Some(title) = edit.title {
    let title = title.trim();
    if title.is_empty() {
      return Err(TransitionError::validation("title must not be empty"));
    }
    content.title = title.to_owned();
  }
  if let Some(description) = edit.description {
    content.description = description;
  }
  if let Some(url) = edit.description_image_url {
    content.description_image_url = Some(url);
  } else if edit.clear_description_image {
    content.description_image_url = None;
  }
  if let Some(files) = edit.files {
    content.files = files;
  }
  if let Some(date) = edit.date {
    next.date = date;
  }

  if next.content == request.content && next.date == request.date {
    return Err(TransitionError::validation("the edit does not change anything"));
  }

  next.content_revision += 1;
  next.updated_at = Utc::now();
  Ok(next)
}

/// The `fix` guard.
pub(crate) fn ensure_revised(
  request: &DelegationRequest,
  policy: RevisionPolicy,
) -> Result<(), TransitionError> {
  if policy == RevisionPolicy::Permissive {
    return Ok(());
  }
  match &request.rejection {
    Some(rejection) if request.content_revision > rejection.content_revision => {
      Ok(())
    }
    _ => Err(TransitionError::validation(
      "edit the content before sending it back to verification",
    )),
  }
}

pub(crate) fn clear_rejection(request: &mut DelegationRequest) {
  request.rejection = None;
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::{
    machine::{self, Command},
    status::{Role, Status},
    tests::fixtures::request_in,
  };

  fn admin() -> Actor {
    Actor {
      id:   Uuid::new_v4(),
      role: Role::Admin,
    }
  }

  fn retitle(title: &str) -> ContentEdit {
    ContentEdit {
      title: Some(title.into()),
      ..Default::default()
    }
  }

  #[test]
  fn admin_edits_rejected_content() {
    let req = request_in(Status::VerificationRejected);
    let next = edit_content(&req, &admin(), retitle("Survey lokasi (rev)")).unwrap();
    assert_eq!(next.content.title, "Survey lokasi (rev)");
    assert_eq!(next.content_revision, req.content_revision + 1);
    assert_eq!(next.status, Status::VerificationRejected);
    assert_eq!(next.rejection, req.rejection);
  }

  #[test]
  fn edits_outside_editable_states_are_invalid() {
    for status in [
      Status::PendingHandlerConfirmation,
      Status::HandlerAccepted,
      Status::HandlerRejected,
      Status::Approved,
      Status::Rejected,
    ] {
      let req = request_in(status);
      let err = edit_content(&req, &admin(), retitle("x")).unwrap_err();
      assert!(
        matches!(err, TransitionError::InvalidTransition { .. }),
        "{status}"
      );
    }
  }

  #[test]
  fn non_admins_cannot_edit() {
    let req = request_in(Status::PendingVerification);
    let verificator = Actor {
      id:   Uuid::new_v4(),
      role: Role::Verificator,
    };
    let err = edit_content(&req, &verificator, retitle("x")).unwrap_err();
    assert!(matches!(err, TransitionError::Unauthorized { .. }));
  }

  #[test]
  fn no_op_and_blank_title_edits_are_rejected() {
    let req = request_in(Status::PendingVerification);
    let same = retitle(&req.content.title);
    assert!(matches!(
      edit_content(&req, &admin(), same),
      Err(TransitionError::Validation(_))
    ));
    assert!(matches!(
      edit_content(&req, &admin(), ContentEdit::default()),
      Err(TransitionError::Validation(_))
    ));
    assert!(matches!(
      edit_content(&req, &admin(), retitle("  ")),
      Err(TransitionError::Validation(_))
    ));
  }

  #[test]
  fn clear_description_image() {
    let mut req = request_in(Status::PendingVerification);
    req.content.description_image_url = Some("/files/x.png".into());
    let next = edit_content(&req, &admin(), ContentEdit {
      clear_description_image: true,
      ..Default::default()
    })
    .unwrap();
    assert_eq!(next.content.description_image_url, None);
  }

  #[test]
  fn fix_requires_an_edit_by_default() {
    let req = request_in(Status::VerificationRejected);
    let err = machine::apply(&req, Command::Fix, &admin(), RevisionPolicy::RequireEdit)
      .unwrap_err();
    assert!(matches!(err, TransitionError::Validation(_)));

    let edited = edit_content(&req, &admin(), retitle("revised")).unwrap();
    let t = machine::apply(&edited, Command::Fix, &admin(), RevisionPolicy::RequireEdit)
      .unwrap();
    assert_eq!(t.request.status, Status::PendingVerification);
    assert_eq!(t.request.rejection, None);
    assert_eq!(t.request.id, req.id);
  }

  #[test]
  fn permissive_fix_skips_the_edit_guard() {
    let req = request_in(Status::VerificationRejected);
    let t = machine::apply(&req, Command::Fix, &admin(), RevisionPolicy::Permissive)
      .unwrap();
    assert_eq!(t.request.status, Status::PendingVerification);
    assert!(t.request.rejection.is_none());
  }
}
