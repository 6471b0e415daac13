//! The delegation request: the document routed through the workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::Status;

// ─── Parts ───────────────────────────────────────────────────────────────────

/// The current handler assignment. The person must belong to the division;
/// both halves are always replaced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
  pub division_id: Uuid,
  pub person_id:   Uuid,
}

/// A file that has already been written to the attachment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  pub original_name: String,
  /// Opaque URL returned by the attachment store.
  pub url:           String,
  pub mime_type:     String,
}

/// The editable body of a delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
  pub title:                 String,
  pub description:           String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description_image_url: Option<String>,
  #[serde(default)]
  pub files:                 Vec<Attachment>,
}

impl Content {
  /// Every attachment URL referenced by this content.
  pub fn urls(&self) -> impl Iterator<Item = &str> {
    self
      .description_image_url
      .as_deref()
      .into_iter()
      .chain(self.files.iter().map(|f| f.url.as_str()))
  }
}

/// Why the verificator sent the request back, and which content revision
/// they were looking at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
  pub reason:           String,
  pub content_revision: u32,
}

// ─── Request ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRequest {
  pub id:               Uuid,
  pub creator_id:       Uuid,
  pub target:           Target,
  pub content:          Content,
  pub status:           Status,
  /// Present iff `status` is [`Status::VerificationRejected`].
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rejection:        Option<Rejection>,
  /// Bumped by every content edit.
  pub content_revision: u32,
  /// Event date chosen by the creator. Display only.
  pub date:             DateTime<Utc>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
  /// Optimistic concurrency token, bumped on every persisted write.
  pub version:          u64,
}

/// Input for creating a delegation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDelegation {
  pub target:  Target,
  pub content: Content,
  pub date:    DateTime<Utc>,
}

impl DelegationRequest {
  /// A freshly filed request in [`Status::PendingVerification`].
  pub fn new(creator_id: Uuid, input: NewDelegation) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      creator_id,
      target: input.target,
      content: input.content,
      status: Status::PendingVerification,
      rejection: None,
      content_revision: 0,
      date: input.date,
      created_at: now,
      updated_at: now,
      version: 0,
    }
  }

  pub fn rejection_reason(&self) -> Option<&str> {
    self.rejection.as_ref().map(|r| r.reason.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn content() -> Content {
    Content {
      title:                 "Survey lokasi".into(),
      description:           "Cek lokasi acara".into(),
      description_image_url: Some("/files/a.png".into()),
      files:                 vec![Attachment {
        original_name: "brief.pdf".into(),
        url:           "/files/b.pdf".into(),
        mime_type:     "application/pdf".into(),
      }],
    }
  }

  #[test]
  fn new_request_starts_pending_verification() {
    let req = DelegationRequest::new(Uuid::new_v4(), NewDelegation {
      target:  Target {
        division_id: Uuid::new_v4(),
        person_id:   Uuid::new_v4(),
      },
      content: content(),
      date:    Utc::now(),
    });
    assert_eq!(req.status, Status::PendingVerification);
    assert!(req.rejection.is_none());
    assert_eq!(req.version, 0);
    assert_eq!(req.created_at, req.updated_at);
  }

  #[test]
  fn content_urls_include_image_and_files() {
    let urls: Vec<_> = content().urls().map(str::to_owned).collect();
    assert_eq!(urls, vec!["/files/a.png", "/files/b.pdf"]);
  }

  #[test]
  fn status_serialises_as_wire_literal() {
    let req = DelegationRequest::new(Uuid::new_v4(), NewDelegation {
      target:  Target {
        division_id: Uuid::new_v4(),
        person_id:   Uuid::new_v4(),
      },
      content: content(),
      date:    Utc::now(),
    });
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["status"], "Perlu Verifikasi");
    assert!(json.get("rejection").is_none());
  }
}
