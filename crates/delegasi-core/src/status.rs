//! The closed status vocabulary, actor roles and workflow actions.
//!
//! Status literals are an external contract: client UIs branch on the exact
//! strings, so the serialised form of [`Status`] must never change. Call
//! sites compare enum values, never raw strings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a delegation request currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
  /// Initial state; awaiting the verificator's first decision.
  #[serde(rename = "Perlu Verifikasi")]
  PendingVerification,
  /// The verificator declined; a reason is recorded and an admin must revise.
  #[serde(rename = "Verifikasi Ditolak")]
  VerificationRejected,
  /// Verified; awaiting acceptance by the assigned person.
  #[serde(
    rename = "Perlu Konfirmasi Penerima",
    alias = "Butuh Verifikasi Penerima"
  )]
  PendingHandlerConfirmation,
  /// The handler took the request; responses may be submitted.
  #[serde(rename = "Penerima Setuju")]
  HandlerAccepted,
  /// The handler declined; awaiting reassignment by an admin.
  #[serde(rename = "Penerima Menolak")]
  HandlerRejected,
  #[serde(rename = "Disetujui")]
  Approved,
  #[serde(rename = "Ditolak")]
  Rejected,
}

/// Older client builds used this literal for `PendingHandlerConfirmation`.
const LEGACY_PENDING_HANDLER: &str = "Butuh Verifikasi Penerima";

impl Status {
  pub const ALL: [Status; 7] = [
    Status::PendingVerification,
    Status::VerificationRejected,
    Status::PendingHandlerConfirmation,
    Status::HandlerAccepted,
    Status::HandlerRejected,
    Status::Approved,
    Status::Rejected,
  ];

  /// The canonical wire literal.
  pub fn as_str(self) -> &'static str {
    match self {
      Status::PendingVerification => "Perlu Verifikasi",
      Status::VerificationRejected => "Verifikasi Ditolak",
      Status::PendingHandlerConfirmation => "Perlu Konfirmasi Penerima",
      Status::HandlerAccepted => "Penerima Setuju",
      Status::HandlerRejected => "Penerima Menolak",
      Status::Approved => "Disetujui",
      Status::Rejected => "Ditolak",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, Status::Approved | Status::Rejected)
  }

  /// Title, description and attachments may only change in these states.
  pub fn content_editable(self) -> bool {
    matches!(
      self,
      Status::PendingVerification | Status::VerificationRejected
    )
  }

  pub fn accepts_responses(self) -> bool { self == Status::HandlerAccepted }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Status {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s == LEGACY_PENDING_HANDLER {
      return Ok(Status::PendingHandlerConfirmation);
    }
    Status::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| Error::UnknownValue {
        kind:  "status",
        value: s.to_owned(),
      })
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

/// The role a person holds in the organization.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Role {
  #[serde(rename = "admin")]
  Admin,
  #[serde(rename = "delegation_verificator")]
  Verificator,
  #[serde(rename = "delegation_handler")]
  Handler,
  /// Any authenticated user without a workflow role.
  #[default]
  #[serde(rename = "requester")]
  Requester,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Verificator => "delegation_verificator",
      Role::Handler => "delegation_handler",
      Role::Requester => "requester",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "admin" => Ok(Role::Admin),
      "delegation_verificator" => Ok(Role::Verificator),
      "delegation_handler" => Ok(Role::Handler),
      // Accounts without an assigned role carry an empty string.
      "requester" | "" => Ok(Role::Requester),
      other => Err(Error::UnknownValue {
        kind:  "role",
        value: other.to_owned(),
      }),
    }
  }
}

// ─── Action ──────────────────────────────────────────────────────────────────

/// An actor-initiated request to move a delegation to another status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  Accept,
  Reject,
  Fix,
  Confirm,
  Decline,
  Reassign,
  FinalApprove,
  FinalReject,
}

impl Action {
  pub const ALL: [Action; 8] = [
    Action::Accept,
    Action::Reject,
    Action::Fix,
    Action::Confirm,
    Action::Decline,
    Action::Reassign,
    Action::FinalApprove,
    Action::FinalReject,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Action::Accept => "accept",
      Action::Reject => "reject",
      Action::Fix => "fix",
      Action::Confirm => "confirm",
      Action::Decline => "decline",
      Action::Reassign => "reassign",
      Action::FinalApprove => "final_approve",
      Action::FinalReject => "final_reject",
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Action {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Action::ALL
      .into_iter()
      .find(|action| action.as_str() == s)
      .ok_or_else(|| Error::UnknownValue {
        kind:  "action",
        value: s.to_owned(),
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_literals_match_serde() {
    for status in Status::ALL {
      let json = serde_json::to_string(&status).unwrap();
      assert_eq!(json, format!("\"{}\"", status.as_str()));
      assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
    }
  }

  #[test]
  fn legacy_pending_handler_literal_is_accepted() {
    assert_eq!(
      "Butuh Verifikasi Penerima".parse::<Status>().unwrap(),
      Status::PendingHandlerConfirmation
    );
    let parsed: Status =
      serde_json::from_str("\"Butuh Verifikasi Penerima\"").unwrap();
    assert_eq!(parsed, Status::PendingHandlerConfirmation);
    // Always written back under the canonical name.
    assert_eq!(
      serde_json::to_string(&parsed).unwrap(),
      "\"Perlu Konfirmasi Penerima\""
    );
  }

  #[test]
  fn unknown_status_is_rejected() {
    let err = "Selesai".parse::<Status>().unwrap_err();
    assert!(matches!(err, Error::UnknownValue { kind: "status", .. }));
  }

  #[test]
  fn only_approved_and_rejected_are_terminal() {
    let terminal: Vec<_> =
      Status::ALL.into_iter().filter(|s| s.is_terminal()).collect();
    assert_eq!(terminal, vec![Status::Approved, Status::Rejected]);
  }

  #[test]
  fn role_literals() {
    assert_eq!(
      serde_json::to_string(&Role::Verificator).unwrap(),
      "\"delegation_verificator\""
    );
    assert_eq!("delegation_handler".parse::<Role>().unwrap(), Role::Handler);
    assert_eq!("".parse::<Role>().unwrap(), Role::Requester);
    assert!("superuser".parse::<Role>().is_err());
  }

  #[test]
  fn action_round_trips_through_str() {
    for action in Action::ALL {
      assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
    }
    assert_eq!(
      serde_json::to_string(&Action::FinalApprove).unwrap(),
      "\"final_approve\""
    );
  }
}
