//! Error types for `delegasi-core`.
//!
//! [`TransitionError`] is what the pure workflow functions return; it never
//! involves I/O. [`Error`] is the service-level error, which adds the
//! failures that come from loading, storing and consulting collaborators.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::{
  policy::Operation,
  status::{Role, Status},
};

/// A rejected workflow operation. The delegation is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
  #[error("cannot {operation} while status is {status}")]
  InvalidTransition { operation: Operation, status: Status },

  #[error("role {role} is not allowed to {operation}")]
  Unauthorized { role: Role, operation: Operation },

  #[error("{actor} is not the assigned handler of this delegation")]
  NotAssignedHandler { actor: Uuid },

  #[error("{0}")]
  Validation(String),
}

impl TransitionError {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Transition(#[from] TransitionError),

  #[error("delegation not found: {0}")]
  DelegationNotFound(Uuid),

  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("division not found: {0}")]
  DivisionNotFound(Uuid),

  #[error("delegation {0} was modified concurrently; reload and retry")]
  Conflict(Uuid),

  #[error("upstream failure: {0}")]
  Upstream(String),

  #[error("unknown {kind} value: {value:?}")]
  UnknownValue { kind: &'static str, value: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub(crate) fn upstream(e: impl fmt::Display) -> Self {
    Self::Upstream(e.to_string())
  }

  /// Classify the error for callers that present it to a user.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Transition(TransitionError::InvalidTransition { .. }) => {
        ErrorKind::InvalidTransition
      }
      Error::Transition(
        TransitionError::Unauthorized { .. }
        | TransitionError::NotAssignedHandler { .. },
      ) => ErrorKind::Unauthorized,
      Error::Transition(TransitionError::Validation(_)) => ErrorKind::Validation,
      Error::DelegationNotFound(_)
      | Error::PersonNotFound(_)
      | Error::DivisionNotFound(_) => ErrorKind::NotFound,
      Error::Conflict(_) => ErrorKind::Conflict,
      Error::Upstream(_) => ErrorKind::Upstream,
      Error::UnknownValue { .. } | Error::Store(_) => ErrorKind::Internal,
    }
  }
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  InvalidTransition,
  Unauthorized,
  Validation,
  NotFound,
  Conflict,
  Upstream,
  Internal,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      ErrorKind::InvalidTransition => "invalid_transition",
      ErrorKind::Unauthorized => "unauthorized",
      ErrorKind::Validation => "validation",
      ErrorKind::NotFound => "not_found",
      ErrorKind::Conflict => "conflict",
      ErrorKind::Upstream => "upstream",
      ErrorKind::Internal => "internal",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::status::Action;

  #[test]
  fn invalid_transition_message_names_the_status() {
    let err = TransitionError::InvalidTransition {
      operation: Operation::Transition(Action::FinalApprove),
      status:    Status::VerificationRejected,
    };
    assert_eq!(
      err.to_string(),
      "cannot final_approve while status is Verifikasi Ditolak"
    );
  }

  #[test]
  fn kinds() {
    let id = Uuid::new_v4();
    assert_eq!(Error::DelegationNotFound(id).kind(), ErrorKind::NotFound);
    assert_eq!(Error::Conflict(id).kind(), ErrorKind::Conflict);
    assert_eq!(
      Error::from(TransitionError::NotAssignedHandler { actor: id }).kind(),
      ErrorKind::Unauthorized
    );
    assert_eq!(
      Error::from(TransitionError::validation("empty")).kind(),
      ErrorKind::Validation
    );
    assert_eq!(Error::upstream("directory down").kind(), ErrorKind::Upstream);
  }
}
