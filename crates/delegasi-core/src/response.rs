//! Handler responses: notes and files submitted while a delegation is in
//! [`Status::HandlerAccepted`](crate::status::Status::HandlerAccepted).
//! Responses are immutable once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  error::TransitionError,
  machine::Actor,
  policy::{self, Operation},
  request::{Attachment, DelegationRequest},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
  pub id:            Uuid,
  pub delegation_id: Uuid,
  pub author_id:     Uuid,
  pub text:          String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url:     Option<String>,
  #[serde(default)]
  pub files:         Vec<Attachment>,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewResponse {
  #[serde(default)]
  pub text:      String,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub files:     Vec<Attachment>,
}

impl NewResponse {
  pub fn urls(&self) -> impl Iterator<Item = &str> {
    self
      .image_url
      .as_deref()
      .into_iter()
      .chain(self.files.iter().map(|f| f.url.as_str()))
  }
}

impl Response {
  /// Build a response to `request` on behalf of `actor`.
  ///
  /// Only the currently assigned handler may respond, and only while the
  /// delegation is accepted. A response needs text or at least one file.
  pub fn compose(
    request: &DelegationRequest,
    actor: &Actor,
    input: NewResponse,
  ) -> Result<Self, TransitionError> {
    policy::authorize(actor.role, Operation::Respond)?;
    if !request.status.accepts_responses() {
      return Err(TransitionError::InvalidTransition {
        operation: Operation::Respond,
        status:    request.status,
      });
    }
    if actor.id != request.target.person_id {
      return Err(TransitionError::NotAssignedHandler { actor: actor.id });
    }

    let text = input.text.trim().to_owned();
    if text.is_empty() && input.image_url.is_none() && input.files.is_empty() {
      return Err(TransitionError::validation(
        "a response needs text or an attachment",
      ));
    }

    Ok(Self {
      id: Uuid::new_v4(),
      delegation_id: request.id,
      author_id: actor.id,
      text,
      image_url: input.image_url,
      files: input.files,
      created_at: Utc::now(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    status::{Role, Status},
    tests::fixtures::request_in,
  };

  fn done() -> NewResponse {
    NewResponse {
      text: "done".into(),
      ..Default::default()
    }
  }

  #[test]
  fn assigned_handler_responds_while_accepted() {
    let req = request_in(Status::HandlerAccepted);
    let handler = Actor {
      id:   req.target.person_id,
      role: Role::Handler,
    };
    let response = Response::compose(&req, &handler, done()).unwrap();
    assert_eq!(response.delegation_id, req.id);
    assert_eq!(response.author_id, handler.id);
    assert_eq!(response.text, "done");
  }

  #[test]
  fn other_states_are_invalid() {
    for status in Status::ALL {
      if status == Status::HandlerAccepted {
        continue;
      }
      let req = request_in(status);
      let handler = Actor {
        id:   req.target.person_id,
        role: Role::Handler,
      };
      let err = Response::compose(&req, &handler, done()).unwrap_err();
      assert!(
        matches!(err, TransitionError::InvalidTransition { .. }),
        "{status}"
      );
    }
  }

  #[test]
  fn only_the_assigned_handler_may_respond() {
    let req = request_in(Status::HandlerAccepted);
    let other = Actor {
      id:   uuid::Uuid::new_v4(),
      role: Role::Handler,
    };
    assert!(matches!(
      Response::compose(&req, &other, done()),
      Err(TransitionError::NotAssignedHandler { .. })
    ));
    let verificator = Actor {
      id:   req.target.person_id,
      role: Role::Verificator,
    };
    assert!(matches!(
      Response::compose(&req, &verificator, done()),
      Err(TransitionError::Unauthorized { .. })
    ));
  }

  #[test]
  fn empty_response_is_rejected() {
    let req = request_in(Status::HandlerAccepted);
    let handler = Actor {
      id:   req.target.person_id,
      role: Role::Handler,
    };
    let err = Response::compose(&req, &handler, NewResponse {
      text: "  ".into(),
      ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, TransitionError::Validation(_)));
  }
}
