//! The delegation state machine.
//!
//! | From | Action | Role | To |
//! |------|--------|------|----|
//! | `PendingVerification` | `accept` | verificator | `PendingHandlerConfirmation` |
//! | `PendingVerification` | `reject` | verificator | `VerificationRejected` |
//! | `VerificationRejected` | `fix` | admin | `PendingVerification` |
//! | `PendingHandlerConfirmation` | `confirm` | handler | `HandlerAccepted` |
//! | `PendingHandlerConfirmation` | `decline` | handler | `HandlerRejected` |
//! | `HandlerRejected` | `reassign` | admin | `PendingHandlerConfirmation` |
//! | `HandlerAccepted` | `final_approve` | verificator | `Approved` |
//! | `HandlerAccepted` | `final_reject` | verificator | `Rejected` |
//!
//! [`apply`] is pure: it checks the actor's role, then the current status,
//! then handler identity, then the payload, and only then builds the next
//! request from a clone. A failed check returns an error and no request.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  error::TransitionError,
  policy::{self, Operation},
  reassignment::{self, VerifiedTarget},
  request::{DelegationRequest, Rejection},
  revision::{self, RevisionPolicy},
  status::{Action, Role, Status},
};

const TRANSITIONS: [(Status, Action, Status); 8] = [
  (
    Status::PendingVerification,
    Action::Accept,
    Status::PendingHandlerConfirmation,
  ),
  (
    Status::PendingVerification,
    Action::Reject,
    Status::VerificationRejected,
  ),
  (
    Status::VerificationRejected,
    Action::Fix,
    Status::PendingVerification,
  ),
  (
    Status::PendingHandlerConfirmation,
    Action::Confirm,
    Status::HandlerAccepted,
  ),
  (
    Status::PendingHandlerConfirmation,
    Action::Decline,
    Status::HandlerRejected,
  ),
  (
    Status::HandlerRejected,
    Action::Reassign,
    Status::PendingHandlerConfirmation,
  ),
  (Status::HandlerAccepted, Action::FinalApprove, Status::Approved),
  (Status::HandlerAccepted, Action::FinalReject, Status::Rejected),
];

/// The status `action` leads to from `from`, if the edge exists.
pub fn next_status(from: Status, action: Action) -> Option<Status> {
  TRANSITIONS
    .iter()
    .find(|(f, a, _)| *f == from && *a == action)
    .map(|(_, _, to)| *to)
}

// ─── Inputs and outputs ──────────────────────────────────────────────────────

/// Who is acting. The role comes from the directory, never from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id:   Uuid,
  pub role: Role,
}

/// An action together with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  Accept,
  Reject { reason: String },
  Fix,
  Confirm,
  Decline,
  Reassign { target: VerifiedTarget },
  FinalApprove { note: Option<String> },
  FinalReject { note: Option<String> },
}

impl Command {
  pub fn action(&self) -> Action {
    match self {
      Command::Accept => Action::Accept,
      Command::Reject { .. } => Action::Reject,
      Command::Fix => Action::Fix,
      Command::Confirm => Action::Confirm,
      Command::Decline => Action::Decline,
      Command::Reassign { .. } => Action::Reassign,
      Command::FinalApprove { .. } => Action::FinalApprove,
      Command::FinalReject { .. } => Action::FinalReject,
    }
  }
}

/// A side effect the caller should carry out once the transition is durable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
  NotifyHandler { person_id: Uuid },
  NotifyVerificators,
  NotifyAdmins,
  NotifyCreator { creator_id: Uuid },
  RecordRejectionReason,
  ClearRejectionReason,
  OpenResponseWindow,
  CloseResponseWindow,
}

#[derive(Debug, Clone)]
pub struct Transition {
  pub request: DelegationRequest,
  pub action:  Action,
  pub from:    Status,
  pub to:      Status,
  pub effects: Vec<Effect>,
  pub note:    Option<String>,
}

// ─── Checks ──────────────────────────────────────────────────────────────────

/// Role, status and handler-identity checks for `action`. Returns the
/// status the action would lead to.
pub fn check(
  request: &DelegationRequest,
  action: Action,
  actor: &Actor,
) -> Result<Status, TransitionError> {
  let operation = Operation::Transition(action);
  policy::authorize(actor.role, operation)?;

  let to = next_status(request.status, action).ok_or(
    TransitionError::InvalidTransition {
      operation,
      status: request.status,
    },
  )?;

  if policy::required_role(action) == Role::Handler
    && actor.id != request.target.person_id
  {
    return Err(TransitionError::NotAssignedHandler { actor: actor.id });
  }

  Ok(to)
}

/// The actions `actor` could take on `request` right now, ignoring payload
/// guards.
pub fn available_actions(request: &DelegationRequest, actor: &Actor) -> Vec<Action> {
  Action::ALL
    .into_iter()
    .filter(|action| check(request, *action, actor).is_ok())
    .collect()
}

// ─── Apply ───────────────────────────────────────────────────────────────────

pub fn apply(
  request: &DelegationRequest,
  command: Command,
  actor: &Actor,
  revision_policy: RevisionPolicy,
) -> Result<Transition, TransitionError> {
  let action = command.action();
  let to = check(request, action, actor)?;

  let mut next = request.clone();
  let mut effects = Vec::new();
  let mut note = None;

  match command {
    Command::Accept => {
      effects.push(Effect::NotifyHandler {
        person_id: next.target.person_id,
      });
    }
    Command::Reject { reason } => {
      let reason = reason.trim();
      if reason.is_empty() {
        return Err(TransitionError::validation(
          "a rejection reason is required",
        ));
      }
      next.rejection = Some(Rejection {
        reason:           reason.to_owned(),
        content_revision: next.content_revision,
      });
      note = Some(reason.to_owned());
      effects.push(Effect::RecordRejectionReason);
      effects.push(Effect::NotifyAdmins);
    }
    Command::Fix => {
      revision::ensure_revised(request, revision_policy)?;
      revision::clear_rejection(&mut next);
      effects.push(Effect::ClearRejectionReason);
      effects.push(Effect::NotifyVerificators);
    }
    Command::Confirm => {
      effects.push(Effect::OpenResponseWindow);
      effects.push(Effect::NotifyVerificators);
    }
    Command::Decline => {
      effects.push(Effect::NotifyAdmins);
    }
    Command::Reassign { target } => {
      reassignment::retarget(&mut next, target);
      effects.push(Effect::NotifyHandler {
        person_id: next.target.person_id,
      });
    }
    Command::FinalApprove { note: decision_note }
    | Command::FinalReject { note: decision_note } => {
      note = decision_note
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty());
      effects.push(Effect::CloseResponseWindow);
      effects.push(Effect::NotifyCreator {
        creator_id: next.creator_id,
      });
    }
  }

  next.status = to;
  next.updated_at = Utc::now();

  Ok(Transition {
    request: next,
    action,
    from: request.status,
    to,
    effects,
    note,
  })
}
