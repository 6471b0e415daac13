//! Status history: one append-only record per applied transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  machine::{Actor, Transition},
  status::{Action, Role, Status},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
  pub change_id:     Uuid,
  pub delegation_id: Uuid,
  pub action:        Action,
  pub from:          Status,
  pub to:            Status,
  pub actor_id:      Uuid,
  pub actor_role:    Role,
  /// Rejection reason or decision note, if the action carried one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub note:          Option<String>,
  pub recorded_at:   DateTime<Utc>,
}

impl StatusChange {
  pub fn record(transition: &Transition, actor: &Actor) -> Self {
    Self {
      change_id:     Uuid::new_v4(),
      delegation_id: transition.request.id,
      action:        transition.action,
      from:          transition.from,
      to:            transition.to,
      actor_id:      actor.id,
      actor_role:    actor.role,
      note:          transition.note.clone(),
      recorded_at:   transition.request.updated_at,
    }
  }
}
