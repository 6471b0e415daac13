//! Handlers for `/delegations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/delegations` | `?status=&person_id=&creator_id=&limit=&offset=` |
//! | `POST` | `/delegations` | Body: [`NewDelegation`]; admin only |
//! | `GET`  | `/delegations/{id}` | 404 if not found |
//! | `PUT`  | `/delegations/{id}/content` | Body: [`ContentEdit`] |
//! | `GET`  | `/delegations/{id}/actions` | Actions open to the caller |
//! | `POST` | `/delegations/{id}/actions` | Body: `{"action":"reject","reason":"…"}` |
//! | `GET`  | `/delegations/{id}/history` | Oldest first |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use delegasi_core::{
  ActionInput, Action, attachment::AttachmentStore, directory::DirectoryAdmin,
  history::StatusChange,
  request::{DelegationRequest, NewDelegation},
  revision::ContentEdit,
  status::Status,
  store::{DelegationQuery, DelegationStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Engine, actor::CurrentActor, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:     Option<Status>,
  pub person_id:  Option<Uuid>,
  pub creator_id: Option<Uuid>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

/// `GET /delegations`
pub async fn list<S, A>(
  State(workflow): State<Engine<S, A>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<DelegationRequest>>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  let query = DelegationQuery {
    status:     params.status,
    person_id:  params.person_id,
    creator_id: params.creator_id,
    limit:      params.limit,
    offset:     params.offset,
  };
  Ok(Json(workflow.list(&query).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /delegations`
pub async fn create<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewDelegation>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  let request = workflow.create(&actor, body).await?;
  Ok((StatusCode::CREATED, Json(request)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /delegations/{id}`
pub async fn get_one<S, A>(
  State(workflow): State<Engine<S, A>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DelegationRequest>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Ok(Json(workflow.get_state(id).await?))
}

// ─── Content ──────────────────────────────────────────────────────────────────

/// `PUT /delegations/{id}/content`
pub async fn edit_content<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  Json(body): Json<ContentEdit>,
) -> Result<Json<DelegationRequest>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Ok(Json(workflow.edit_content(id, &actor, body).await?))
}

// ─── Actions ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailableActions {
  pub status:  Status,
  pub actions: Vec<Action>,
}

/// `GET /delegations/{id}/actions`
pub async fn available<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<AvailableActions>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  let (status, actions) = workflow.status_and_actions(id, &actor).await?;
  Ok(Json(AvailableActions { status, actions }))
}

/// `POST /delegations/{id}/actions`
pub async fn apply<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  Json(body): Json<ActionInput>,
) -> Result<Json<DelegationRequest>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Ok(Json(workflow.apply(id, &actor, body).await?))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /delegations/{id}/history`
pub async fn history<S, A>(
  State(workflow): State<Engine<S, A>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<StatusChange>>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Ok(Json(workflow.history(id).await?))
}
