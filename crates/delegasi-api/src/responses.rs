//! Handlers for `/delegations/{id}/responses`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use delegasi_core::{
  attachment::AttachmentStore,
  directory::DirectoryAdmin,
  response::{NewResponse, Response},
  store::DelegationStore,
};
use uuid::Uuid;

use crate::{Engine, actor::CurrentActor, error::ApiError};

/// `GET /delegations/{id}/responses`
pub async fn list<S, A>(
  State(workflow): State<Engine<S, A>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Response>>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Ok(Json(workflow.list_responses(id).await?))
}

/// `POST /delegations/{id}/responses`: only the assigned handler, only
/// while the delegation is accepted.
pub async fn create<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  Json(body): Json<NewResponse>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  let response = workflow.add_response(id, &actor, body).await?;
  Ok((StatusCode::CREATED, Json(response)))
}
