//! Handlers for `/divisions` and `/people`.
//!
//! Reads are open; writes need the admin role.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use delegasi_core::{
  attachment::AttachmentStore,
  directory::{DirectoryAdmin, Division, NewPerson, Person, PersonUpdate},
  store::DelegationStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{Engine, actor::CurrentActor, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct DivisionBody {
  pub name: String,
}

// ─── Divisions ────────────────────────────────────────────────────────────────

/// `GET /divisions`
pub async fn list_divisions<S, A>(
  State(workflow): State<Engine<S, A>>,
) -> Result<Json<Vec<Division>>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Ok(Json(workflow.list_divisions().await?))
}

/// `POST /divisions` with body `{"name":"Humas"}`
pub async fn create_division<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<DivisionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  let division = workflow.add_division(&actor, body.name).await?;
  Ok((StatusCode::CREATED, Json(division)))
}

/// `PUT /divisions/{id}`
pub async fn rename_division<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  Json(body): Json<DivisionBody>,
) -> Result<Json<Division>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Ok(Json(workflow.rename_division(&actor, id, body.name).await?))
}

/// `DELETE /divisions/{id}`: members are left without a division.
pub async fn delete_division<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  workflow.remove_division(&actor, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /divisions/{id}/people`
pub async fn division_people<S, A>(
  State(workflow): State<Engine<S, A>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Ok(Json(workflow.list_people(id).await?))
}

// ─── People ───────────────────────────────────────────────────────────────────

/// `GET /people`
pub async fn list_people<S, A>(
  State(workflow): State<Engine<S, A>>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Ok(Json(workflow.list_all_people().await?))
}

/// `POST /people`
pub async fn register_person<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  Json(body): Json<NewPerson>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  let person = workflow.register_person(&actor, body).await?;
  Ok((StatusCode::CREATED, Json(person)))
}

/// `PUT /people/{id}`
pub async fn update_person<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  Json(body): Json<PersonUpdate>,
) -> Result<Json<Person>, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  Ok(Json(workflow.update_person(&actor, id, body).await?))
}
