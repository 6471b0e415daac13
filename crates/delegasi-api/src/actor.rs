//! The acting-person extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use delegasi_core::{
  Actor, Error, attachment::AttachmentStore, directory::DirectoryAdmin,
  store::DelegationStore,
};
use uuid::Uuid;

use crate::{Engine, error::ApiError};

/// Header carrying the id of the person making the request.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The person making the request, with the role the directory assigns them.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl<S, A> FromRequestParts<Engine<S, A>> for CurrentActor
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &Engine<S, A>,
  ) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(ACTOR_HEADER)
      .ok_or_else(|| ApiError::Unauthenticated(format!("missing {ACTOR_HEADER} header")))?;
    let id = raw
      .to_str()
      .ok()
      .and_then(|s| Uuid::parse_str(s.trim()).ok())
      .ok_or_else(|| {
        ApiError::Unauthenticated(format!("{ACTOR_HEADER} is not a valid id"))
      })?;

    match state.resolve_actor(id).await {
      Ok(actor) => Ok(CurrentActor(actor)),
      Err(Error::PersonNotFound(_)) => {
        Err(ApiError::Unauthenticated(format!("unknown actor {id}")))
      }
      Err(e) => Err(e.into()),
    }
  }
}
