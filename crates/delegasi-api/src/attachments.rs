//! `POST /attachments`: the upload half of upload-then-reference.
//!
//! The body is the raw file. `x-file-name` names it and `content-type`
//! gives its MIME type. The JSON reply is the [`Attachment`] to embed in a
//! later delegation or response payload.

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use delegasi_core::{
  attachment::{AttachmentStore, Upload},
  directory::DirectoryAdmin,
  store::DelegationStore,
};

use crate::{Engine, actor::CurrentActor, error::ApiError};

pub const FILE_NAME_HEADER: &str = "x-file-name";

const DEFAULT_MIME: &str = "application/octet-stream";

/// `POST /attachments`
pub async fn upload<S, A>(
  State(workflow): State<Engine<S, A>>,
  CurrentActor(actor): CurrentActor,
  headers: HeaderMap,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: DelegationStore + DirectoryAdmin + 'static,
  A: AttachmentStore + 'static,
{
  let original_name = headers
    .get(FILE_NAME_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .ok_or_else(|| ApiError::BadRequest(format!("missing {FILE_NAME_HEADER} header")))?
    .to_owned();
  let mime_type = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or(DEFAULT_MIME)
    .to_owned();

  tracing::debug!(actor = %actor.id, name = %original_name, size = body.len(), "upload");
  let attachment = workflow
    .upload(Upload {
      original_name,
      mime_type,
      bytes: body.to_vec(),
    })
    .await?;
  Ok((StatusCode::CREATED, Json(attachment)))
}
