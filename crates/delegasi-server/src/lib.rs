//! HTTP server for the delegation workflow.
//!
//! Mounts the JSON API under `/api` and the stored attachments under
//! `/files`, behind a single HTTP Basic credential.

pub mod attachments;
pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use delegasi_core::{
  Workflow, WorkflowConfig, directory::DirectoryAdmin, revision::RevisionPolicy,
  store::DelegationStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use attachments::FsAttachmentStore;
use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DELEGASI_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  pub store_path:            PathBuf,
  pub attachment_dir:        PathBuf,
  /// Prefix for attachment URLs. Empty means host-relative `/files/…`.
  #[serde(default)]
  pub public_base_url:       String,
  pub auth_username:         String,
  pub auth_password_hash:    String,
  /// Whether `fix` insists on a content edit since the rejection.
  #[serde(default = "default_true")]
  pub require_revision_edit: bool,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:      usize,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_true() -> bool { true }

fn default_max_upload_bytes() -> usize { 16 * 1024 * 1024 }

impl ServerConfig {
  pub fn workflow_config(&self) -> WorkflowConfig {
    WorkflowConfig {
      revision: RevisionPolicy::from_require_edit(self.require_revision_edit),
    }
  }

  pub fn auth_config(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete server router.
pub fn router<S>(
  workflow: Arc<Workflow<S, FsAttachmentStore>>,
  files: FsAttachmentStore,
  auth: AuthConfig,
  max_upload_bytes: usize,
) -> Router
where
  S: DelegationStore + DirectoryAdmin + 'static,
{
  let files = Router::new()
    .route("/files/{name}", get(attachments::serve))
    .with_state(files);

  Router::new()
    .nest("/api", delegasi_api::api_router(workflow))
    .merge(files)
    .layer(middleware::from_fn_with_state(Arc::new(auth), require_auth))
    .layer(DefaultBodyLimit::max(max_upload_bytes))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use delegasi_core::{directory::NewPerson, status::Role};
  use delegasi_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> (Router, uuid::Uuid, FsAttachmentStore) {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(b"secret", &salt)
      .unwrap()
      .to_string();

    let store = SqliteStore::open_in_memory().await.unwrap();
    let handler = store
      .add_person(NewPerson {
        name:        "Hadi".into(),
        email:       "hadi@example.org".into(),
        role:        Role::Handler,
        division_id: None,
      })
      .await
      .unwrap();

    let dir = std::env::temp_dir().join(format!("delegasi-srv-{}", uuid::Uuid::new_v4()));
    let files = FsAttachmentStore::new(dir, "");
    let workflow = Arc::new(Workflow::new(
      store,
      files.clone(),
      WorkflowConfig::default(),
    ));
    let auth = AuthConfig {
      username:      "user".into(),
      password_hash: hash,
    };
    (router(workflow, files.clone(), auth, 1024), handler.id, files)
  }

  fn basic() -> String { format!("Basic {}", B64.encode("user:secret")) }

  #[tokio::test]
  async fn api_requires_credentials() {
    let (app, _, _) = app().await;
    let resp = app
      .oneshot(
        Request::builder()
          .uri("/api/divisions")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn uploaded_file_is_served_back() {
    let (app, handler, files) = app().await;
    let resp = app
      .clone()
      .oneshot(
        Request::builder()
          .method("POST")
          .uri("/api/attachments")
          .header(header::AUTHORIZATION, basic())
          .header("x-actor-id", handler.to_string())
          .header("x-file-name", "catatan.txt")
          .header(header::CONTENT_TYPE, "text/plain")
          .body(Body::from("halo"))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let attachment: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let url = attachment["url"].as_str().unwrap().to_owned();
    assert!(url.starts_with("/files/"));

    let resp = app
      .oneshot(
        Request::builder()
          .uri(&url)
          .header(header::AUTHORIZATION, basic())
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers()[header::CONTENT_TYPE],
      "text/plain; charset=utf-8"
    );
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    assert_eq!(&bytes[..], b"halo");

    tokio::fs::remove_dir_all(files.dir()).await.unwrap();
  }

  #[tokio::test]
  async fn oversized_upload_is_refused() {
    let (app, handler, _) = app().await;
    let resp = app
      .oneshot(
        Request::builder()
          .method("POST")
          .uri("/api/attachments")
          .header(header::AUTHORIZATION, basic())
          .header("x-actor-id", handler.to_string())
          .header("x-file-name", "besar.bin")
          .body(Body::from(vec![0u8; 4096]))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
  }
}
