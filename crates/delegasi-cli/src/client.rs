//! Async HTTP client wrapping the delegasi JSON API.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use delegasi_core::{
  Action, ActionInput,
  directory::{Division, Person},
  history::StatusChange,
  request::{Attachment, DelegationRequest},
  response::{NewResponse, Response},
  status::Status,
};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use uuid::Uuid;

/// Connection settings for the delegasi API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
  /// Person the requests are made on behalf of.
  pub actor:    Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AvailableActions {
  pub status:  Status,
  pub actions: Vec<Action>,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ApiFailure {
  error: String,
  kind:  String,
}

/// Async HTTP client for the delegasi JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn prepare(&self, req: RequestBuilder) -> RequestBuilder {
    let req = if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    };
    match self.config.actor {
      Some(actor) => req.header("x-actor-id", actor.to_string()),
      None => req,
    }
  }

  /// Send `req` and decode a JSON reply, turning API errors into readable
  /// messages.
  async fn send<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T> {
    let resp = self
      .prepare(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(match serde_json::from_str::<ApiFailure>(&body) {
        Ok(failure) => anyhow!("{what} → {status} ({}): {}", failure.kind, failure.error),
        Err(_) => anyhow!("{what} → {status}"),
      });
    }
    resp
      .json()
      .await
      .with_context(|| format!("deserialising {what} reply"))
  }

  // ── Delegations ───────────────────────────────────────────────────────────

  /// `GET /api/delegations`
  pub async fn list_delegations(
    &self,
    status: Option<Status>,
    person_id: Option<Uuid>,
  ) -> Result<Vec<DelegationRequest>> {
    let mut query = Vec::new();
    if let Some(status) = status {
      query.push(("status", status.as_str().to_owned()));
    }
    if let Some(person_id) = person_id {
      query.push(("person_id", person_id.to_string()));
    }
    self
      .send(
        "GET /delegations",
        self.client.get(self.url("/delegations")).query(&query),
      )
      .await
  }

  /// `GET /api/delegations/{id}`
  pub async fn get_delegation(&self, id: Uuid) -> Result<DelegationRequest> {
    self
      .send(
        "GET /delegations/{id}",
        self.client.get(self.url(&format!("/delegations/{id}"))),
      )
      .await
  }

  /// `GET /api/delegations/{id}/actions`
  pub async fn available_actions(&self, id: Uuid) -> Result<AvailableActions> {
    self
      .send(
        "GET /delegations/{id}/actions",
        self.client.get(self.url(&format!("/delegations/{id}/actions"))),
      )
      .await
  }

  /// `POST /api/delegations/{id}/actions`
  pub async fn apply(&self, id: Uuid, input: &ActionInput) -> Result<DelegationRequest> {
    self
      .send(
        "POST /delegations/{id}/actions",
        self
          .client
          .post(self.url(&format!("/delegations/{id}/actions")))
          .json(input),
      )
      .await
  }

  /// `GET /api/delegations/{id}/history`
  pub async fn history(&self, id: Uuid) -> Result<Vec<StatusChange>> {
    self
      .send(
        "GET /delegations/{id}/history",
        self.client.get(self.url(&format!("/delegations/{id}/history"))),
      )
      .await
  }

  // ── Responses ─────────────────────────────────────────────────────────────

  /// `GET /api/delegations/{id}/responses`
  pub async fn list_responses(&self, id: Uuid) -> Result<Vec<Response>> {
    self
      .send(
        "GET /delegations/{id}/responses",
        self.client.get(self.url(&format!("/delegations/{id}/responses"))),
      )
      .await
  }

  /// `POST /api/delegations/{id}/responses`
  pub async fn respond(&self, id: Uuid, input: &NewResponse) -> Result<Response> {
    self
      .send(
        "POST /delegations/{id}/responses",
        self
          .client
          .post(self.url(&format!("/delegations/{id}/responses")))
          .json(input),
      )
      .await
  }

  // ── Attachments ───────────────────────────────────────────────────────────

  /// `POST /api/attachments` with the contents of `path`.
  pub async fn upload(&self, path: &Path, mime_type: &str) -> Result<Attachment> {
    let bytes = tokio::fs::read(path)
      .await
      .with_context(|| format!("reading {}", path.display()))?;
    let name = path
      .file_name()
      .and_then(|n| n.to_str())
      .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))?
      .to_owned();
    self
      .send(
        "POST /attachments",
        self
          .client
          .post(self.url("/attachments"))
          .header("x-file-name", name)
          .header(reqwest::header::CONTENT_TYPE, mime_type)
          .body(bytes),
      )
      .await
  }

  // ── Directory ─────────────────────────────────────────────────────────────

  /// `GET /api/divisions`
  pub async fn list_divisions(&self) -> Result<Vec<Division>> {
    self
      .send("GET /divisions", self.client.get(self.url("/divisions")))
      .await
  }

  /// `GET /api/people` or `GET /api/divisions/{id}/people`
  pub async fn list_people(&self, division_id: Option<Uuid>) -> Result<Vec<Person>> {
    match division_id {
      Some(id) => {
        self
          .send(
            "GET /divisions/{id}/people",
            self.client.get(self.url(&format!("/divisions/{id}/people"))),
          )
          .await
      }
      None => {
        self
          .send("GET /people", self.client.get(self.url("/people")))
          .await
      }
    }
  }
}
