//! HTTP Basic-auth gate in front of the whole server.
//!
//! One shared credential protects transport access; who is acting inside
//! the workflow is a separate question answered by the `x-actor-id` header.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use crate::error::Error;

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// The `(username, password)` pair carried by a well-formed
/// `Authorization: Basic …` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let decoded = B64.decode(value.strip_prefix("Basic ")?).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (user, password) = creds.split_once(':')?;
  Some((user.to_owned(), password.to_owned()))
}

/// Check the request's Basic credentials against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let (user, password) = basic_credentials(headers).ok_or(Error::Unauthorized)?;
  if user != config.username {
    return Err(Error::Unauthorized);
  }
  let expected = PasswordHash::new(&config.password_hash).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &expected)
    .map_err(|_| Error::Unauthorized)
}

/// Middleware rejecting every request without valid credentials.
pub async fn require_auth(
  State(config): State<Arc<AuthConfig>>,
  req: Request,
  next: Next,
) -> Result<Response, Error> {
  if let Err(e) = verify_auth(req.headers(), &config) {
    tracing::debug!(path = %req.uri().path(), "rejected unauthenticated request");
    return Err(e);
  }
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::get,
  };
  use tower::ServiceExt as _;

  use super::*;

  fn hash(password: &str) -> String {
    use argon2::{PasswordHasher, password_hash::SaltString};
    use rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn config(password: &str) -> AuthConfig {
    AuthConfig {
      username:      "user".to_string(),
      password_hash: hash(password),
    }
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  fn headers_with(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value.parse().unwrap());
    headers
  }

  #[test]
  fn correct_credentials() {
    let cfg = config("secret");
    assert!(verify_auth(&headers_with(&basic("user", "secret")), &cfg).is_ok());
  }

  #[test]
  fn wrong_password_or_user() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&headers_with(&basic("user", "wrong")), &cfg),
      Err(Error::Unauthorized)
    ));
    assert!(matches!(
      verify_auth(&headers_with(&basic("mallory", "secret")), &cfg),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn password_may_contain_colons() {
    let cfg = config("a:b:c");
    assert!(verify_auth(&headers_with(&basic("user", "a:b:c")), &cfg).is_ok());
  }

  #[test]
  fn missing_header_and_invalid_base64() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&HeaderMap::new(), &cfg),
      Err(Error::Unauthorized)
    ));
    assert!(matches!(
      verify_auth(&headers_with("Basic !!!not-base64!!!"), &cfg),
      Err(Error::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn middleware_challenges_anonymous_requests() {
    let cfg = Arc::new(config("secret"));
    let app = Router::new()
      .route("/", get(|| async { "ok" }))
      .layer(middleware::from_fn_with_state(cfg, require_auth));

    let resp = app
      .clone()
      .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let resp = app
      .oneshot(
        Request::builder()
          .uri("/")
          .header(header::AUTHORIZATION, basic("user", "secret"))
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
