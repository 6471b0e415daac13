//! Error type for `delegasi-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored status, role or action literal that no longer parses.
  #[error("invalid stored value: {0}")]
  Core(#[from] delegasi_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("invalid attachment list: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid uuid: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("invalid timestamp: {0}")]
  DateParse(String),

  /// A stored integer that does not fit the domain type.
  #[error("column {column} out of range: {value}")]
  OutOfRange { column: &'static str, value: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
