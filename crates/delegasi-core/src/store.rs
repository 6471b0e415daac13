//! The `DelegationStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `delegasi-store-sqlite`). Writes to an existing delegation are
//! conditional on the version the caller loaded, which serializes
//! concurrent transitions on the same request: of two racing writers, only
//! the first sees its expected version.

use std::future::Future;

use uuid::Uuid;

use crate::{
  history::StatusChange, request::DelegationRequest, response::Response,
  status::Status,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`DelegationStore::list_delegations`].
#[derive(Debug, Clone, Default)]
pub struct DelegationQuery {
  pub status:     Option<Status>,
  /// Restrict to delegations currently assigned to this person.
  pub person_id:  Option<Uuid>,
  pub creator_id: Option<Uuid>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

/// Outcome of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
  Applied,
  /// The stored version no longer matched the expected one; nothing was
  /// written.
  Stale,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Durable storage for delegations, their responses and status history.
pub trait DelegationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn insert_delegation<'a>(
    &'a self,
    request: &'a DelegationRequest,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Retrieve a delegation by id. Returns `None` if not found.
  fn get_delegation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DelegationRequest>, Self::Error>>
  + Send
  + '_;

  /// Most recently updated first.
  fn list_delegations<'a>(
    &'a self,
    query: &'a DelegationQuery,
  ) -> impl Future<Output = Result<Vec<DelegationRequest>, Self::Error>>
  + Send
  + 'a;

  /// Overwrite the stored delegation with `request` if its stored version
  /// is still `expected_version`, appending `change` to the history in the
  /// same atomic write.
  fn update_delegation<'a>(
    &'a self,
    request: &'a DelegationRequest,
    expected_version: u64,
    change: Option<&'a StatusChange>,
  ) -> impl Future<Output = Result<Write, Self::Error>> + Send + 'a;

  /// Status history of a delegation, oldest first.
  fn history(
    &self,
    delegation_id: Uuid,
  ) -> impl Future<Output = Result<Vec<StatusChange>, Self::Error>> + Send + '_;

  /// Insert `response` if the owning delegation is still at
  /// `expected_version`, bumping that version in the same write.
  fn insert_response<'a>(
    &'a self,
    response: &'a Response,
    expected_version: u64,
  ) -> impl Future<Output = Result<Write, Self::Error>> + Send + 'a;

  /// Responses of a delegation, oldest first.
  fn list_responses(
    &self,
    delegation_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Response>, Self::Error>> + Send + '_;
}
