//! SQLite backend for the delegation workflow.
//!
//! One [`SqliteStore`] serves as both the [`DelegationStore`] and the
//! organization [`Directory`]. All database access runs on the
//! [`tokio_rusqlite`] background thread so the async runtime never blocks.
//!
//! [`DelegationStore`]: delegasi_core::store::DelegationStore
//! [`Directory`]: delegasi_core::directory::Directory

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
