//! The attachment store collaborator.
//!
//! Uploads are the first phase of a two-phase write: a file must be stored
//! and have a stable URL before any delegation or response references it.

use std::future::Future;

use crate::request::Attachment;

/// A file waiting to be stored.
#[derive(Debug, Clone)]
pub struct Upload {
  pub original_name: String,
  pub mime_type:     String,
  pub bytes:         Vec<u8>,
}

pub trait AttachmentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Durably store `upload` and describe where it lives.
  fn store(
    &self,
    upload: Upload,
  ) -> impl Future<Output = Result<Attachment, Self::Error>> + Send + '_;

  /// Whether `url` refers to a file this store holds.
  fn exists<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
