//! Content-addressed attachment storage on the local filesystem.
//!
//! Files are named by the SHA-256 of their bytes plus the original
//! extension, so uploading the same file twice yields the same URL. URLs
//! have the form `{public_base_url}/files/{name}`.

use std::{
  io,
  path::{Path, PathBuf},
};

use axum::{
  extract::{Path as UrlPath, State},
  http::{HeaderValue, header},
  response::{IntoResponse, Response},
};
use delegasi_core::{
  attachment::{AttachmentStore, Upload},
  request::Attachment,
};
use sha2::{Digest, Sha256};

use crate::error::Error;

const FILES_PREFIX: &str = "/files/";
const MAX_EXTENSION_LEN: usize = 10;

#[derive(Debug, Clone)]
pub struct FsAttachmentStore {
  dir:      PathBuf,
  base_url: String,
}

impl FsAttachmentStore {
  pub fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
    Self {
      dir:      dir.into(),
      base_url: public_base_url.trim_end_matches('/').to_owned(),
    }
  }

  pub fn dir(&self) -> &Path { &self.dir }

  /// The stored file name a URL refers to, if the URL is one of ours.
  fn name_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
    url
      .strip_prefix(self.base_url.as_str())?
      .strip_prefix(FILES_PREFIX)
      .filter(|name| is_stored_name(name))
  }

  /// Read a stored file. `None` for names this store never produces or
  /// files that do not exist.
  pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, io::Error> {
    if !is_stored_name(name) {
      return Ok(None);
    }
    match tokio::fs::read(self.dir.join(name)).await {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e),
    }
  }
}

impl AttachmentStore for FsAttachmentStore {
  type Error = io::Error;

  async fn store(&self, upload: Upload) -> Result<Attachment, io::Error> {
    let digest = hex::encode(Sha256::digest(&upload.bytes));
    let name = match extension(&upload.original_name) {
      Some(ext) => format!("{digest}.{ext}"),
      None => digest,
    };
    let path = self.dir.join(&name);

    if !tokio::fs::try_exists(&path).await? {
      tokio::fs::create_dir_all(&self.dir).await?;
      // Write then rename so a reader never sees a partial file.
      let tmp = self.dir.join(format!(".{name}.{}", uuid::Uuid::new_v4()));
      tokio::fs::write(&tmp, &upload.bytes).await?;
      tokio::fs::rename(&tmp, &path).await?;
      tracing::info!(file = %name, size = upload.bytes.len(), "attachment written");
    }

    Ok(Attachment {
      original_name: upload.original_name,
      url:           format!("{}{FILES_PREFIX}{name}", self.base_url),
      mime_type:     upload.mime_type,
    })
  }

  async fn exists(&self, url: &str) -> Result<bool, io::Error> {
    match self.name_from_url(url) {
      Some(name) => tokio::fs::try_exists(self.dir.join(name)).await,
      None => Ok(false),
    }
  }
}

/// Lowercased alphanumeric extension of `file_name`, if it has a sane one.
fn extension(file_name: &str) -> Option<String> {
  let (_, ext) = file_name.rsplit_once('.')?;
  (!ext.is_empty()
    && ext.len() <= MAX_EXTENSION_LEN
    && ext.chars().all(|c| c.is_ascii_alphanumeric()))
  .then(|| ext.to_ascii_lowercase())
}

/// `<64 hex digits>` optionally followed by `.<extension>`.
fn is_stored_name(name: &str) -> bool {
  let (digest, ext) = match name.split_once('.') {
    Some((digest, ext)) => (digest, Some(ext)),
    None => (name, None),
  };
  digest.len() == 64
    && digest.chars().all(|c| c.is_ascii_hexdigit())
    && ext.is_none_or(|ext| extension(&format!("x.{ext}")).as_deref() == Some(ext))
}

fn content_type(name: &str) -> &'static str {
  match name.rsplit_once('.').map(|(_, ext)| ext) {
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("gif") => "image/gif",
    Some("webp") => "image/webp",
    Some("pdf") => "application/pdf",
    Some("txt") => "text/plain; charset=utf-8",
    _ => "application/octet-stream",
  }
}

/// `GET /files/{name}`
pub async fn serve(
  State(store): State<FsAttachmentStore>,
  UrlPath(name): UrlPath<String>,
) -> Result<Response, Error> {
  let bytes = store.read(&name).await?.ok_or(Error::NotFound)?;
  let mut res = bytes.into_response();
  res.headers_mut().insert(
    header::CONTENT_TYPE,
    HeaderValue::from_static(content_type(&name)),
  );
  Ok(res)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_store() -> FsAttachmentStore {
    let dir = std::env::temp_dir().join(format!("delegasi-test-{}", uuid::Uuid::new_v4()));
    FsAttachmentStore::new(dir, "http://localhost:8080/")
  }

  fn upload(name: &str, bytes: &[u8]) -> Upload {
    Upload {
      original_name: name.into(),
      mime_type:     "image/png".into(),
      bytes:         bytes.to_vec(),
    }
  }

  #[test]
  fn extension_is_sanitised() {
    assert_eq!(extension("Foto.PNG").as_deref(), Some("png"));
    assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
    assert_eq!(extension("noext"), None);
    assert_eq!(extension("evil./../x"), None);
  }

  #[test]
  fn stored_names_reject_traversal() {
    let digest = "a".repeat(64);
    assert!(is_stored_name(&digest));
    assert!(is_stored_name(&format!("{digest}.pdf")));
    assert!(!is_stored_name("../etc/passwd"));
    assert!(!is_stored_name(&format!("{digest}.p/f")));
  }

  #[tokio::test]
  async fn store_is_content_addressed() {
    let store = temp_store();
    let first = store.store(upload("a.png", b"same bytes")).await.unwrap();
    let second = store.store(upload("b.png", b"same bytes")).await.unwrap();
    assert_eq!(first.url, second.url);
    assert_eq!(second.original_name, "b.png");
    assert!(first.url.starts_with("http://localhost:8080/files/"));
    assert!(first.url.ends_with(".png"));

    assert!(store.exists(&first.url).await.unwrap());
    let name = first.url.rsplit('/').next().unwrap();
    assert_eq!(store.read(name).await.unwrap().unwrap(), b"same bytes");

    tokio::fs::remove_dir_all(store.dir()).await.unwrap();
  }

  #[tokio::test]
  async fn foreign_and_missing_urls_do_not_exist() {
    let store = temp_store();
    assert!(!store.exists("https://example.org/files/x.png").await.unwrap());
    let missing = format!("http://localhost:8080/files/{}.png", "0".repeat(64));
    assert!(!store.exists(&missing).await.unwrap());
  }
}
