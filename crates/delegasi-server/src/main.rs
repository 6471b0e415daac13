//! delegasi-server binary.
//!
//! Settings come from `config.toml` (or `--config PATH`) overlaid with
//! `DELEGASI_*` environment variables, e.g. `DELEGASI_PORT=9000`.
//!
//! ```
//! # argon2 PHC string for `auth_password_hash`
//! cargo run -p delegasi-server -- --hash-password
//!
//! # first administrator; prints the person id to use as `x-actor-id`
//! cargo run -p delegasi-server -- --create-admin "Ani" --email ani@example.org
//! ```

use std::{
  io::{self, BufRead as _, Write as _},
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, anyhow};
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use delegasi_core::Workflow;
use delegasi_server::{ServerConfig, attachments::FsAttachmentStore};
use delegasi_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

type Engine = Arc<Workflow<SqliteStore, FsAttachmentStore>>;

#[derive(Parser)]
#[command(author, version, about = "Delegasi workflow server")]
struct Cli {
  /// TOML configuration file; missing is fine if the environment covers it.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Read a password from stdin, print its argon2 hash and exit.
  #[arg(long, conflicts_with = "create_admin")]
  hash_password: bool,

  /// Register an administrator with this name and exit.
  #[arg(long, value_name = "NAME", requires = "email")]
  create_admin: Option<String>,

  /// Email address for `--create-admin`.
  #[arg(long)]
  email: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  if cli.hash_password {
    println!("{}", hash_password(&prompt("Password: ")?)?);
    return Ok(());
  }

  let cfg = load_config(cli.config)?;
  let files = FsAttachmentStore::new(expand_home(&cfg.attachment_dir), &cfg.public_base_url);
  let engine = open_engine(&cfg, files.clone()).await?;

  match cli.create_admin {
    Some(name) => {
      let admin = engine
        .bootstrap_admin(name, cli.email.unwrap_or_default())
        .await
        .context("failed to register administrator")?;
      println!("{}", admin.id);
      Ok(())
    }
    None => serve(&cfg, engine, files).await,
  }
}

fn load_config(path: PathBuf) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("DELEGASI").try_parsing(true))
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("invalid server configuration")
}

async fn open_engine(cfg: &ServerConfig, files: FsAttachmentStore) -> anyhow::Result<Engine> {
  let path = expand_home(&cfg.store_path);
  let store = SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {}", path.display()))?;
  Ok(Arc::new(Workflow::new(store, files, cfg.workflow_config())))
}

async fn serve(cfg: &ServerConfig, engine: Engine, files: FsAttachmentStore) -> anyhow::Result<()> {
  let app = delegasi_server::router(engine, files, cfg.auth_config(), cfg.max_upload_bytes);
  let address = format!("{}:{}", cfg.host, cfg.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  tracing::info!(
    %address,
    require_revision_edit = cfg.require_revision_edit,
    "delegasi-server listening"
  );
  axum::serve(listener, app).await.context("server error")
}

fn hash_password(password: &str) -> anyhow::Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| anyhow!("argon2 error: {e}"))
}

/// Print `label` and read one line from stdin, without its line ending.
fn prompt(label: &str) -> anyhow::Result<String> {
  print!("{label}");
  io::stdout().flush()?;
  let line = io::stdin()
    .lock()
    .lines()
    .next()
    .transpose()?
    .unwrap_or_default();
  Ok(line.trim_end_matches('\r').to_owned())
}

/// Resolve a leading `~/` against `$HOME`; other paths pass through.
fn expand_home(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHash, PasswordVerifier};

  use super::*;

  #[test]
  fn hashed_password_verifies() {
    let hash = hash_password("rahasia").unwrap();
    let parsed = PasswordHash::new(&hash).unwrap();
    assert!(Argon2::default().verify_password(b"rahasia", &parsed).is_ok());
    assert!(Argon2::default().verify_password(b"salah", &parsed).is_err());
  }

  #[test]
  fn only_a_leading_tilde_component_expands() {
    assert_eq!(expand_home(Path::new("/var/lib/x.db")), PathBuf::from("/var/lib/x.db"));
    assert_eq!(expand_home(Path::new("~other/x.db")), PathBuf::from("~other/x.db"));
    if let Some(home) = std::env::var_os("HOME") {
      assert_eq!(
        expand_home(Path::new("~/data/x.db")),
        PathBuf::from(home).join("data/x.db")
      );
    }
  }
}
