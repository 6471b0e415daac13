//! `delegasi`: command-line client for the delegation workflow server.
//!
//! # Usage
//!
//! ```
//! delegasi --url http://localhost:8080 --user ops --password secret --actor <UUID> list
//! delegasi --config ~/.config/delegasi/config.toml act <ID> reject --reason "tanggal salah"
//! ```

mod client;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use delegasi_core::{
  Action, ActionInput, Status, request::Attachment, response::NewResponse,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "delegasi", about = "Client for the delegasi workflow server")]
struct Args {
  /// Path to a TOML config file (url, username, password, actor).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the server (default: http://localhost:8080).
  #[arg(long, env = "DELEGASI_URL", global = true)]
  url: Option<String>,

  /// Transport username.
  #[arg(long, env = "DELEGASI_USER", global = true)]
  user: Option<String>,

  /// Transport password (plaintext).
  #[arg(long, env = "DELEGASI_PASSWORD", global = true)]
  password: Option<String>,

  /// Person id to act as.
  #[arg(long, env = "DELEGASI_ACTOR", global = true)]
  actor: Option<Uuid>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List delegations.
  List {
    #[arg(long)]
    status: Option<Status>,
    /// Only delegations assigned to this person.
    #[arg(long, conflicts_with = "mine")]
    person: Option<Uuid>,
    /// Only delegations assigned to the acting person.
    #[arg(long)]
    mine:   bool,
  },
  /// Show one delegation and the actions available to you.
  Show { id: Uuid },
  /// Show the status history of a delegation.
  History { id: Uuid },
  /// Apply a workflow action.
  Act {
    id:       Uuid,
    action:   Action,
    /// Rejection reason for `reject`.
    #[arg(long)]
    reason:   Option<String>,
    /// Decision note for `final_approve` and `final_reject`.
    #[arg(long)]
    note:     Option<String>,
    /// New division for `reassign`.
    #[arg(long)]
    division: Option<Uuid>,
    /// New person for `reassign`.
    #[arg(long)]
    person:   Option<Uuid>,
  },
  /// List the responses to a delegation.
  Responses { id: Uuid },
  /// Submit a response, uploading any files first.
  Respond {
    id:   Uuid,
    #[arg(long, default_value = "")]
    text: String,
    #[arg(long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,
  },
  /// Upload a file and print its URL.
  Upload { path: PathBuf },
  /// List divisions.
  Divisions,
  /// List people, optionally only one division.
  People {
    #[arg(long)]
    division: Option<Uuid>,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
  #[serde(default)]
  actor:    Option<Uuid>,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .user
      .or_else(|| non_empty(&file_cfg.username))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| non_empty(&file_cfg.password))
      .unwrap_or_default(),
    actor:    args.actor.or(file_cfg.actor),
  };
  tracing::debug!(url = %api_config.base_url, actor = ?api_config.actor, "configured");

  let actor = api_config.actor;
  let client = ApiClient::new(api_config)?;
  run(&client, actor, args.command).await
}

async fn run(client: &ApiClient, actor: Option<Uuid>, command: Command) -> Result<()> {
  match command {
    Command::List {
      status,
      person,
      mine,
    } => {
      let person = if mine {
        Some(actor.context("--mine needs an acting person (--actor)")?)
      } else {
        person
      };
      let requests = client.list_delegations(status, person).await?;
      print!("{}", render::delegation_table(&requests));
    }
    Command::Show { id } => {
      let request = client.get_delegation(id).await?;
      let actions = if actor.is_some() {
        client.available_actions(id).await?.actions
      } else {
        Vec::new()
      };
      print!("{}", render::delegation_detail(&request, &actions));
    }
    Command::History { id } => {
      print!("{}", render::history(&client.history(id).await?));
    }
    Command::Act {
      id,
      action,
      reason,
      note,
      division,
      person,
    } => {
      let input = action_input(action, reason, note, division, person)?;
      let request = client.apply(id, &input).await?;
      println!("{} → {}", request.id, request.status);
    }
    Command::Responses { id } => {
      print!("{}", render::responses(&client.list_responses(id).await?));
    }
    Command::Respond { id, text, files } => {
      let mut uploaded = Vec::with_capacity(files.len());
      for path in &files {
        uploaded.push(upload(client, path).await?);
      }
      let response = client
        .respond(id, &NewResponse {
          text,
          image_url: None,
          files: uploaded,
        })
        .await?;
      println!("{}", response.id);
    }
    Command::Upload { path } => {
      let attachment = upload(client, &path).await?;
      println!("{}", attachment.url);
    }
    Command::Divisions => {
      print!("{}", render::divisions(&client.list_divisions().await?));
    }
    Command::People { division } => {
      print!("{}", render::people(&client.list_people(division).await?));
    }
  }
  Ok(())
}

async fn upload(client: &ApiClient, path: &std::path::Path) -> Result<Attachment> {
  client.upload(path, mime_type(path)).await
}

/// Guess a MIME type from the file extension.
fn mime_type(path: &std::path::Path) -> &'static str {
  let ext = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase);
  match ext.as_deref() {
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("gif") => "image/gif",
    Some("webp") => "image/webp",
    Some("pdf") => "application/pdf",
    Some("txt") => "text/plain",
    _ => "application/octet-stream",
  }
}

/// Pair an action with the flags it needs, refusing flags it does not take.
fn action_input(
  action: Action,
  reason: Option<String>,
  note: Option<String>,
  division: Option<Uuid>,
  person: Option<Uuid>,
) -> Result<ActionInput> {
  let takes_note = matches!(action, Action::FinalApprove | Action::FinalReject);
  if reason.is_some() && action != Action::Reject {
    bail!("--reason only applies to reject");
  }
  if note.is_some() && !takes_note {
    bail!("--note only applies to final_approve and final_reject");
  }
  if (division.is_some() || person.is_some()) && action != Action::Reassign {
    bail!("--division and --person only apply to reassign");
  }

  Ok(match action {
    Action::Accept => ActionInput::Accept,
    Action::Reject => ActionInput::Reject {
      reason: reason.unwrap_or_default(),
    },
    Action::Fix => ActionInput::Fix,
    Action::Confirm => ActionInput::Confirm,
    Action::Decline => ActionInput::Decline,
    Action::Reassign => ActionInput::Reassign {
      division_id: division.context("reassign needs --division")?,
      person_id:   person.context("reassign needs --person")?,
    },
    Action::FinalApprove => ActionInput::FinalApprove { note },
    Action::FinalReject => ActionInput::FinalReject { note },
  })
}
