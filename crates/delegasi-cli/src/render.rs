//! Plain-text rendering of API replies for the terminal.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use delegasi_core::{
  Action,
  directory::{Division, Person},
  history::StatusChange,
  request::DelegationRequest,
  response::Response,
};

const TITLE_WIDTH: usize = 40;

fn date(at: &DateTime<Utc>) -> String { at.format("%Y-%m-%d %H:%M").to_string() }

/// Shorten `s` to at most `width` characters, marking the cut with `…`.
pub fn truncate(s: &str, width: usize) -> String {
  if s.chars().count() <= width {
    return s.to_owned();
  }
  let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
  out.push('…');
  out
}

/// One line per delegation: id, status, title.
pub fn delegation_table(requests: &[DelegationRequest]) -> String {
  if requests.is_empty() {
    return "no delegations\n".to_owned();
  }
  let mut out = String::new();
  for request in requests {
    let _ = writeln!(
      out,
      "{}  {:<26}  {}",
      request.id,
      request.status.as_str(),
      truncate(&request.content.title, TITLE_WIDTH),
    );
  }
  out
}

/// Full view of one delegation and what the caller may do with it.
pub fn delegation_detail(request: &DelegationRequest, actions: &[Action]) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}", request.content.title);
  let _ = writeln!(out, "  id:        {}", request.id);
  let _ = writeln!(out, "  status:    {}", request.status);
  if let Some(reason) = request.rejection_reason() {
    let _ = writeln!(out, "  rejected:  {reason}");
  }
  let _ = writeln!(out, "  date:      {}", date(&request.date));
  let _ = writeln!(out, "  creator:   {}", request.creator_id);
  let _ = writeln!(
    out,
    "  target:    {} (division {})",
    request.target.person_id, request.target.division_id
  );
  let _ = writeln!(out, "  revision:  {}", request.content_revision);
  if !request.content.description.is_empty() {
    let _ = writeln!(out, "\n{}\n", request.content.description);
  }
  if let Some(url) = &request.content.description_image_url {
    let _ = writeln!(out, "  image:     {url}");
  }
  for file in &request.content.files {
    let _ = writeln!(out, "  file:      {} <{}>", file.original_name, file.url);
  }
  let actions = if actions.is_empty() {
    "none".to_owned()
  } else {
    actions
      .iter()
      .map(|a| a.as_str())
      .collect::<Vec<_>>()
      .join(", ")
  };
  let _ = writeln!(out, "  actions:   {actions}");
  out
}

pub fn history(changes: &[StatusChange]) -> String {
  let mut out = String::new();
  for change in changes {
    let _ = write!(
      out,
      "{}  {:<13}  {} → {}  by {} ({})",
      date(&change.recorded_at),
      change.action.as_str(),
      change.from,
      change.to,
      change.actor_id,
      change.actor_role,
    );
    if let Some(note) = &change.note {
      let _ = write!(out, ": {note}");
    }
    out.push('\n');
  }
  out
}

pub fn responses(responses: &[Response]) -> String {
  let mut out = String::new();
  for response in responses {
    let _ = writeln!(
      out,
      "[{}] {}",
      date(&response.created_at),
      response.author_id
    );
    if !response.text.is_empty() {
      let _ = writeln!(out, "  {}", response.text);
    }
    for file in &response.files {
      let _ = writeln!(out, "  file: {} <{}>", file.original_name, file.url);
    }
  }
  out
}

pub fn divisions(divisions: &[Division]) -> String {
  divisions
    .iter()
    .map(|d| format!("{}  {}\n", d.id, d.name))
    .collect()
}

pub fn people(people: &[Person]) -> String {
  people
    .iter()
    .map(|p| format!("{}  {:<22}  {:<24}  {}\n", p.id, p.role.as_str(), p.name, p.email))
    .collect()
}
