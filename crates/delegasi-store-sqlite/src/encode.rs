//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings with nanoseconds, so they
//! sort lexically. Attachment lists are compact JSON. UUIDs are hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use delegasi_core::{
  directory::{Division, Person},
  history::StatusChange,
  request::{Attachment, Content, DelegationRequest, Rejection, Target},
  response::Response,
  status::{Action, Role, Status},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// SQLite integers are signed; versions never get near the limit.
pub fn encode_version(v: u64) -> i64 { v as i64 }

fn decode_unsigned<T: TryFrom<i64>>(column: &'static str, value: i64) -> Result<T> {
  T::try_from(value).map_err(|_| Error::OutOfRange { column, value })
}

pub fn encode_files(files: &[Attachment]) -> Result<String> {
  Ok(serde_json::to_string(files)?)
}

fn decode_files(s: &str) -> Result<Vec<Attachment>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawDelegation::from_row`].
pub const DELEGATION_COLUMNS: &str = "delegation_id, creator_id, division_id, \
   person_id, title, description, description_image_url, files, status, \
   rejection_reason, rejection_revision, content_revision, event_date, \
   created_at, updated_at, version";

/// Raw values read directly from a `delegations` row.
pub struct RawDelegation {
  pub delegation_id:         String,
  pub creator_id:            String,
  pub division_id:           String,
  pub person_id:             String,
  pub title:                 String,
  pub description:           String,
  pub description_image_url: Option<String>,
  pub files:                 String,
  pub status:                String,
  pub rejection_reason:      Option<String>,
  pub rejection_revision:    Option<i64>,
  pub content_revision:      i64,
  pub event_date:            String,
  pub created_at:            String,
  pub updated_at:            String,
  pub version:               i64,
}

impl RawDelegation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      delegation_id:         row.get(0)?,
      creator_id:            row.get(1)?,
      division_id:           row.get(2)?,
      person_id:             row.get(3)?,
      title:                 row.get(4)?,
      description:           row.get(5)?,
      description_image_url: row.get(6)?,
      files:                 row.get(7)?,
      status:                row.get(8)?,
      rejection_reason:      row.get(9)?,
      rejection_revision:    row.get(10)?,
      content_revision:      row.get(11)?,
      event_date:            row.get(12)?,
      created_at:            row.get(13)?,
      updated_at:            row.get(14)?,
      version:               row.get(15)?,
    })
  }

  pub fn into_request(self) -> Result<DelegationRequest> {
    let rejection = match self.rejection_reason {
      Some(reason) => Some(Rejection {
        reason,
        content_revision: decode_unsigned(
          "rejection_revision",
          self.rejection_revision.unwrap_or(0),
        )?,
      }),
      None => None,
    };

    Ok(DelegationRequest {
      id: decode_uuid(&self.delegation_id)?,
      creator_id: decode_uuid(&self.creator_id)?,
      target: Target {
        division_id: decode_uuid(&self.division_id)?,
        person_id:   decode_uuid(&self.person_id)?,
      },
      content: Content {
        title:                 self.title,
        description:           self.description,
        description_image_url: self.description_image_url,
        files:                 decode_files(&self.files)?,
      },
      status: self.status.parse::<Status>()?,
      rejection,
      content_revision: decode_unsigned("content_revision", self.content_revision)?,
      date: decode_dt(&self.event_date)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      version: decode_unsigned("version", self.version)?,
    })
  }
}

/// Owned column values for writing a delegation row.
pub struct DelegationRow {
  pub delegation_id:         String,
  pub creator_id:            String,
  pub division_id:           String,
  pub person_id:             String,
  pub title:                 String,
  pub description:           String,
  pub description_image_url: Option<String>,
  pub files:                 String,
  pub status:                &'static str,
  pub rejection_reason:      Option<String>,
  pub rejection_revision:    Option<i64>,
  pub content_revision:      i64,
  pub event_date:            String,
  pub created_at:            String,
  pub updated_at:            String,
  pub version:               i64,
}

impl DelegationRow {
  pub fn encode(request: &DelegationRequest) -> Result<Self> {
    Ok(Self {
      delegation_id:         encode_uuid(request.id),
      creator_id:            encode_uuid(request.creator_id),
      division_id:           encode_uuid(request.target.division_id),
      person_id:             encode_uuid(request.target.person_id),
      title:                 request.content.title.clone(),
      description:           request.content.description.clone(),
      description_image_url: request.content.description_image_url.clone(),
      files:                 encode_files(&request.content.files)?,
      status:                request.status.as_str(),
      rejection_reason:      request.rejection.as_ref().map(|r| r.reason.clone()),
      rejection_revision:    request
        .rejection
        .as_ref()
        .map(|r| i64::from(r.content_revision)),
      content_revision:      i64::from(request.content_revision),
      event_date:            encode_dt(request.date),
      created_at:            encode_dt(request.created_at),
      updated_at:            encode_dt(request.updated_at),
      version:               encode_version(request.version),
    })
  }
}

/// Raw values read directly from a `responses` row.
pub struct RawResponse {
  pub response_id:   String,
  pub delegation_id: String,
  pub author_id:     String,
  pub text:          String,
  pub image_url:     Option<String>,
  pub files:         String,
  pub created_at:    String,
}

impl RawResponse {
  pub fn into_response(self) -> Result<Response> {
    Ok(Response {
      id:            decode_uuid(&self.response_id)?,
      delegation_id: decode_uuid(&self.delegation_id)?,
      author_id:     decode_uuid(&self.author_id)?,
      text:          self.text,
      image_url:     self.image_url,
      files:         decode_files(&self.files)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `status_changes` row.
pub struct RawChange {
  pub change_id:     String,
  pub delegation_id: String,
  pub action:        String,
  pub from_status:   String,
  pub to_status:     String,
  pub actor_id:      String,
  pub actor_role:    String,
  pub note:          Option<String>,
  pub recorded_at:   String,
}

impl RawChange {
  pub fn into_change(self) -> Result<StatusChange> {
    Ok(StatusChange {
      change_id:     decode_uuid(&self.change_id)?,
      delegation_id: decode_uuid(&self.delegation_id)?,
      action:        self.action.parse::<Action>()?,
      from:          self.from_status.parse::<Status>()?,
      to:            self.to_status.parse::<Status>()?,
      actor_id:      decode_uuid(&self.actor_id)?,
      actor_role:    self.actor_role.parse::<Role>()?,
      note:          self.note,
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}

pub struct RawPerson {
  pub person_id:   String,
  pub name:        String,
  pub email:       String,
  pub role:        String,
  pub division_id: Option<String>,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:   row.get(0)?,
      name:        row.get(1)?,
      email:       row.get(2)?,
      role:        row.get(3)?,
      division_id: row.get(4)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:          decode_uuid(&self.person_id)?,
      name:        self.name,
      email:       self.email,
      role:        self.role.parse::<Role>()?,
      division_id: self.division_id.as_deref().map(decode_uuid).transpose()?,
    })
  }
}

pub struct RawDivision {
  pub division_id: String,
  pub name:        String,
}

impl RawDivision {
  pub fn into_division(self) -> Result<Division> {
    Ok(Division {
      id:   decode_uuid(&self.division_id)?,
      name: self.name,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let early = DateTime::parse_from_rfc3339("2024-05-01T09:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let later = early + chrono::Duration::nanoseconds(1_500);
    assert!(encode_dt(early) < encode_dt(later));
    assert_eq!(encode_dt(early).len(), encode_dt(later).len());
    assert_eq!(decode_dt(&encode_dt(later)).unwrap(), later);
  }

  #[test]
  fn negative_revision_is_out_of_range() {
    let err = decode_unsigned::<u32>("content_revision", -1).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { value: -1, .. }));
  }
}
