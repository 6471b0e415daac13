//! [`SqliteStore`]: the SQLite implementation of [`DelegationStore`] and
//! the directory traits.

use std::path::Path;

use delegasi_core::{
  directory::{Directory, DirectoryAdmin, Division, NewPerson, Person, PersonUpdate},
  history::StatusChange,
  request::DelegationRequest,
  response::Response,
  store::{DelegationQuery, DelegationStore, Write},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    DELEGATION_COLUMNS, DelegationRow, RawChange, RawDelegation, RawDivision,
    RawPerson, RawResponse, encode_dt, encode_files, encode_uuid, encode_version,
  },
  error::Error,
  schema::{NORMALIZE_LEGACY_STATUS, SCHEMA},
};

const PERSON_COLUMNS: &str = "person_id, name, email, role, division_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A delegation store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  pub(crate) async fn init_schema(&self) -> Result<()> {
    let normalized = self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        let tx = conn.transaction()?;
        let mut normalized = 0;
        for sql in NORMALIZE_LEGACY_STATUS {
          normalized += tx.execute(sql, [])?;
        }
        tx.commit()?;
        Ok(normalized)
      })
      .await?;
    if normalized > 0 {
      tracing::info!(rows = normalized, "rewrote legacy status literals");
    }
    tracing::debug!("schema initialised");
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  async fn person_by_id(&self, id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM people WHERE person_id = ?1"),
              rusqlite::params![id_str],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawPerson::into_person).transpose()
  }
}

// ─── DelegationStore impl ────────────────────────────────────────────────────

impl DelegationStore for SqliteStore {
  type Error = Error;

  async fn insert_delegation(&self, request: &DelegationRequest) -> Result<()> {
    let row = DelegationRow::encode(request)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO delegations ({DELEGATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
          ),
          rusqlite::params![
            row.delegation_id,
            row.creator_id,
            row.division_id,
            row.person_id,
            row.title,
            row.description,
            row.description_image_url,
            row.files,
            row.status,
            row.rejection_reason,
            row.rejection_revision,
            row.content_revision,
            row.event_date,
            row.created_at,
            row.updated_at,
            row.version,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_delegation(&self, id: Uuid) -> Result<Option<DelegationRequest>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDelegation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DELEGATION_COLUMNS} FROM delegations WHERE delegation_id = ?1"
              ),
              rusqlite::params![id_str],
              RawDelegation::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDelegation::into_request).transpose()
  }

  async fn list_delegations(&self, query: &DelegationQuery) -> Result<Vec<DelegationRequest>> {
    let status = query.status.map(|s| s.as_str());
    let person = query.person_id.map(encode_uuid);
    let creator = query.creator_id.map(encode_uuid);
    // A negative LIMIT means no limit in SQLite.
    let limit = query.limit.map_or(-1, |l| l as i64);
    let offset = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawDelegation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DELEGATION_COLUMNS} FROM delegations
           WHERE (?1 IS NULL OR status = ?1)
             AND (?2 IS NULL OR person_id = ?2)
             AND (?3 IS NULL OR creator_id = ?3)
           ORDER BY updated_at DESC
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![status, person, creator, limit, offset],
            RawDelegation::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDelegation::into_request).collect()
  }

  async fn update_delegation(
    &self,
    request: &DelegationRequest,
    expected_version: u64,
    change: Option<&StatusChange>,
  ) -> Result<Write> {
    let row = DelegationRow::encode(request)?;
    let expected = encode_version(expected_version);
    let change = change.map(|c| {
      (
        encode_uuid(c.change_id),
        c.action.as_str(),
        c.from.as_str(),
        c.to.as_str(),
        encode_uuid(c.actor_id),
        c.actor_role.as_str(),
        c.note.clone(),
        encode_dt(c.recorded_at),
      )
    });

    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE delegations SET
             division_id = ?2, person_id = ?3, title = ?4, description = ?5,
             description_image_url = ?6, files = ?7, status = ?8,
             rejection_reason = ?9, rejection_revision = ?10,
             content_revision = ?11, event_date = ?12, updated_at = ?13,
             version = ?14
           WHERE delegation_id = ?1 AND version = ?15",
          rusqlite::params![
            row.delegation_id,
            row.division_id,
            row.person_id,
            row.title,
            row.description,
            row.description_image_url,
            row.files,
            row.status,
            row.rejection_reason,
            row.rejection_revision,
            row.content_revision,
            row.event_date,
            row.updated_at,
            row.version,
            expected,
          ],
        )?;
        if updated == 0 {
          return Ok(false);
        }

        if let Some((change_id, action, from, to, actor_id, actor_role, note, at)) = change {
          tx.execute(
            "INSERT INTO status_changes (
               change_id, delegation_id, action, from_status, to_status,
               actor_id, actor_role, note, recorded_at, seq
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
               (SELECT COALESCE(MAX(seq), 0) + 1 FROM status_changes WHERE delegation_id = ?2))",
            rusqlite::params![
              change_id,
              row.delegation_id,
              action,
              from,
              to,
              actor_id,
              actor_role,
              note,
              at,
            ],
          )?;
        }

        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(if applied { Write::Applied } else { Write::Stale })
  }

  async fn history(&self, delegation_id: Uuid) -> Result<Vec<StatusChange>> {
    let id_str = encode_uuid(delegation_id);

    let raws: Vec<RawChange> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT change_id, delegation_id, action, from_status, to_status,
                  actor_id, actor_role, note, recorded_at
           FROM status_changes
           WHERE delegation_id = ?1
           ORDER BY seq",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawChange {
              change_id:     row.get(0)?,
              delegation_id: row.get(1)?,
              action:        row.get(2)?,
              from_status:   row.get(3)?,
              to_status:     row.get(4)?,
              actor_id:      row.get(5)?,
              actor_role:    row.get(6)?,
              note:          row.get(7)?,
              recorded_at:   row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChange::into_change).collect()
  }

  async fn insert_response(&self, response: &Response, expected_version: u64) -> Result<Write> {
    let response_id = encode_uuid(response.id);
    let delegation_id = encode_uuid(response.delegation_id);
    let author_id = encode_uuid(response.author_id);
    let text = response.text.clone();
    let image_url = response.image_url.clone();
    let files = encode_files(&response.files)?;
    let created_at = encode_dt(response.created_at);
    let expected = encode_version(expected_version);

    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let bumped = tx.execute(
          "UPDATE delegations SET version = version + 1
           WHERE delegation_id = ?1 AND version = ?2",
          rusqlite::params![delegation_id, expected],
        )?;
        if bumped == 0 {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO responses (
             response_id, delegation_id, author_id, text, image_url, files, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            response_id,
            delegation_id,
            author_id,
            text,
            image_url,
            files,
            created_at,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(if applied { Write::Applied } else { Write::Stale })
  }

  async fn list_responses(&self, delegation_id: Uuid) -> Result<Vec<Response>> {
    let id_str = encode_uuid(delegation_id);

    let raws: Vec<RawResponse> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT response_id, delegation_id, author_id, text, image_url, files, created_at
           FROM responses
           WHERE delegation_id = ?1
           ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawResponse {
              response_id:   row.get(0)?,
              delegation_id: row.get(1)?,
              author_id:     row.get(2)?,
              text:          row.get(3)?,
              image_url:     row.get(4)?,
              files:         row.get(5)?,
              created_at:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawResponse::into_response).collect()
  }
}

// ─── Directory impls ─────────────────────────────────────────────────────────

impl Directory for SqliteStore {
  type Error = Error;

  async fn list_divisions(&self) -> Result<Vec<Division>> {
    let raws: Vec<RawDivision> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT division_id, name FROM divisions ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDivision {
              division_id: row.get(0)?,
              name:        row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDivision::into_division).collect()
  }

  async fn list_people(&self, division_id: Uuid) -> Result<Vec<Person>> {
    let id_str = encode_uuid(division_id);

    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM people WHERE division_id = ?1 ORDER BY name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> { self.person_by_id(id).await }
}

impl DirectoryAdmin for SqliteStore {
  async fn add_division(&self, name: String) -> Result<Division> {
    let division = Division {
      id: Uuid::new_v4(),
      name,
    };
    let id_str = encode_uuid(division.id);
    let name = division.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO divisions (division_id, name) VALUES (?1, ?2)",
          rusqlite::params![id_str, name],
        )?;
        Ok(())
      })
      .await?;
    Ok(division)
  }

  async fn rename_division(&self, id: Uuid, name: String) -> Result<Option<Division>> {
    let id_str = encode_uuid(id);
    let new_name = name.clone();

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE divisions SET name = ?2 WHERE division_id = ?1",
          rusqlite::params![id_str, new_name],
        )?)
      })
      .await?;

    Ok((updated > 0).then_some(Division { id, name }))
  }

  async fn remove_division(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM divisions WHERE division_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn add_person(&self, input: NewPerson) -> Result<Person> {
    let person = Person {
      id:          Uuid::new_v4(),
      name:        input.name,
      email:       input.email,
      role:        input.role,
      division_id: input.division_id,
    };
    let id_str = encode_uuid(person.id);
    let name = person.name.clone();
    let email = person.email.clone();
    let role = person.role.as_str();
    let division = person.division_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO people ({PERSON_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
          rusqlite::params![id_str, name, email, role, division],
        )?;
        Ok(())
      })
      .await?;
    Ok(person)
  }

  async fn update_person(&self, id: Uuid, update: PersonUpdate) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);
    let role = update.role.map(|r| r.as_str());
    let set_division = update.division_id.is_some();
    let division = update.division_id.flatten().map(encode_uuid);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE people SET
             name        = COALESCE(?2, name),
             role        = COALESCE(?3, role),
             division_id = CASE WHEN ?4 THEN ?5 ELSE division_id END
           WHERE person_id = ?1",
          rusqlite::params![id_str, update.name, role, set_division, division],
        )?)
      })
      .await?;

    if updated == 0 {
      return Ok(None);
    }
    self.person_by_id(id).await
  }

  async fn list_all_people(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {PERSON_COLUMNS} FROM people ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }
}
