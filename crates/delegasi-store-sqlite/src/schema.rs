//! SQL schema for the delegation store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for later migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS divisions (
    division_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS people (
    person_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    role        TEXT NOT NULL,   -- 'admin' | 'delegation_verificator' | ...
    division_id TEXT REFERENCES divisions(division_id) ON DELETE SET NULL
);

-- Targets are not foreign keys: the history of a delegation outlives
-- directory changes.
CREATE TABLE IF NOT EXISTS delegations (
    delegation_id         TEXT PRIMARY KEY,
    creator_id            TEXT NOT NULL,
    division_id           TEXT NOT NULL,
    person_id             TEXT NOT NULL,
    title                 TEXT NOT NULL,
    description           TEXT NOT NULL,
    description_image_url TEXT,
    files                 TEXT NOT NULL DEFAULT '[]',   -- JSON array
    status                TEXT NOT NULL,
    rejection_reason      TEXT,
    rejection_revision    INTEGER,
    content_revision      INTEGER NOT NULL DEFAULT 0,
    event_date            TEXT NOT NULL,
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL,
    version               INTEGER NOT NULL DEFAULT 0,
    CHECK ((rejection_reason IS NOT NULL) = (status = 'Verifikasi Ditolak'))
);

-- Responses are immutable once written.
CREATE TABLE IF NOT EXISTS responses (
    response_id   TEXT PRIMARY KEY,
    delegation_id TEXT NOT NULL REFERENCES delegations(delegation_id) ON DELETE CASCADE,
    author_id     TEXT NOT NULL,
    text          TEXT NOT NULL,
    image_url     TEXT,
    files         TEXT NOT NULL DEFAULT '[]',
    created_at    TEXT NOT NULL
);

-- Append-only.
CREATE TABLE IF NOT EXISTS status_changes (
    change_id     TEXT PRIMARY KEY,
    delegation_id TEXT NOT NULL REFERENCES delegations(delegation_id) ON DELETE CASCADE,
    action        TEXT NOT NULL,
    from_status   TEXT NOT NULL,
    to_status     TEXT NOT NULL,
    actor_id      TEXT NOT NULL,
    actor_role    TEXT NOT NULL,
    note          TEXT,
    recorded_at   TEXT NOT NULL,
    seq           INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS delegations_status_idx  ON delegations(status);
CREATE INDEX IF NOT EXISTS delegations_person_idx  ON delegations(person_id);
CREATE INDEX IF NOT EXISTS delegations_updated_idx ON delegations(updated_at);
CREATE INDEX IF NOT EXISTS responses_delegation_idx ON responses(delegation_id);
CREATE INDEX IF NOT EXISTS changes_delegation_idx  ON status_changes(delegation_id, seq);
CREATE INDEX IF NOT EXISTS people_division_idx     ON people(division_id);

PRAGMA user_version = 1;
";

/// Statements rewriting statuses stored under the older
/// `Butuh Verifikasi Penerima` literal to the current one, so status filters
/// match on plain equality. Run after [`SCHEMA`] on every open.
pub const NORMALIZE_LEGACY_STATUS: [&str; 3] = [
  "UPDATE delegations SET status = 'Perlu Konfirmasi Penerima'
    WHERE status = 'Butuh Verifikasi Penerima'",
  "UPDATE status_changes SET from_status = 'Perlu Konfirmasi Penerima'
    WHERE from_status = 'Butuh Verifikasi Penerima'",
  "UPDATE status_changes SET to_status = 'Perlu Konfirmasi Penerima'
    WHERE to_status = 'Butuh Verifikasi Penerima'",
];
