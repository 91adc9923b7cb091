//! SQL schema for the Beacon SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per (project_id, fingerprint); the unique constraint is what the
-- atomic upsert's ON CONFLICT clause targets.
CREATE TABLE IF NOT EXISTS issues (
    issue_id    TEXT PRIMARY KEY,
    project_id  TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    title       TEXT NOT NULL,
    level       TEXT NOT NULL,     -- 'debug'|'info'|'warning'|'error'|'fatal'
    count       INTEGER NOT NULL CHECK (count >= 1),
    first_seen  TEXT NOT NULL,     -- ISO 8601 UTC
    last_seen   TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'open',  -- 'open' | 'resolved'
    UNIQUE (project_id, fingerprint)
);

CREATE TABLE IF NOT EXISTS projects (
    project_id    TEXT PRIMARY KEY,
    owner_user_id TEXT NOT NULL
);

-- Operator-defined thresholds; written by an administrative surface,
-- read-only to the pipeline.
CREATE TABLE IF NOT EXISTS alert_rules (
    rule_id    TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    level      TEXT NOT NULL,
    threshold  INTEGER NOT NULL CHECK (threshold >= 1),
    is_active  INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS issues_project_idx     ON issues(project_id);
CREATE INDEX IF NOT EXISTS issues_last_seen_idx   ON issues(last_seen);
CREATE INDEX IF NOT EXISTS alert_rules_project_idx ON alert_rules(project_id);

PRAGMA user_version = 1;
";
