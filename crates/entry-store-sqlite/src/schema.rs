//! SQL schema for the embedded store.
//!
//! Executed when the store is opened. The import owns row creation; the desk
//! only rewrites `status` and `timestamp`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS data (
    reg         TEXT PRIMARY KEY NOT NULL,
    name        TEXT NOT NULL,
    email       TEXT,
    phone       TEXT,
    gender      TEXT,                       -- 'M' | 'F' | other code
    status      INTEGER NOT NULL DEFAULT 0, -- 1 once entered
    timestamp   TEXT,                       -- ISO 8601 UTC; NULL while not entered
    search_str  TEXT
);

PRAGMA user_version = 1;
";
