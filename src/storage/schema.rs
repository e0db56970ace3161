//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Fleet-Sounding database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Companies parsed from rosters
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    address TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    fax TEXT,
    email TEXT,
    website_hint TEXT,
    website TEXT,
    member_class TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Fused vessel records; natural_key is "imo:<imo>" or "name:<name>|<owner>"
CREATE TABLE IF NOT EXISTS vessels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    natural_key TEXT NOT NULL UNIQUE,
    company_id INTEGER REFERENCES companies(id),
    name TEXT NOT NULL DEFAULT '',
    imo TEXT,
    owner TEXT,
    confidence REAL NOT NULL DEFAULT 0,
    record_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_vessels_imo ON vessels(imo);
CREATE INDEX IF NOT EXISTS idx_vessels_company ON vessels(company_id);

-- Photos and documents attached to vessels
CREATE TABLE IF NOT EXISTS vessel_media (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vessel_id INTEGER NOT NULL REFERENCES vessels(id),
    kind TEXT NOT NULL,
    url TEXT NOT NULL,
    source TEXT NOT NULL,
    added_at TEXT NOT NULL,
    UNIQUE(vessel_id, url)
);

-- Reliability statistics per external source
CREATE TABLE IF NOT EXISTS source_performance (
    source TEXT PRIMARY KEY,
    attempts INTEGER NOT NULL DEFAULT 0,
    successes INTEGER NOT NULL DEFAULT 0,
    avg_latency_secs REAL NOT NULL DEFAULT 0,
    last_attempt TEXT,
    last_success TEXT
);

-- Cached fused search results
CREATE TABLE IF NOT EXISTS result_cache (
    cache_key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    ttl_secs INTEGER NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
