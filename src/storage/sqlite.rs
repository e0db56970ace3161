//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the repository,
//! performance and cache traits. The connection sits behind a mutex so a
//! single `SqliteStorage` can be shared across tasks.

use crate::roster::CompanySeed;
use crate::search::cache::{CacheEntry, CacheKey};
use crate::search::FusedVesselRecord;
use crate::state::SourcePerformanceStat;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    CacheStore, PerformanceStore, RecordRepository, StorageError, StorageResult,
};
use crate::storage::{MediaItem, RepositorySummary, StoredVessel, VesselFilter, VesselKey};
use crate::SoundingError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and applies the schema
    pub fn new(path: &Path) -> Result<Self, SoundingError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SoundingError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

fn key_string(key: &VesselKey) -> String {
    match key {
        VesselKey::Imo(imo) => format!("imo:{}", imo),
        VesselKey::NameOwner(name, owner) => {
            format!("name:{}|{}", name.to_lowercase(), owner.to_lowercase())
        }
        VesselKey::Mmsi(mmsi) => format!("mmsi:{}", mmsi),
    }
}

fn parse_time(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| s.parse::<DateTime<Utc>>().ok())
}

impl RecordRepository for SqliteStorage {
    fn upsert_company(&self, seed: &CompanySeed, website: Option<&str>) -> StorageResult<i64> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO companies
             (name, address, phone, fax, email, website_hint, website, member_class, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(name) DO UPDATE SET
                address = excluded.address,
                phone = excluded.phone,
                fax = excluded.fax,
                email = excluded.email,
                website_hint = excluded.website_hint,
                website = COALESCE(excluded.website, companies.website),
                member_class = excluded.member_class,
                updated_at = excluded.updated_at",
            params![
                seed.name,
                seed.address,
                seed.phone,
                seed.fax,
                seed.email,
                seed.website_hint,
                website,
                seed.member_class.to_db_string(),
                now,
            ],
        )?;

        let id = conn.query_row(
            "SELECT id FROM companies WHERE name = ?1",
            params![seed.name],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    fn upsert_vessel(
        &self,
        company_id: Option<i64>,
        record: &FusedVesselRecord,
    ) -> StorageResult<i64> {
        let natural_key = key_string(&VesselKey::of(record)?);
        let record_json = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();

        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM vessels WHERE natural_key = ?1",
                params![natural_key],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            conn.execute(
                "UPDATE vessels SET
                    company_id = COALESCE(?1, company_id),
                    name = ?2, imo = ?3, owner = ?4, confidence = ?5,
                    record_json = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    company_id,
                    record.vessel_name().unwrap_or_default(),
                    record.imo(),
                    record.owner(),
                    record.confidence,
                    record_json,
                    now,
                    id,
                ],
            )?;
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO vessels
             (natural_key, company_id, name, imo, owner, confidence, record_json, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                natural_key,
                company_id,
                record.vessel_name().unwrap_or_default(),
                record.imo(),
                record.owner(),
                record.confidence,
                record_json,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn insert_media(&self, vessel_id: i64, item: &MediaItem) -> StorageResult<()> {
        let conn = self.conn()?;

        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM vessels WHERE id = ?1",
                params![vessel_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StorageError::VesselNotFound(vessel_id));
        }

        conn.execute(
            "INSERT OR IGNORE INTO vessel_media (vessel_id, kind, url, source, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vessel_id,
                item.kind.to_db_string(),
                item.url,
                item.source,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn query_vessels(&self, filter: &VesselFilter) -> StorageResult<Vec<StoredVessel>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, company_id, name, imo, owner, record_json, updated_at
             FROM vessels ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut vessels = Vec::new();
        for row in rows {
            let (id, company_id, name, imo, owner, record_json, updated_at) = row?;
            let vessel = StoredVessel {
                id,
                company_id,
                name,
                imo,
                owner,
                record: serde_json::from_str(&record_json)?,
                updated_at,
            };

            if filter.matches(&vessel) {
                vessels.push(vessel);
                if filter.limit.is_some_and(|limit| vessels.len() >= limit) {
                    break;
                }
            }
        }

        Ok(vessels)
    }

    fn summary(&self) -> StorageResult<RepositorySummary> {
        let conn = self.conn()?;

        let count = |sql: &str| -> StorageResult<u64> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as u64)
        };

        let average_confidence: Option<f64> =
            conn.query_row("SELECT AVG(confidence) FROM vessels", [], |row| row.get(0))?;

        Ok(RepositorySummary {
            companies: count("SELECT COUNT(*) FROM companies")?,
            companies_with_website: count(
                "SELECT COUNT(*) FROM companies WHERE website IS NOT NULL",
            )?,
            vessels: count("SELECT COUNT(*) FROM vessels")?,
            vessels_with_imo: count("SELECT COUNT(*) FROM vessels WHERE imo IS NOT NULL")?,
            media_items: count("SELECT COUNT(*) FROM vessel_media")?,
            average_confidence: average_confidence.unwrap_or(0.0),
        })
    }
}

impl PerformanceStore for SqliteStorage {
    fn load_stat(&self, source: &str) -> StorageResult<Option<SourcePerformanceStat>> {
        let conn = self.conn()?;
        let stat = conn
            .query_row(
                "SELECT attempts, successes, avg_latency_secs, last_attempt, last_success
                 FROM source_performance WHERE source = ?1",
                params![source],
                |row| {
                    Ok(SourcePerformanceStat {
                        attempts: row.get(0)?,
                        successes: row.get(1)?,
                        avg_latency_secs: row.get(2)?,
                        last_attempt: parse_time(row.get(3)?),
                        last_success: parse_time(row.get(4)?),
                    })
                },
            )
            .optional()?;

        Ok(stat)
    }

    fn save_stat(&self, source: &str, stat: &SourcePerformanceStat) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO source_performance
             (source, attempts, successes, avg_latency_secs, last_attempt, last_success)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                source,
                stat.attempts,
                stat.successes,
                stat.avg_latency_secs,
                stat.last_attempt.map(|t| t.to_rfc3339()),
                stat.last_success.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn load_all_stats(&self) -> StorageResult<Vec<(String, SourcePerformanceStat)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT source, attempts, successes, avg_latency_secs, last_attempt, last_success
             FROM source_performance ORDER BY source",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                SourcePerformanceStat {
                    attempts: row.get(1)?,
                    successes: row.get(2)?,
                    avg_latency_secs: row.get(3)?,
                    last_attempt: parse_time(row.get(4)?),
                    last_success: parse_time(row.get(5)?),
                },
            ))
        })?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        Ok(stats)
    }
}

impl CacheStore for SqliteStorage {
    fn load_entry(&self, key: &CacheKey) -> StorageResult<Option<CacheEntry>> {
        let conn = self.conn()?;
        let row: Option<(String, String, i64)> = conn
            .query_row(
                "SELECT payload, created_at, ttl_secs FROM result_cache WHERE cache_key = ?1",
                params![key.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((payload, created_at, ttl_secs)) = row else {
            return Ok(None);
        };

        let Some(created_at) = parse_time(Some(created_at)) else {
            tracing::warn!("Cache entry {} has an unreadable timestamp", key);
            return Ok(None);
        };

        Ok(Some(CacheEntry {
            key: key.clone(),
            payload: serde_json::from_str(&payload)?,
            created_at,
            ttl: Duration::from_secs(ttl_secs.max(0) as u64),
        }))
    }

    fn save_entry(&self, entry: &CacheEntry) -> StorageResult<()> {
        let payload = serde_json::to_string(&entry.payload)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO result_cache (cache_key, payload, created_at, ttl_secs)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.key.as_str(),
                payload,
                entry.created_at.to_rfc3339(),
                entry.ttl.as_secs() as i64,
            ],
        )?;
        Ok(())
    }
}
