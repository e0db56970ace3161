//! In-memory storage implementation
//!
//! Mirrors `SqliteStorage` semantics without touching disk. Used for dry
//! runs and tests.

use crate::roster::CompanySeed;
use crate::search::cache::{CacheEntry, CacheKey};
use crate::search::FusedVesselRecord;
use crate::state::SourcePerformanceStat;
use crate::storage::traits::{
    CacheStore, PerformanceStore, RecordRepository, StorageError, StorageResult,
};
use crate::storage::{MediaItem, RepositorySummary, StoredVessel, VesselFilter, VesselKey};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    companies: Vec<(CompanySeed, Option<String>)>,
    vessels: Vec<StoredVessel>,
    vessel_keys: HashMap<VesselKey, i64>,
    media: HashSet<(i64, String)>,
    stats: BTreeMap<String, SourcePerformanceStat>,
    cache: HashMap<CacheKey, CacheEntry>,
}

/// Storage backend that keeps everything in process memory
#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StorageResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StorageError::Poisoned)
    }
}

/// Lowercases names so keys match the way the SQLite backend compares them
fn normalized_key(key: VesselKey) -> VesselKey {
    match key {
        VesselKey::NameOwner(name, owner) => {
            VesselKey::NameOwner(name.to_lowercase(), owner.to_lowercase())
        }
        imo => imo,
    }
}

impl RecordRepository for MemoryStorage {
    fn upsert_company(&self, seed: &CompanySeed, website: Option<&str>) -> StorageResult<i64> {
        let mut tables = self.tables()?;

        if let Some(index) = tables.companies.iter().position(|(c, _)| c.name == seed.name) {
            let (stored, stored_website) = &mut tables.companies[index];
            *stored = seed.clone();
            if let Some(website) = website {
                *stored_website = Some(website.to_string());
            }
            return Ok(index as i64 + 1);
        }

        tables
            .companies
            .push((seed.clone(), website.map(str::to_string)));
        Ok(tables.companies.len() as i64)
    }

    fn upsert_vessel(
        &self,
        company_id: Option<i64>,
        record: &FusedVesselRecord,
    ) -> StorageResult<i64> {
        let key = normalized_key(VesselKey::of(record)?);
        let mut tables = self.tables()?;
        let now = Utc::now().to_rfc3339();

        if let Some(&id) = tables.vessel_keys.get(&key) {
            if let Some(stored) = tables.vessels.iter_mut().find(|v| v.id == id) {
                stored.company_id = company_id.or(stored.company_id);
                stored.name = record.vessel_name().unwrap_or_default().to_string();
                stored.imo = record.imo().map(str::to_string);
                stored.owner = record.owner().map(str::to_string);
                stored.record = record.clone();
                stored.updated_at = now;
            }
            return Ok(id);
        }

        let id = tables.vessels.len() as i64 + 1;
        tables.vessels.push(StoredVessel {
            id,
            company_id,
            name: record.vessel_name().unwrap_or_default().to_string(),
            imo: record.imo().map(str::to_string),
            owner: record.owner().map(str::to_string),
            record: record.clone(),
            updated_at: now,
        });
        tables.vessel_keys.insert(key, id);
        Ok(id)
    }

    fn insert_media(&self, vessel_id: i64, item: &MediaItem) -> StorageResult<()> {
        let mut tables = self.tables()?;
        if !tables.vessels.iter().any(|v| v.id == vessel_id) {
            return Err(StorageError::VesselNotFound(vessel_id));
        }
        tables.media.insert((vessel_id, item.url.clone()));
        Ok(())
    }

    fn query_vessels(&self, filter: &VesselFilter) -> StorageResult<Vec<StoredVessel>> {
        let tables = self.tables()?;
        let matching = tables.vessels.iter().filter(|v| filter.matches(v)).cloned();

        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    fn summary(&self) -> StorageResult<RepositorySummary> {
        let tables = self.tables()?;
        let vessels = tables.vessels.len() as u64;
        let average_confidence = if vessels == 0 {
            0.0
        } else {
            tables.vessels.iter().map(|v| v.record.confidence).sum::<f64>() / vessels as f64
        };

        Ok(RepositorySummary {
            companies: tables.companies.len() as u64,
            companies_with_website: tables.companies.iter().filter(|(_, w)| w.is_some()).count()
                as u64,
            vessels,
            vessels_with_imo: tables.vessels.iter().filter(|v| v.imo.is_some()).count() as u64,
            media_items: tables.media.len() as u64,
            average_confidence,
        })
    }
}

impl PerformanceStore for MemoryStorage {
    fn load_stat(&self, source: &str) -> StorageResult<Option<SourcePerformanceStat>> {
        Ok(self.tables()?.stats.get(source).cloned())
    }

    fn save_stat(&self, source: &str, stat: &SourcePerformanceStat) -> StorageResult<()> {
        self.tables()?
            .stats
            .insert(source.to_string(), stat.clone());
        Ok(())
    }

    fn load_all_stats(&self) -> StorageResult<Vec<(String, SourcePerformanceStat)>> {
        Ok(self
            .tables()?
            .stats
            .iter()
            .map(|(name, stat)| (name.clone(), stat.clone()))
            .collect())
    }
}

impl CacheStore for MemoryStorage {
    fn load_entry(&self, key: &CacheKey) -> StorageResult<Option<CacheEntry>> {
        Ok(self.tables()?.cache.get(key).cloned())
    }

    fn save_entry(&self, entry: &CacheEntry) -> StorageResult<()> {
        self.tables()?
            .cache
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::MemberClass;
    use crate::search::{Attribute, AttributeValue};

    fn seed(name: &str) -> CompanySeed {
        CompanySeed {
            name: name.to_string(),
            address: String::new(),
            phone: String::new(),
            fax: None,
            website_hint: None,
            email: None,
            member_class: MemberClass::Associate,
        }
    }

    fn vessel(name: &str, owner: &str) -> FusedVesselRecord {
        let mut record = FusedVesselRecord::new();
        record.seed(Attribute::VesselName, AttributeValue::Text(name.to_string()));
        record.seed(Attribute::Owner, AttributeValue::Text(owner.to_string()));
        record
    }

    #[test]
    fn test_company_upsert_keeps_id() {
        let storage = MemoryStorage::new();
        let a = storage.upsert_company(&seed("Acme"), None).unwrap();
        let b = storage.upsert_company(&seed("Borneo"), None).unwrap();
        let a2 = storage.upsert_company(&seed("Acme"), Some("http://acme.com/")).unwrap();

        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(storage.summary().unwrap().companies_with_website, 1);
    }

    #[test]
    fn test_vessel_name_key_is_case_insensitive() {
        let storage = MemoryStorage::new();
        let a = storage.upsert_vessel(None, &vessel("Tug One", "Acme")).unwrap();
        let b = storage.upsert_vessel(None, &vessel("TUG ONE", "acme")).unwrap();
        assert_eq!(a, b);
        assert_eq!(storage.summary().unwrap().vessels, 1);
    }

    #[test]
    fn test_summary_average_confidence() {
        let storage = MemoryStorage::new();
        let mut a = vessel("A", "x");
        a.confidence = 0.2;
        let mut b = vessel("B", "x");
        b.confidence = 0.6;
        storage.upsert_vessel(None, &a).unwrap();
        storage.upsert_vessel(None, &b).unwrap();

        let summary = storage.summary().unwrap();
        assert!((summary.average_confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_media_requires_vessel() {
        let storage = MemoryStorage::new();
        let photo = MediaItem::photo("p1", "s");
        assert!(storage.insert_media(1, &photo).is_err());

        let id = storage.upsert_vessel(None, &vessel("A", "x")).unwrap();
        storage.insert_media(id, &photo).unwrap();
        storage.insert_media(id, &photo).unwrap();
        assert_eq!(storage.summary().unwrap().media_items, 1);
    }
}
