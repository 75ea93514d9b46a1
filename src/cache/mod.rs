//! Persistent metadata cache.
//!
//! One JSON file maps a content fingerprint of each entry to either the
//! metadata we found for it or a record of the failed attempt. The whole file
//! is loaded on open and written back wholesale by [`MetadataCache::save`];
//! during a run the in-memory map is the only source of truth.
//!
//! Fingerprints ignore the citation key, so a paper re-exported under a new
//! key still hits. Two different papers with identical title, authors and
//! year and no DOI share a record.

mod timestamp;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::enrichment::EnrichedMetadata;
use crate::model::BibliographicEntry;

/// Hex characters kept from the SHA-256 digest
const FINGERPRINT_LEN: usize = 16;

pub const DEFAULT_DURATION_DAYS: u32 = 30;
pub const DEFAULT_FAILURE_RETRY_DAYS: u32 = 7;

/// Errors writing the cache file
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to create cache directory {0}: {1}")]
    CreateDir(PathBuf, #[source] std::io::Error),

    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write cache file {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to replace cache file {0}: {1}")]
    Rename(PathBuf, #[source] std::io::Error),
}

/// Expiry policy
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Records older than this are expired and evicted
    pub duration: TimeDelta,
    /// Failed entries are attempted again once their last failure is older than this
    pub failure_retry: TimeDelta,
}

impl CacheSettings {
    pub fn from_days(duration_days: u32, failure_retry_days: u32) -> Self {
        Self {
            duration: TimeDelta::days(i64::from(duration_days)),
            failure_retry: TimeDelta::days(i64::from(failure_retry_days)),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::from_days(DEFAULT_DURATION_DAYS, DEFAULT_FAILURE_RETRY_DAYS)
    }
}

/// One cache file record.
///
/// Either a success (metadata present, `failed == false`) or a failure
/// (no metadata, `failed == true`, reason set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub entry_key: String,
    pub entry_title: String,
    #[serde(with = "timestamp")]
    pub cached_at: DateTime<Utc>,
    pub metadata: Option<EnrichedMetadata>,
    #[serde(default)]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl CacheRecord {
    fn is_expired(&self, now: DateTime<Utc>, duration: TimeDelta) -> bool {
        now - self.cached_at > duration
    }
}

/// Counts reported by `bibfeed cache stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    /// Records younger than the cache duration (successes and failures)
    pub valid: usize,
    pub expired: usize,
    pub failed: usize,
}

/// Stable fingerprint of an entry's identifying content.
///
/// SHA-256 over title, comma-joined authors, year and DOI (missing fields
/// count as empty), truncated to 16 hex characters. Author order matters.
pub fn fingerprint(entry: &BibliographicEntry) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entry.title.as_deref().unwrap_or_default().as_bytes());
    hasher.update(entry.authors.join(",").as_bytes());
    hasher.update(entry.year.as_deref().unwrap_or_default().as_bytes());
    hasher.update(entry.doi.as_deref().unwrap_or_default().as_bytes());

    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// File-backed cache of enrichment outcomes
pub struct MetadataCache {
    path: PathBuf,
    settings: CacheSettings,
    records: HashMap<String, CacheRecord>,
}

impl MetadataCache {
    /// Open the cache at `path`, loading whatever is there.
    ///
    /// A missing file starts an empty cache. So does an unreadable or corrupt
    /// one (logged). Individual records that fail to decode are dropped.
    pub fn open(path: impl Into<PathBuf>, settings: CacheSettings) -> Self {
        let path = path.into();
        let records = load_records(&path);
        Self {
            path,
            settings,
            records,
        }
    }

    /// Default cache file location
    pub fn default_location() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("bibfeed").join("metadata_cache.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for an entry, expired or not.
    pub fn record(&self, entry: &BibliographicEntry) -> Option<&CacheRecord> {
        self.records.get(&fingerprint(entry))
    }

    /// Whether a fresh success record exists. Evicts an expired record.
    pub fn is_cached(&mut self, entry: &BibliographicEntry) -> bool {
        self.is_cached_at(entry, Utc::now())
    }

    /// Whether the entry should go through enrichment again.
    pub fn should_retry(&mut self, entry: &BibliographicEntry) -> bool {
        self.should_retry_at(entry, Utc::now())
    }

    /// Stored metadata, only while the record is a fresh success.
    pub fn get_metadata(&mut self, entry: &BibliographicEntry) -> Option<EnrichedMetadata> {
        self.get_metadata_at(entry, Utc::now())
    }

    /// Overwrite the entry's record with a success.
    pub fn store_success(&mut self, entry: &BibliographicEntry, metadata: EnrichedMetadata) {
        self.store_success_at(entry, metadata, Utc::now());
    }

    /// Overwrite the entry's record with a failure.
    pub fn store_failure(&mut self, entry: &BibliographicEntry, reason: impl Into<String>) {
        self.store_failure_at(entry, reason.into(), Utc::now());
    }

    /// Entries that [`should_retry`](Self::should_retry), in input order.
    pub fn retriable_entries<'a>(
        &mut self,
        entries: &'a [BibliographicEntry],
    ) -> Vec<&'a BibliographicEntry> {
        let now = Utc::now();
        let retriable: Vec<_> = entries
            .iter()
            .filter(|e| self.should_retry_at(e, now))
            .collect();
        info!(
            "{} of {} entries need enrichment",
            retriable.len(),
            entries.len()
        );
        retriable
    }

    /// Cached success metadata by citation key, for entries that have it.
    pub fn all_cached_metadata(
        &mut self,
        entries: &[BibliographicEntry],
    ) -> HashMap<String, EnrichedMetadata> {
        let now = Utc::now();
        entries
            .iter()
            .filter_map(|e| {
                self.get_metadata_at(e, now)
                    .map(|metadata| (e.key.clone(), metadata))
            })
            .collect()
    }

    /// Drop every expired record. Returns how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.cleanup_expired_at(Utc::now())
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(Utc::now())
    }

    /// Write every record to disk via a temp file and rename.
    pub fn save(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::CreateDir(parent.to_path_buf(), e))?;
        }

        // Sorted keys keep the file diff-friendly between runs
        let ordered: BTreeMap<&String, &CacheRecord> = self.records.iter().collect();
        let json = serde_json::to_string_pretty(&ordered)?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json).map_err(|e| CacheError::Write(temp_path.clone(), e))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| CacheError::Rename(self.path.clone(), e))?;

        info!(
            "Saved cache with {} records to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }

    fn is_cached_at(&mut self, entry: &BibliographicEntry, now: DateTime<Utc>) -> bool {
        let key = fingerprint(entry);
        let Some(record) = self.records.get(&key) else {
            return false;
        };

        if record.is_expired(now, self.settings.duration) {
            debug!("Cache expired for entry: {}", entry.key);
            self.records.remove(&key);
            return false;
        }

        !record.failed
    }

    fn should_retry_at(&mut self, entry: &BibliographicEntry, now: DateTime<Utc>) -> bool {
        if self.is_cached_at(entry, now) {
            return false;
        }

        match self.records.get(&fingerprint(entry)) {
            Some(record) if record.failed => {
                let last_failure = record.last_failure_at.unwrap_or(record.cached_at);
                now - last_failure > self.settings.failure_retry
            }
            _ => true,
        }
    }

    fn get_metadata_at(
        &mut self,
        entry: &BibliographicEntry,
        now: DateTime<Utc>,
    ) -> Option<EnrichedMetadata> {
        if !self.is_cached_at(entry, now) {
            return None;
        }
        self.records
            .get(&fingerprint(entry))
            .and_then(|r| r.metadata.clone())
    }

    fn store_success_at(
        &mut self,
        entry: &BibliographicEntry,
        metadata: EnrichedMetadata,
        now: DateTime<Utc>,
    ) {
        let record = CacheRecord {
            entry_key: entry.key.clone(),
            entry_title: entry.title.clone().unwrap_or_default(),
            cached_at: now,
            metadata: Some(metadata),
            failed: false,
            failure_reason: None,
            last_failure_at: None,
        };
        self.records.insert(fingerprint(entry), record);
        debug!("Cached metadata for entry: {}", entry.key);
    }

    fn store_failure_at(&mut self, entry: &BibliographicEntry, reason: String, now: DateTime<Utc>) {
        let record = CacheRecord {
            entry_key: entry.key.clone(),
            entry_title: entry.title.clone().unwrap_or_default(),
            cached_at: now,
            metadata: None,
            failed: true,
            failure_reason: Some(reason),
            last_failure_at: Some(now),
        };
        self.records.insert(fingerprint(entry), record);
        debug!("Cached failure for entry: {}", entry.key);
    }

    fn cleanup_expired_at(&mut self, now: DateTime<Utc>) -> usize {
        let duration = self.settings.duration;
        let before = self.records.len();
        self.records.retain(|_, r| !r.is_expired(now, duration));
        let removed = before - self.records.len();
        if removed > 0 {
            info!("Cleaned up {} expired cache records", removed);
        }
        removed
    }

    fn stats_at(&self, now: DateTime<Utc>) -> CacheStats {
        let expired = self
            .records
            .values()
            .filter(|r| r.is_expired(now, self.settings.duration))
            .count();
        CacheStats {
            total: self.records.len(),
            valid: self.records.len() - expired,
            expired,
            failed: self.records.values().filter(|r| r.failed).count(),
        }
    }
}

fn load_records(path: &Path) -> HashMap<String, CacheRecord> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No cache file at {}, starting empty", path.display());
            return HashMap::new();
        }
        Err(e) => {
            warn!("Failed to read cache {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    let raw: HashMap<String, serde_json::Value> = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Cache file {} is corrupt, starting empty: {}", path.display(), e);
            return HashMap::new();
        }
    };

    let mut records = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        match serde_json::from_value::<CacheRecord>(value) {
            Ok(record) => {
                records.insert(key, record);
            }
            Err(e) => warn!("Skipping unreadable cache record {}: {}", key, e),
        }
    }

    info!("Loaded cache with {} records", records.len());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::EnrichmentSource;
    use tempfile::TempDir;

    fn entry(key: &str, title: &str) -> BibliographicEntry {
        let mut entry = BibliographicEntry::new("article", key);
        entry.title = Some(title.to_string());
        entry.authors = vec!["Ada Lovelace".to_string(), "Charles Babbage".to_string()];
        entry.year = Some("1843".to_string());
        entry
    }

    fn metadata() -> EnrichedMetadata {
        let mut metadata = EnrichedMetadata::from_source(EnrichmentSource::Crossref);
        metadata.set_doi("10.1234/engine");
        metadata.abstract_text = Some("Notes on the analytical engine.".to_string());
        metadata.authors = vec!["Ada Lovelace".to_string()];
        metadata.citation_count = Some(42);
        metadata
    }

    fn open(dir: &TempDir) -> MetadataCache {
        MetadataCache::open(dir.path().join("cache.json"), CacheSettings::default())
    }

    #[test]
    fn test_fingerprint_is_stable_and_ignores_key() {
        let a = entry("a", "Sketch of the Analytical Engine");
        let b = entry("b", "Sketch of the Analytical Engine");
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 16);
        assert!(fingerprint(&a).chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_depends_on_author_order() {
        let a = entry("a", "Sketch of the Analytical Engine");
        let mut b = a.clone();
        b.authors.reverse();
        assert_ne!(fingerprint(&a), fingerprint(&b));

        let mut c = a.clone();
        c.doi = Some("10.1234/engine".to_string());
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn test_store_and_read_back() {
        let dir = TempDir::new().unwrap();
        let mut cache = open(&dir);
        let e = entry("lovelace", "Sketch of the Analytical Engine");

        assert!(!cache.is_cached(&e));
        assert!(cache.should_retry(&e));

        cache.store_success(&e, metadata());
        assert!(cache.is_cached(&e));
        assert!(!cache.should_retry(&e));
        assert_eq!(cache.get_metadata(&e), Some(metadata()));
    }

    #[test]
    fn test_expired_success_is_evicted() {
        let dir = TempDir::new().unwrap();
        let mut cache = open(&dir);
        let e = entry("lovelace", "Sketch of the Analytical Engine");
        let now = Utc::now();

        cache.store_success_at(&e, metadata(), now - TimeDelta::days(31));
        assert_eq!(cache.get_metadata_at(&e, now), None);
        assert!(cache.record(&e).is_none());
        assert!(cache.should_retry_at(&e, now));
    }

    #[test]
    fn test_success_at_exact_duration_is_still_cached() {
        let dir = TempDir::new().unwrap();
        let mut cache = open(&dir);
        let e = entry("lovelace", "Sketch of the Analytical Engine");
        let now = Utc::now();

        cache.store_success_at(&e, metadata(), now - TimeDelta::days(30));
        assert!(cache.is_cached_at(&e, now));
    }

    #[test]
    fn test_failure_retry_window() {
        let dir = TempDir::new().unwrap();
        let mut cache = open(&dir);
        let e = entry("lovelace", "Sketch of the Analytical Engine");
        let now = Utc::now();

        cache.store_failure_at(&e, "no source matched".to_string(), now - TimeDelta::days(1));
        assert!(!cache.is_cached_at(&e, now));
        assert!(!cache.should_retry_at(&e, now));
        assert_eq!(cache.get_metadata_at(&e, now), None);

        cache.store_failure_at(&e, "no source matched".to_string(), now - TimeDelta::days(8));
        assert!(cache.should_retry_at(&e, now));
    }

    #[test]
    fn test_success_replaces_failure() {
        let dir = TempDir::new().unwrap();
        let mut cache = open(&dir);
        let e = entry("lovelace", "Sketch of the Analytical Engine");

        cache.store_failure(&e, "timeout");
        cache.store_success(&e, metadata());
        let record = cache.record(&e).unwrap();
        assert!(!record.failed);
        assert_eq!(record.failure_reason, None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_retriable_entries() {
        let dir = TempDir::new().unwrap();
        let mut cache = open(&dir);
        let cached = entry("cached", "A Cached Paper About Engines");
        let failed = entry("failed", "A Recently Failed Paper");
        let fresh = entry("fresh", "A Paper Never Seen Before");

        cache.store_success(&cached, metadata());
        cache.store_failure(&failed, "no match");

        let entries = vec![cached, failed, fresh];
        let retriable = cache.retriable_entries(&entries);
        assert_eq!(retriable.len(), 1);
        assert_eq!(retriable[0].key, "fresh");

        let cached_map = cache.all_cached_metadata(&entries);
        assert_eq!(cached_map.len(), 1);
        assert!(cached_map.contains_key("cached"));
    }

    #[test]
    fn test_cleanup_and_stats() {
        let dir = TempDir::new().unwrap();
        let mut cache = open(&dir);
        let now = Utc::now();

        cache.store_success_at(&entry("old", "An Old Paper On Engines"), metadata(), now - TimeDelta::days(40));
        cache.store_success_at(&entry("new", "A New Paper On Engines"), metadata(), now);
        cache.store_failure_at(&entry("bad", "A Paper Nobody Knows"), "no match".to_string(), now);

        let stats = cache.stats_at(now);
        assert_eq!(
            stats,
            CacheStats {
                total: 3,
                valid: 2,
                expired: 1,
                failed: 1
            }
        );

        assert_eq!(cache.cleanup_expired_at(now), 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.cleanup_expired_at(now), 0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let e = entry("lovelace", "Sketch of the Analytical Engine");
        let f = entry("babbage", "On the Economy of Machinery");

        let mut cache = MetadataCache::open(&path, CacheSettings::default());
        cache.store_success(&e, metadata());
        cache.store_failure(&f, "no source matched");
        cache.save().unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let mut reloaded = MetadataCache::open(&path, CacheSettings::default());
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get_metadata(&e), Some(metadata()));
        let failure = reloaded.record(&f).unwrap();
        assert!(failure.failed);
        assert_eq!(failure.failure_reason.as_deref(), Some("no source matched"));
        assert!(failure.last_failure_at.is_some());
    }

    #[test]
    fn test_save_keeps_records_from_earlier_runs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let earlier = entry("lovelace", "Sketch of the Analytical Engine");
        let current = entry("babbage", "On the Economy of Machinery");

        let mut first_run = MetadataCache::open(&path, CacheSettings::default());
        first_run.store_success(&earlier, metadata());
        first_run.save().unwrap();

        // The second run never looks at the earlier entry
        let mut second_run = MetadataCache::open(&path, CacheSettings::default());
        second_run.store_failure(&current, "no source matched");
        second_run.save().unwrap();

        let mut reloaded = MetadataCache::open(&path, CacheSettings::default());
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get_metadata(&earlier), Some(metadata()));
        assert!(reloaded.record(&current).is_some_and(|r| r.failed));
    }

    #[test]
    fn test_missing_and_corrupt_files_start_empty() {
        let dir = TempDir::new().unwrap();
        let cache = MetadataCache::open(dir.path().join("absent.json"), CacheSettings::default());
        assert!(cache.is_empty());

        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cache = MetadataCache::open(&path, CacheSettings::default());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_legacy_records_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let now = Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f");
        let json = format!(
            r#"{{
              "aaaaaaaaaaaaaaaa": {{
                "entry_key": "old",
                "entry_title": "Legacy Paper",
                "cached_at": "{now}",
                "metadata": {{"doi": "10.1/x", "source": "datasociety"}}
              }},
              "bbbbbbbbbbbbbbbb": {{"entry_key": "broken"}}
            }}"#
        );
        std::fs::write(&path, json).unwrap();

        let cache = MetadataCache::open(&path, CacheSettings::default());
        assert_eq!(cache.len(), 1);
        let record = cache.records.get("aaaaaaaaaaaaaaaa").unwrap();
        assert!(!record.failed);
        assert_eq!(
            record.metadata.as_ref().unwrap().source,
            Some(EnrichmentSource::Institutional)
        );
        assert_eq!(cache.stats().valid, 1);
    }
}
