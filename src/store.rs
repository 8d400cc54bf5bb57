//! In-memory store of ingested repositories.
//!
//! Entries expire after a TTL and the store holds at most `max_entries`
//! repositories. There is no background sweeper: expired entries are dropped
//! lazily when read, and a full eviction pass runs on every save.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::models::{FileChunk, RepoSummary};

/// Time source for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.0.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

/// Storage seam used by the pipeline and the answering engine.
pub trait RepoStore: Send + Sync {
    /// Insert or overwrite an entry stamped with the current time.
    fn save(&self, id: Uuid, name: &str, chunks: Vec<FileChunk>, summary: RepoSummary);
    /// Chunk pool for a live entry; `None` if absent or expired.
    fn get_chunks(&self, id: &Uuid) -> Option<Arc<Vec<FileChunk>>>;
    /// Summary for a live entry; `None` if absent or expired.
    fn get_summary(&self, id: &Uuid) -> Option<Arc<RepoSummary>>;
    /// Drop expired entries, then the oldest ones beyond capacity.
    fn evict(&self);
    /// Entries currently held, expired or not.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.get_chunks(id).is_some()
    }
}

/// One stored repository. Never updated in place, only replaced or removed.
#[derive(Debug, Clone)]
pub struct StoredRepo {
    pub id: Uuid,
    pub name: String,
    pub chunks: Arc<Vec<FileChunk>>,
    pub summary: Arc<RepoSummary>,
    pub stored_at: DateTime<Utc>,
    seq: u64,
}

/// `RepoStore` backed by a locked `HashMap`.
pub struct MemoryStore {
    entries: RwLock<HashMap<Uuid, StoredRepo>>,
    next_seq: Mutex<u64>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    max_entries: usize,
}

impl MemoryStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_seq: Mutex::new(0),
            clock,
            ttl: chrono::Duration::seconds(config.ttl_secs as i64),
            max_entries: config.max_entries.max(1),
        }
    }

    /// Name of a live entry.
    pub fn name_of(&self, id: &Uuid) -> Option<String> {
        self.lookup(id, |entry| entry.name.clone())
    }

    fn is_expired(&self, entry: &StoredRepo, now: DateTime<Utc>) -> bool {
        now - entry.stored_at > self.ttl
    }

    fn lookup<T>(&self, id: &Uuid, read: impl Fn(&StoredRepo) -> T) -> Option<T> {
        let now = self.clock.now();
        {
            let entries = self.entries.read();
            match entries.get(id) {
                None => return None,
                Some(entry) if !self.is_expired(entry, now) => return Some(read(entry)),
                Some(_) => {}
            }
        }

        // Expired: retake as writer and drop it unless a fresh save raced in
        let mut entries = self.entries.write();
        match entries.get(id) {
            Some(entry) if self.is_expired(entry, now) => {
                entries.remove(id);
                tracing::debug!("Expired repo {id} removed on read");
                None
            }
            Some(entry) => Some(read(entry)),
            None => None,
        }
    }

    /// Eviction pass over an already-locked map. `reserve` slots are kept free
    /// for an entry about to be inserted.
    fn evict_locked(&self, entries: &mut HashMap<Uuid, StoredRepo>, reserve: usize) {
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let expired = before - entries.len();

        let cap = self.max_entries.saturating_sub(reserve);
        let mut evicted = 0;
        if entries.len() > cap {
            let mut by_age: Vec<(DateTime<Utc>, u64, Uuid)> = entries
                .values()
                .map(|e| (e.stored_at, e.seq, e.id))
                .collect();
            by_age.sort();
            let excess = entries.len() - cap;
            for (_, _, id) in by_age.into_iter().take(excess) {
                entries.remove(&id);
                evicted += 1;
            }
        }

        if expired > 0 || evicted > 0 {
            tracing::info!(
                "Store eviction: {expired} expired, {evicted} over capacity, {} remaining",
                entries.len()
            );
        }
    }
}

impl RepoStore for MemoryStore {
    fn save(&self, id: Uuid, name: &str, chunks: Vec<FileChunk>, summary: RepoSummary) {
        let seq = {
            let mut next = self.next_seq.lock();
            *next += 1;
            *next
        };

        let mut entries = self.entries.write();
        let reserve = usize::from(!entries.contains_key(&id));
        self.evict_locked(&mut entries, reserve);
        entries.insert(
            id,
            StoredRepo {
                id,
                name: name.to_string(),
                chunks: Arc::new(chunks),
                summary: Arc::new(summary),
                stored_at: self.clock.now(),
                seq,
            },
        );
    }

    fn get_chunks(&self, id: &Uuid) -> Option<Arc<Vec<FileChunk>>> {
        self.lookup(id, |entry| Arc::clone(&entry.chunks))
    }

    fn get_summary(&self, id: &Uuid) -> Option<Arc<RepoSummary>> {
        self.lookup(id, |entry| Arc::clone(&entry.summary))
    }

    fn evict(&self) {
        let mut entries = self.entries.write();
        self.evict_locked(&mut entries, 0);
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
