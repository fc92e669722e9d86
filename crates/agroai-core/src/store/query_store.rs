use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Notify, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{CacheEntry, FetchTicket, MutationLease, QueryKey, QueryValue};
use crate::stream::QueryStream;

/// Fetch bookkeeping for one key.
#[derive(Debug, Default)]
struct FetchControl {
    /// Outstanding mutation leases.
    leases: usize,
    /// Bumped whenever a previously issued ticket must stop counting.
    generation: u64,
    inflight: Option<CancellationToken>,
}

impl FetchControl {
    fn supersede(&mut self) {
        self.generation += 1;
        if let Some(token) = self.inflight.take() {
            token.cancel();
        }
    }
}

pub(super) struct Slot {
    pub(super) key: QueryKey,
    entry: watch::Sender<CacheEntry>,
    /// Wakes the key's sync task on invalidation.
    wake: Arc<Notify>,
    control: Mutex<FetchControl>,
}

impl Slot {
    fn new(key: QueryKey) -> Self {
        Self {
            key,
            entry: watch::Sender::new(CacheEntry::default()),
            wake: Arc::new(Notify::new()),
            control: Mutex::new(FetchControl::default()),
        }
    }

    fn control(&self) -> MutexGuard<'_, FetchControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) {
        {
            let mut ctl = self.control();
            ctl.leases += 1;
            ctl.supersede();
        }
        self.entry.send_if_modified(|e| std::mem::replace(&mut e.fetching, false));
    }

    pub(super) fn release(&self) {
        let mut ctl = self.control();
        ctl.leases = ctl.leases.saturating_sub(1);
    }
}

/// Keyed, observable cache of server resources.
///
/// Each key owns a `watch` channel carrying its [`CacheEntry`]; every
/// change is pushed to subscribers. Entries are never removed from the
/// map, only emptied, so a subscription outlives a `remove` or `clear`.
#[derive(Default)]
pub struct QueryStore {
    slots: DashMap<QueryKey, Arc<Slot>>,
}

impl QueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &QueryKey) -> Arc<Slot> {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(
            self.slots
                .entry(*key)
                .or_insert_with(|| Arc::new(Slot::new(*key)))
                .value(),
        )
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current entry for `key` (empty if never loaded).
    pub fn get(&self, key: &QueryKey) -> CacheEntry {
        self.slots
            .get(key)
            .map(|slot| slot.entry.borrow().clone())
            .unwrap_or_default()
    }

    pub fn value(&self, key: &QueryKey) -> Option<QueryValue> {
        self.get(key).value
    }

    /// Subscribe to changes of `key`.
    pub fn subscribe(&self, key: &QueryKey) -> QueryStream {
        QueryStream::new(*key, self.slot(key).entry.subscribe())
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        self.slots.iter().map(|r| *r.key()).collect()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Apply a local (optimistic) change to `key`'s value.
    ///
    /// The entry is marked optimistic; `confirmed_at` is left alone.
    pub fn set(&self, key: &QueryKey, update: impl FnOnce(&mut Option<QueryValue>)) {
        self.slot(key).entry.send_modify(|e| {
            update(&mut e.value);
            e.optimistic = true;
        });
        trace!(%key, "optimistic write");
    }

    /// Mark `key` stale and wake its sync task.
    pub fn invalidate(&self, key: &QueryKey) {
        let slot = self.slot(key);
        slot.entry.send_if_modified(|e| !std::mem::replace(&mut e.stale, true));
        slot.wake.notify_one();
        debug!(%key, "invalidated");
    }

    /// Full copy of `key`'s entry, for rollback.
    pub fn snapshot(&self, key: &QueryKey) -> CacheEntry {
        self.get(key)
    }

    /// Put back an entry taken with [`snapshot`](Self::snapshot).
    pub fn restore(&self, key: &QueryKey, mut entry: CacheEntry) {
        entry.fetching = false;
        self.slot(key).entry.send_replace(entry);
        debug!(%key, "restored snapshot");
    }

    /// Drop `key`'s value. Subscribers stay attached.
    pub fn remove(&self, key: &QueryKey) {
        if let Some(slot) = self.slots.get(key) {
            slot.control().supersede();
            slot.entry.send_replace(CacheEntry::default());
        }
    }

    /// Empty every entry and abandon every in-flight fetch.
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.control().supersede();
            slot.entry.send_replace(CacheEntry::default());
        }
        debug!("store cleared");
    }

    // ── Fetch coordination ───────────────────────────────────────────

    /// Start a fetch for `key`.
    ///
    /// Returns `None` while a mutation lease holds the key. Otherwise any
    /// older in-flight fetch is cancelled and a fresh ticket issued.
    pub fn begin_fetch(&self, key: &QueryKey) -> Option<FetchTicket> {
        let slot = self.slot(key);
        let ticket = {
            let mut ctl = slot.control();
            if ctl.leases > 0 {
                return None;
            }
            ctl.supersede();
            let cancel = CancellationToken::new();
            ctl.inflight = Some(cancel.clone());
            FetchTicket {
                key: *key,
                generation: ctl.generation,
                cancel,
            }
        };
        slot.entry.send_if_modified(|e| !std::mem::replace(&mut e.fetching, true));
        Some(ticket)
    }

    /// Apply a fetch result if `ticket` is still current.
    ///
    /// A success replaces the value and marks it confirmed. A failure
    /// records the message and keeps the last known value. Returns whether
    /// the result was applied.
    pub fn complete_fetch(&self, ticket: &FetchTicket, result: Result<QueryValue, String>) -> bool {
        let slot = self.slot(&ticket.key);
        {
            let mut ctl = slot.control();
            if ctl.generation != ticket.generation || ctl.leases > 0 || ticket.is_cancelled() {
                debug!(key = %ticket.key, "discarding superseded fetch result");
                return false;
            }
            ctl.inflight = None;
        }
        slot.entry.send_modify(|e| {
            e.fetching = false;
            match result {
                Ok(value) => {
                    e.value = Some(value);
                    e.error = None;
                    e.confirmed_at = Some(Utc::now());
                    e.optimistic = false;
                    e.stale = false;
                }
                Err(message) => e.error = Some(message),
            }
        });
        true
    }

    /// Hold background fetches off `keys` until the lease is dropped.
    pub fn lease(&self, keys: &[QueryKey]) -> MutationLease {
        let slots: Vec<Arc<Slot>> = keys.iter().map(|k| self.slot(k)).collect();
        for slot in &slots {
            slot.acquire();
        }
        MutationLease { slots }
    }

    pub fn is_leased(&self, key: &QueryKey) -> bool {
        self.slots.get(key).is_some_and(|s| s.control().leases > 0)
    }

    /// Handle used by a sync task to wait for invalidations of `key`.
    pub(crate) fn wake_handle(&self, key: &QueryKey) -> Arc<Notify> {
        Arc::clone(&self.slot(key).wake)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agroai_api::User;
    use tokio_test::{assert_pending, assert_ready, task};

    use super::*;

    fn types(names: &[&str]) -> QueryValue {
        QueryValue::PlantTypes(names.iter().map(|&s| s.to_owned()).collect())
    }

    #[test]
    fn fetch_result_is_confirmed() {
        let store = QueryStore::new();
        let key = QueryKey::PlantTypes(1);

        let ticket = store.begin_fetch(&key).unwrap();
        assert!(store.get(&key).fetching);
        assert!(store.complete_fetch(&ticket, Ok(types(&["tomato"]))));

        let entry = store.get(&key);
        assert!(!entry.fetching);
        assert!(!entry.optimistic);
        assert!(entry.confirmed_at.is_some());
        assert_eq!(entry.plant_types().unwrap(), ["tomato".to_owned()]);
    }

    #[test]
    fn newer_fetch_supersedes_older() {
        let store = QueryStore::new();
        let key = QueryKey::Greenhouses;

        let first = store.begin_fetch(&key).unwrap();
        let second = store.begin_fetch(&key).unwrap();
        assert!(first.is_cancelled());
        assert!(!store.complete_fetch(&first, Ok(QueryValue::Greenhouses(Vec::new()))));
        assert!(store.complete_fetch(&second, Ok(QueryValue::Greenhouses(Vec::new()))));
    }

    #[test]
    fn lease_blocks_and_cancels_fetches() {
        let store = QueryStore::new();
        let key = QueryKey::Greenhouse(1);

        let inflight = store.begin_fetch(&key).unwrap();
        let lease = store.lease(&[key]);
        assert!(inflight.is_cancelled());
        assert!(!store.get(&key).fetching);
        assert!(store.begin_fetch(&key).is_none());
        assert!(!store.complete_fetch(&inflight, Ok(types(&[]))));

        drop(lease);
        assert!(!store.is_leased(&key));
        assert!(store.begin_fetch(&key).is_some());
    }

    #[test]
    fn set_keeps_confirmation_marker() {
        let store = QueryStore::new();
        let key = QueryKey::PlantTypes(2);
        let ticket = store.begin_fetch(&key).unwrap();
        store.complete_fetch(&ticket, Ok(types(&["tomato"])));
        let confirmed = store.get(&key).confirmed_at;

        store.set(&key, |v| *v = Some(types(&["tomato", "basil"])));

        let entry = store.get(&key);
        assert!(entry.optimistic);
        assert_eq!(entry.confirmed_at, confirmed);
        assert_eq!(entry.plant_types().unwrap().len(), 2);
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let store = QueryStore::new();
        let key = QueryKey::WhoAmI;
        let before = store.snapshot(&key);
        store.set(&key, |v| {
            *v = Some(QueryValue::User(User {
                id: 1,
                email: "a@b.c".into(),
                first_name: String::new(),
                last_name: String::new(),
                is_active: true,
            }));
        });
        store.restore(&key, before.clone());
        assert_eq!(store.get(&key), before);
    }

    #[test]
    fn failed_fetch_keeps_last_value() {
        let store = QueryStore::new();
        let key = QueryKey::PlantTypes(3);
        let ok = store.begin_fetch(&key).unwrap();
        store.complete_fetch(&ok, Ok(types(&["pepper"])));

        let failed = store.begin_fetch(&key).unwrap();
        store.complete_fetch(&failed, Err("Connection problem. Please try again.".into()));

        let entry = store.get(&key);
        assert_eq!(entry.plant_types().unwrap(), ["pepper".to_owned()]);
        assert!(entry.error.is_some());
    }

    #[test]
    fn clear_abandons_inflight_and_empties() {
        let store = QueryStore::new();
        let key = QueryKey::Greenhouses;
        let ticket = store.begin_fetch(&key).unwrap();
        store.set(&key, |v| *v = Some(QueryValue::Greenhouses(Vec::new())));

        store.clear();
        assert!(ticket.is_cancelled());
        assert_eq!(store.get(&key), CacheEntry::default());
    }

    #[test]
    fn invalidate_wakes_subscribers_and_sync_task() {
        let store = QueryStore::new();
        let key = QueryKey::Plants(5);
        let mut stream = store.subscribe(&key);
        let wake = store.wake_handle(&key);

        let mut changed = task::spawn(stream.changed());
        assert_pending!(changed.poll());

        store.invalidate(&key);
        assert!(changed.is_woken());
        let entry = assert_ready!(changed.poll()).unwrap();
        assert!(entry.stale);

        // The permit is stored even though nobody was waiting yet.
        let mut notified = task::spawn(wake.notified());
        assert_ready!(notified.poll());
    }
}
