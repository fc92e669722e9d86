// ── Fetch tickets and mutation leases ──

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::QueryKey;
use super::query_store::Slot;

/// Permission to run one fetch for a key.
///
/// A ticket is superseded by a newer fetch, a mutation lease, or a store
/// clear. The in-flight request should be abandoned once
/// [`cancelled`](Self::cancelled) resolves; [`QueryStore::complete_fetch`]
/// rejects results from a superseded ticket regardless.
///
/// [`QueryStore::complete_fetch`]: super::QueryStore::complete_fetch
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub(super) key: QueryKey,
    pub(super) generation: u64,
    pub(super) cancel: CancellationToken,
}

impl FetchTicket {
    pub fn key(&self) -> QueryKey {
        self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}

/// Holds background fetches off a set of keys until dropped.
///
/// Taking a lease cancels any in-flight fetch on its keys; while any lease
/// on a key is alive, [`QueryStore::begin_fetch`] refuses that key.
///
/// [`QueryStore::begin_fetch`]: super::QueryStore::begin_fetch
#[must_use = "dropping the lease releases the keys immediately"]
pub struct MutationLease {
    pub(super) slots: Vec<Arc<Slot>>,
}

impl MutationLease {
    pub fn keys(&self) -> impl Iterator<Item = QueryKey> + '_ {
        self.slots.iter().map(|s| s.key)
    }
}

impl std::fmt::Debug for MutationLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

impl Drop for MutationLease {
    fn drop(&mut self) {
        for slot in &self.slots {
            slot.release();
        }
    }
}
