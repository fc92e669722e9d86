// ── Optimistic mutations ──
//
// A mutation takes a lease on the keys it touches (cancelling in-flight
// fetches), snapshots them, applies its patch, and on settle either keeps
// the patch or restores the snapshots. Invalidation of the affected keys
// happens after the lease is released so the refetch is not refused.
// A mutation cut short by a session expiry is abandoned instead: the
// expiry teardown owns the cache from then on.

use std::sync::Arc;

use tracing::debug;

use crate::error::CoreError;
use crate::store::{CacheEntry, MutationLease, QueryKey, QueryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    Idle,
    Pending,
    SettledSuccess,
    SettledError,
    /// Released without rollback or invalidation.
    Abandoned,
}

/// What to do with the invalidation keys once the mutation settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reconcile {
    /// Invalidate on success and on error.
    #[default]
    InvalidateOnSettle,
    /// Invalidate only on error. Used where the backend is known to
    /// answer reads with stale data right after the write.
    SkipOnSuccess,
}

/// Keys a mutation touches and how it reconciles.
#[derive(Debug, Clone, Default)]
pub struct MutationPlan {
    touched: Vec<QueryKey>,
    invalidate: Vec<QueryKey>,
    reconcile: Reconcile,
}

impl MutationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `key` before applying and roll it back on error.
    pub fn touch(mut self, key: QueryKey) -> Self {
        if !self.touched.contains(&key) {
            self.touched.push(key);
        }
        self
    }

    /// Invalidate `key` on settle (subject to [`Reconcile`]).
    pub fn invalidate(mut self, key: QueryKey) -> Self {
        if !self.invalidate.contains(&key) {
            self.invalidate.push(key);
        }
        self
    }

    pub fn reconcile(mut self, reconcile: Reconcile) -> Self {
        self.reconcile = reconcile;
        self
    }

    pub fn touched(&self) -> &[QueryKey] {
        &self.touched
    }
}

/// One optimistic write in flight.
///
/// Dropping a pending mutation (e.g. its future was cancelled) rolls it
/// back and invalidates the touched keys.
pub struct OptimisticMutation {
    store: Arc<QueryStore>,
    plan: MutationPlan,
    phase: MutationPhase,
    snapshots: Vec<(QueryKey, CacheEntry)>,
    lease: Option<MutationLease>,
}

impl OptimisticMutation {
    pub fn new(store: Arc<QueryStore>, plan: MutationPlan) -> Self {
        Self {
            store,
            plan,
            phase: MutationPhase::Idle,
            snapshots: Vec::new(),
            lease: None,
        }
    }

    pub fn phase(&self) -> MutationPhase {
        self.phase
    }

    /// Lease and snapshot the touched keys, then apply the local patch.
    pub fn begin(&mut self, apply: impl FnOnce(&QueryStore)) {
        if self.phase != MutationPhase::Idle {
            return;
        }
        self.lease = Some(self.store.lease(&self.plan.touched));
        self.snapshots = self
            .plan
            .touched
            .iter()
            .map(|k| (*k, self.store.snapshot(k)))
            .collect();
        apply(&self.store);
        self.phase = MutationPhase::Pending;
        debug!(keys = ?self.plan.touched, "mutation pending");
    }

    /// Finish the mutation with the outcome of the remote call.
    pub fn settle(mut self, success: bool) -> MutationPhase {
        if self.phase != MutationPhase::Pending {
            return self.phase;
        }
        if !success {
            self.rollback();
        }
        self.lease = None;
        self.phase = if success {
            MutationPhase::SettledSuccess
        } else {
            MutationPhase::SettledError
        };

        let skip = success && self.plan.reconcile == Reconcile::SkipOnSuccess;
        if skip {
            debug!(keys = ?self.plan.invalidate, "mutation settled, keeping optimistic value");
        } else {
            for key in &self.plan.invalidate {
                self.store.invalidate(key);
            }
        }
        self.phase
    }

    /// Settle from the remote call's result, abandoning on session expiry.
    pub fn settle_with<T>(self, result: &Result<T, CoreError>) -> MutationPhase {
        match result {
            Err(e) if e.is_session_expired() => self.abandon(),
            _ => self.settle(result.is_ok()),
        }
    }

    /// Release the lease and leave the cache as it is.
    pub fn abandon(mut self) -> MutationPhase {
        if self.phase != MutationPhase::Pending {
            return self.phase;
        }
        self.snapshots.clear();
        self.lease = None;
        self.phase = MutationPhase::Abandoned;
        debug!(keys = ?self.plan.touched, "mutation abandoned");
        self.phase
    }

    fn rollback(&mut self) {
        for (key, entry) in self.snapshots.drain(..) {
            self.store.restore(&key, entry);
        }
    }
}

impl Drop for OptimisticMutation {
    fn drop(&mut self) {
        if self.phase == MutationPhase::Pending {
            debug!(keys = ?self.plan.touched, "pending mutation dropped, rolling back");
            self.rollback();
            self.lease = None;
            for key in &self.plan.touched {
                self.store.invalidate(key);
            }
        }
    }
}
