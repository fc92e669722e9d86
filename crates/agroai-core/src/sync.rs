// ── Per-key sync tasks ──
//
// One task per watched key. It fetches once on start, then again on every
// poll tick (list and detail keys only) and every invalidation. A tick
// that lands while a mutation lease holds the key is skipped, and so is
// every attempt once the session has expired.

use std::future;

use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use agroai_api::SessionState;

use crate::controller::Controller;
use crate::store::QueryKey;

pub(crate) async fn sync_task(controller: Controller, key: QueryKey, cancel: CancellationToken) {
    let wake = controller.store().wake_handle(&key);
    let mut interval = controller.poll_interval(key).map(|period| {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    debug!(%key, poll = ?controller.poll_interval(key), "sync task started");

    sync_once(&controller, key, &cancel).await;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = wake.notified() => trace!(%key, "woken by invalidation"),
            () = next_tick(interval.as_mut()) => trace!(%key, "poll tick"),
        }
        sync_once(&controller, key, &cancel).await;
    }
    debug!(%key, "sync task stopped");
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

/// One fetch attempt, abandoned if a mutation or shutdown cancels it.
pub(crate) async fn sync_once(controller: &Controller, key: QueryKey, cancel: &CancellationToken) {
    if controller.session().state() == SessionState::Expired {
        trace!(%key, "session expired, skipping refetch");
        return;
    }
    let store = controller.store();
    let Some(ticket) = store.begin_fetch(&key) else {
        debug!(%key, "mutation pending, skipping refetch");
        return;
    };

    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        () = ticket.cancelled() => {
            debug!(%key, "in-flight fetch cancelled");
            return;
        }
        result = controller.load(key) => result,
    };

    match result {
        Ok(value) => {
            store.complete_fetch(&ticket, Ok(value));
        }
        Err(e) => {
            warn!(%key, error = %e, "refresh failed");
            store.complete_fetch(&ticket, Err(e.user_message()));
        }
    }
}
