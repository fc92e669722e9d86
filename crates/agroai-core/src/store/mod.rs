// ── Synchronized query store ──
//
// Keyed cache of server resources with push-based change notification,
// fetch de-duplication, and mutation leases that hold background fetches
// off a key while an optimistic write is outstanding.

mod key;
mod lease;
mod query_store;

pub use key::{CacheEntry, QueryKey, QueryValue};
pub use lease::{FetchTicket, MutationLease};
pub use query_store::QueryStore;
