//! Greenhouse state synchronization for AgroAI clients.
//!
//! [`Controller`] keeps a [`QueryStore`] of server resources in sync with
//! the backend: watched keys are polled and refetched on invalidation,
//! and every write goes through an [`OptimisticMutation`] that patches the
//! cache up front and rolls back if the backend refuses.
//!
//! [`GreenhouseView`] turns a cached greenhouse into display-ready sensor
//! readings and device states.

pub mod chat;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod model;
pub mod mutation;
pub mod store;
pub mod stream;
mod sync;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use chat::{CHAT_FALLBACK, CHAT_WELCOME, ChatMessage, ChatSender, ChatTranscript};
pub use config::SyncConfig;
pub use controller::{CHAT_FAILURE, Controller};
pub use error::CoreError;
pub use event::{Notification, NotificationLevel, Route};
pub use model::{
    DeviceKind, DeviceStatus, DeviceView, OFFLINE_PLACEHOLDER, SensorKind, SensorReading,
    SensorStatus,
};
pub use mutation::{MutationPhase, MutationPlan, OptimisticMutation, Reconcile};
pub use store::{CacheEntry, FetchTicket, MutationLease, QueryKey, QueryStore, QueryValue};
pub use stream::QueryStream;
pub use view::GreenhouseView;

// Wire types callers need alongside the controller.
pub use agroai_api::{
    CreatePlant, Greenhouse, GreenhouseSettings, Plant, RegisterRequest, Session, SessionState,
    UpdatePlant, UpdateProfile, User,
};
