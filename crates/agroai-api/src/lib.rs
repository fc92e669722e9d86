//! Async client for the AgroAI greenhouse backend.
//!
//! [`ApiClient`] is the transport: it joins paths onto the configured base
//! URL, attaches the bearer token held by a shared [`Session`], and maps
//! failures into [`Error`]. Endpoint methods live in [`auth`], [`chat`],
//! [`greenhouses`], and [`plants`] as inherent methods on the client.
//!
//! Every consumer reads sensor values through [`parse_stat`].

pub mod auth;
pub mod chat;
pub mod client;
pub mod error;
pub mod greenhouses;
pub mod models;
pub mod plants;
pub mod session;
pub mod stats;
pub mod transport;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::{Error, GENERIC_FAILURE, detail_or_generic, extract_detail};
pub use models::{
    ChatHistoryItem, ChatReply, ChatRequest, ChatRole, CreateGreenhouse, CreatePlant, Greenhouse,
    GreenhouseSettings, LoginResponse, Plant, RegisterRequest, StatsBag, SwitchAck,
    UpdateGreenhouse, UpdatePlant, UpdateProfile, User,
};
pub use plants::{FALLBACK_PLANT_TYPES, fallback_plant_types};
pub use session::{MemorySessionStore, Session, SessionState, SessionStore, StoredSession};
pub use stats::{PLACEHOLDER, parse_stat, parse_stat_str};
pub use transport::{DEFAULT_TIMEOUT, TlsMode, TransportConfig};
