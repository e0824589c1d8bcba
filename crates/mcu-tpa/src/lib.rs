//! Teleport-request (TPA) lifecycle: pending requests between players,
//! per-sender cooldowns, and expiry of unanswered requests.
//!
//! All state lives in a [`TpaManager`] owned by the plugin. Host capabilities
//! (presence, scheduling, chat, teleporting) are reached through [`TpaHost`],
//! passed in on every call.

pub mod clock;
pub mod cooldown;
pub mod error;
pub mod host;
pub mod manager;
pub mod request;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use cooldown::CooldownTracker;
pub use error::TpaError;
pub use host::{TpaHost, TpaNotice};
pub use manager::{TpaConfig, TpaManager};
pub use request::{RequestId, TpaRequest};
pub use store::RequestStore;
