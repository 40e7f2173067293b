// Application layer - use cases and orchestration.
// LedgerService is the only entry point transports should call; the other
// services are exposed for composition and testing.

mod auth;
mod clock;
mod config;
pub mod error;
mod ledger_store;
mod password;
mod payloads;
mod reporting;
mod service;

pub use auth::*;
pub use clock::{ManualClock, SharedClock, system_clock};
pub use config::*;
pub use error::*;
pub use ledger_store::*;
pub use password::*;
pub use payloads::*;
pub use reporting::*;
pub use service::*;
