//! spawnport-daemon library crate.
//!
//! The binary in `main.rs` is glue: CLI parsing, config loading, and server
//! startup. Everything testable lives here:
//!
//! - [`state`]: shared daemon state handed to every handler
//! - [`handlers`]: the axum router and request handlers
//! - [`error`]: the API error type and its HTTP mapping

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use handlers::router;
pub use state::{AppState, SharedState};
