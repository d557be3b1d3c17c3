//! Shared daemon state.
//!
//! One [`AppState`] is built at startup and shared across all request
//! handlers through an `Arc`. The endpoint has no state of its own; every
//! record lives in the registry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use spawnport_core::auth::{Authenticator, tokens_match};
use spawnport_core::registry::{InMemoryPortRegistry, PortConfigurable, PortRegistry};

/// Shared daemon state handed to every handler.
pub type SharedState = Arc<AppState>;

/// Daemon state: the registry, the authenticator, and the operator token.
pub struct AppState {
    /// Registry read side, used by the operator lookup and removal routes.
    registry: Arc<dyn PortRegistry>,
    /// Registry write capability for the registration endpoint.
    ///
    /// Resolved once here, at construction, so the endpoint holds a direct
    /// handle instead of discovering its target per request.
    port_sink: Arc<dyn PortConfigurable>,
    /// Authenticator for session-scoped requests.
    authenticator: Arc<dyn Authenticator>,
    /// Bearer token gating the operator-scoped routes.
    operator_token: String,
    /// Time when the daemon started.
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates daemon state over an in-memory registry.
    #[must_use]
    pub fn new(
        registry: Arc<InMemoryPortRegistry>,
        authenticator: Arc<dyn Authenticator>,
        operator_token: String,
    ) -> Self {
        Self {
            port_sink: Arc::clone(&registry) as Arc<dyn PortConfigurable>,
            registry,
            authenticator,
            operator_token,
            started_at: Utc::now(),
        }
    }

    /// Returns the registry read side.
    #[must_use]
    pub fn registry(&self) -> &dyn PortRegistry {
        self.registry.as_ref()
    }

    /// Returns the registration endpoint's port sink.
    #[must_use]
    pub fn port_sink(&self) -> &dyn PortConfigurable {
        self.port_sink.as_ref()
    }

    /// Returns the session authenticator.
    #[must_use]
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Checks a presented token against the operator token (constant-time).
    #[must_use]
    pub fn operator_token_matches(&self, presented: &str) -> bool {
        tokens_match(&self.operator_token, presented)
    }

    /// Get daemon uptime in seconds.
    #[must_use]
    #[allow(clippy::cast_sign_loss)] // max(0) ensures non-negative
    pub fn uptime_secs(&self) -> u64 {
        let now = Utc::now();
        (now - self.started_at).num_seconds().max(0) as u64
    }
}
