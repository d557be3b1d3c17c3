//! Session port registry.
//!
//! Authoritative in-memory store mapping a session identifier to the network
//! port its spawned workload reported. The registry is the sole owner of
//! session records: callers get clones from [`PortRegistry::get`] and can
//! only mutate through [`PortRegistry::set`] / [`PortRegistry::remove`].
//!
//! # Thread Safety
//!
//! The shipped implementation wraps the map in a single `RwLock`, which is
//! required because axum handlers may run concurrently. Sessions are
//! independent, so a coarse lock is sufficient at the expected write rate
//! (one registration per session spawn).
//!
//! # Invariants
//!
//! - At most one record exists per session id.
//! - A stored port is always in 1–65535; a rejected `set` never mutates
//!   existing state.
//! - Eviction is driven externally by the session-lifecycle collaborator via
//!   [`PortRegistry::remove`]; records never expire on their own.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Lowest port a workload can report.
pub const MIN_PORT: i64 = 1;

/// Highest port a workload can report.
pub const MAX_PORT: i64 = 65535;

/// One active session's registered network endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque session identifier, supplied by the authenticator.
    pub session_id: String,
    /// Port the session's workload is listening on.
    pub port: u16,
    /// Time of the last successful registration for this session.
    pub updated_at: DateTime<Utc>,
}

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The submitted port is outside the valid range.
    #[error("port {port} is outside the valid range {MIN_PORT}-{MAX_PORT}")]
    InvalidPort {
        /// The rejected port value.
        port: i64,
    },

    /// The session id was empty.
    #[error("session id must not be empty")]
    EmptySessionId,
}

/// Store mapping session ids to their registered ports.
///
/// All operations are synchronous and in-memory; they either succeed
/// deterministically or fail validation deterministically. There is no retry
/// path anywhere in the registry.
pub trait PortRegistry: Send + Sync {
    /// Creates or overwrites the record for `session_id`.
    ///
    /// The port is taken as a raw `i64` because it arrives unvalidated from
    /// the wire; values outside 1–65535 (including the 0 that an absent
    /// request field defaults to) are rejected without mutating any existing
    /// record. Repeated calls with the same value are idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptySessionId`] or
    /// [`RegistryError::InvalidPort`].
    fn set(&self, session_id: &str, port: i64) -> Result<(), RegistryError>;

    /// Looks up the record for `session_id`.
    ///
    /// Absence is a normal empty result, not an error.
    fn get(&self, session_id: &str) -> Option<SessionRecord>;

    /// Removes the record for `session_id`, if any.
    ///
    /// Idempotent; invoked by the session-lifecycle collaborator when a
    /// session ends, never by the registration endpoint itself.
    fn remove(&self, session_id: &str);

    /// Returns the number of registered sessions.
    fn len(&self) -> usize;

    /// Returns `true` if no session has registered a port.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capability handle for the single mutation the registration endpoint needs.
///
/// The endpoint resolves its port sink once, at router construction, and
/// holds it directly. Whatever concrete registry is active implements this
/// by delegating to its own `set`.
pub trait PortConfigurable: Send + Sync {
    /// Records `port` as the listening port for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on validation failure; see
    /// [`PortRegistry::set`].
    fn set_port(&self, session_id: &str, port: i64) -> Result<(), RegistryError>;
}

/// In-memory port registry.
#[derive(Debug, Default)]
pub struct InMemoryPortRegistry {
    /// Records keyed by session id.
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemoryPortRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// Lock poisoning is recovered rather than propagated: no registry operation
// can leave the map in a torn state, so the data behind a poisoned lock is
// still consistent.
impl PortRegistry for InMemoryPortRegistry {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Range-checked above the cast
    fn set(&self, session_id: &str, port: i64) -> Result<(), RegistryError> {
        if session_id.is_empty() {
            return Err(RegistryError::EmptySessionId);
        }
        if !(MIN_PORT..=MAX_PORT).contains(&port) {
            warn!(session_id, port, "rejected port registration");
            return Err(RegistryError::InvalidPort { port });
        }
        let port = port as u16;

        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        records.insert(
            session_id.to_string(),
            SessionRecord {
                session_id: session_id.to_string(),
                port,
                updated_at: Utc::now(),
            },
        );
        info!(session_id, port, "session port registered");
        Ok(())
    }

    fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    fn remove(&self, session_id: &str) {
        let removed = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
        if removed.is_some() {
            debug!(session_id, "session port record removed");
        }
    }

    fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PortConfigurable for InMemoryPortRegistry {
    fn set_port(&self, session_id: &str, port: i64) -> Result<(), RegistryError> {
        self.set(session_id, port)
    }
}
