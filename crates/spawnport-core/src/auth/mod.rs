//! Bearer-token authentication for reporting sessions.
//!
//! The daemon does not own a user directory; it trusts whoever provisioned
//! the session tokens. Authentication here is a pure lookup from a presented
//! token to the session identity it was minted for.
//!
//! # Security
//!
//! Token comparison is constant-time ([`subtle::ConstantTimeEq`]) so a
//! probing client cannot recover token bytes through response timing. Token
//! length is not treated as secret.

use subtle::ConstantTimeEq;

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Opaque session identifier the presented token was minted for.
    pub session_id: String,
}

/// Maps a presented bearer credential to a session identity.
///
/// Returning `None` covers both "unknown token" and "no token" — the caller
/// cannot distinguish the two, by construction.
pub trait Authenticator: Send + Sync {
    /// Authenticates a presented token.
    fn authenticate(&self, token: &str) -> Option<SessionIdentity>;
}

/// One provisioned token and the session it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    /// The bearer token value.
    pub token: String,
    /// Session id the token authenticates as.
    pub session_id: String,
}

/// Error type for authenticator construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthConfigError {
    /// A token entry had an empty token value.
    #[error("session token must not be empty (entry for session '{session_id}')")]
    EmptyToken {
        /// Session id of the offending entry.
        session_id: String,
    },

    /// A token entry had an empty session id.
    #[error("session id must not be empty")]
    EmptySessionId,

    /// The same token value was provisioned twice.
    #[error("duplicate session token (entries for sessions '{first}' and '{second}')")]
    DuplicateToken {
        /// Session id of the first entry with this token.
        first: String,
        /// Session id of the conflicting entry.
        second: String,
    },
}

/// Authenticator over a fixed token table loaded at startup.
#[derive(Debug)]
pub struct StaticTokenAuthenticator {
    entries: Vec<TokenEntry>,
}

impl StaticTokenAuthenticator {
    /// Builds an authenticator from provisioned token entries.
    ///
    /// Validation is fail-closed: empty tokens, empty session ids, and
    /// duplicate tokens are all construction errors rather than entries that
    /// silently never match.
    ///
    /// # Errors
    ///
    /// Returns [`AuthConfigError`] describing the first invalid entry.
    pub fn from_entries(entries: Vec<TokenEntry>) -> Result<Self, AuthConfigError> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.session_id.is_empty() {
                return Err(AuthConfigError::EmptySessionId);
            }
            if entry.token.is_empty() {
                return Err(AuthConfigError::EmptyToken {
                    session_id: entry.session_id.clone(),
                });
            }
            for earlier in &entries[..i] {
                if earlier.token == entry.token {
                    return Err(AuthConfigError::DuplicateToken {
                        first: earlier.session_id.clone(),
                        second: entry.session_id.clone(),
                    });
                }
            }
        }
        Ok(Self { entries })
    }

    /// Returns the number of provisioned tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no tokens are provisioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<SessionIdentity> {
        // Every entry is compared; no early exit on match.
        let mut found = None;
        for entry in &self.entries {
            if tokens_match(&entry.token, token) {
                found = Some(SessionIdentity {
                    session_id: entry.session_id.clone(),
                });
            }
        }
        found
    }
}

/// Constant-time equality over token bytes.
///
/// `ct_eq` on slices of unequal length short-circuits to false; length is
/// not secret here, only content.
#[must_use]
pub fn tokens_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}
