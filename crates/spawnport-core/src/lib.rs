//! Core library for the spawnport daemon.
//!
//! A spawned batch workload binds a random port on its execution host and
//! reports it back so the orchestration layer can route traffic to it. This
//! crate owns everything below the HTTP surface:
//!
//! - [`registry`]: the in-memory session-to-port registry
//! - [`auth`]: bearer-token authentication of reporting sessions
//! - [`config`]: TOML configuration loading and validation

pub mod auth;
pub mod config;
pub mod registry;

pub use auth::{AuthConfigError, Authenticator, SessionIdentity, StaticTokenAuthenticator, TokenEntry};
pub use config::{ConfigError, DaemonConfig, ServiceConfig, SessionTokenConfig};
pub use registry::{
    InMemoryPortRegistry, PortConfigurable, PortRegistry, RegistryError, SessionRecord,
};
