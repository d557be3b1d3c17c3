//! HTTP request handlers.
//!
//! One router, four routes:
//!
//! - `POST /api/batchspawner` (session-scoped): a spawned workload reports
//!   the port it bound. Requires a provisioned session token.
//! - `GET /api/batchspawner/:session_id` (operator-scoped): the orchestration
//!   subsystem looks up a session's registered port.
//! - `DELETE /api/batchspawner/:session_id` (operator-scoped): the
//!   session-lifecycle notifier evicts a record when a session ends.
//! - `GET /healthz`: unauthenticated liveness probe.
//!
//! Validation order on registration is fixed: authentication, then body
//! shape, then port range (checked by the registry). A request that fails
//! authentication never reaches the body parser; a request that fails
//! parsing never reaches the registry. Exactly one registry mutation is
//! attempted per accepted request.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use spawnport_core::registry::SessionRecord;
use tracing::debug;

use crate::error::ApiError;
use crate::state::SharedState;

/// Daemon version (from Cargo.toml).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Confirmation text returned on successful registration.
///
/// Kept verbatim from the original batchspawner handler; remote spawner
/// scripts match on it.
pub const CONFIRMATION_MESSAGE: &str = "BatchSpawner port configured";

/// Builds the daemon router over shared state.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/batchspawner", post(register_port))
        .route(
            "/api/batchspawner/:session_id",
            get(lookup_port).delete(remove_port),
        )
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Success body for a registration.
#[derive(Debug, Serialize)]
struct RegisterResponse {
    message: &'static str,
}

/// Body for the liveness probe.
#[derive(Debug, Serialize)]
struct HealthResponse {
    version: &'static str,
    uptime_secs: u64,
}

/// `POST /api/batchspawner` — register the caller's port.
async fn register_port(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    let identity = state
        .authenticator()
        .authenticate(token)
        .ok_or(ApiError::Unauthorized)?;

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::MalformedRequest(format!("body is not valid JSON: {e}")))?;
    let port = extract_port(&payload)?;

    state.port_sink().set_port(&identity.session_id, port)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: CONFIRMATION_MESSAGE,
        }),
    ))
}

/// `GET /api/batchspawner/:session_id` — operator lookup.
async fn lookup_port(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<Json<SessionRecord>, ApiError> {
    authorize_operator(&state, &headers)?;

    state
        .registry()
        .get(&session_id)
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// `DELETE /api/batchspawner/:session_id` — operator removal.
///
/// Idempotent: removing an absent record is still 204.
async fn remove_port(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize_operator(&state, &headers)?;

    state.registry().remove(&session_id);
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /healthz` — liveness probe.
async fn healthz(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        version: VERSION,
        uptime_secs: state.uptime_secs(),
    })
}

/// Extracts the bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Checks the operator token on an operator-scoped route.
fn authorize_operator(state: &SharedState, headers: &HeaderMap) -> Result<(), ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    if state.operator_token_matches(token) {
        Ok(())
    } else {
        debug!("operator token mismatch");
        Err(ApiError::Unauthorized)
    }
}

/// Extracts the `port` value from a parsed request body.
///
/// The body must be a JSON object. A missing `port` field defaults to 0,
/// which the registry then rejects as out of range; a present field must be
/// an integer or a numeric string. Anything else is a malformed request.
fn extract_port(payload: &Value) -> Result<i64, ApiError> {
    let Some(object) = payload.as_object() else {
        return Err(ApiError::MalformedRequest(
            "body must be a JSON object".to_string(),
        ));
    };

    match object.get("port") {
        None => Ok(0),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            ApiError::MalformedRequest(format!("port must be an integer, got {n}"))
        }),
        Some(Value::String(s)) => s.parse::<i64>().map_err(|_| {
            ApiError::MalformedRequest(format!("port must be numeric, got '{s}'"))
        }),
        Some(other) => Err(ApiError::MalformedRequest(format!(
            "port must be an integer, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bearer_token_requires_scheme_prefix() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer tok-abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("tok-abc"));

        headers.insert(header::AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn extract_port_accepts_integers_and_numeric_strings() {
        assert_eq!(extract_port(&json!({"port": 8080})).unwrap(), 8080);
        assert_eq!(extract_port(&json!({"port": "8080"})).unwrap(), 8080);
    }

    #[test]
    fn extract_port_defaults_missing_field_to_zero() {
        assert_eq!(extract_port(&json!({})).unwrap(), 0);
    }

    #[test]
    fn extract_port_rejects_non_numeric_values() {
        assert!(extract_port(&json!({"port": "eighty-eighty"})).is_err());
        assert!(extract_port(&json!({"port": 8080.5})).is_err());
        assert!(extract_port(&json!({"port": [8080]})).is_err());
        assert!(extract_port(&json!({"port": null})).is_err());
    }

    #[test]
    fn extract_port_rejects_non_object_bodies() {
        assert!(extract_port(&json!([8080])).is_err());
        assert!(extract_port(&json!(8080)).is_err());
        assert!(extract_port(&json!("port")).is_err());
    }
}
