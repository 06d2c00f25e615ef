use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// StoreError
///
/// Failure taxonomy for the Credential Store Adapter. Not-found is *not* an
/// error (read operations return `Ok(None)`); this enum only describes
/// transport and backend failures, so callers can distinguish a retryable
/// outage from a permanent fault.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store did not answer within its deadline. Retryable.
    #[error("store timeout")]
    Timeout,
    /// The store is unreachable (connection refused, pool closed, TLS failure).
    #[error("store unavailable")]
    Unavailable,
    /// Any other backend failure (constraint violation, decode error, ...).
    #[error("store failure: {0}")]
    Backend(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    /// Classifies a raw sqlx failure at the adapter boundary. This is the only
    /// place where driver error kinds are inspected; everything above the
    /// repository sees the three-way taxonomy.
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::Tls(_) => {
                StoreError::Unavailable
            }
            other => StoreError::Backend(other),
        }
    }
}

/// AuthError
///
/// The HTTP-facing error taxonomy for the authentication core. Every store or
/// cryptographic failure is classified into one of these variants at the
/// boundary where it occurs and mapped onto the status contract:
///
/// - `Input`      -> 400 malformed/missing request data
/// - `Credential` -> 401 missing/invalid/expired token or bad password
/// - `Forbidden`  -> 403 authenticated but unapproved or under-privileged
/// - `NotFound`   -> 404 unknown resource (including unknown email at login)
/// - `Conflict`   -> 409 duplicate email at registration
/// - `Internal`   -> 500 hashing/signing/backend failure
/// - `Dependency` -> 503 store unreachable or store timeout
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Credential(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Dependency(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Input(_) => StatusCode::BAD_REQUEST,
            AuthError::Credential(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Dependency(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Timeout => {
                AuthError::Dependency("Database connection timeout - please try again".to_string())
            }
            StoreError::Unavailable => {
                AuthError::Dependency("Database unavailable - please contact support".to_string())
            }
            StoreError::Backend(inner) => {
                // The raw driver error is logged for diagnostics but never
                // surfaced to the client.
                tracing::error!("store backend failure: {:?}", inner);
                AuthError::Internal("Database error".to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, "request failed: {}", self);
        } else {
            tracing::debug!(%status, "request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
