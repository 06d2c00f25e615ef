use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
/// These are the entry points of the identity flow: a client arrives here with
/// no credential and leaves login with a session token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        // Credential verification and session-token issuance. Sets the session
        // cookie and returns the token in the body for non-cookie clients.
        .route("/auth/login", post(handlers::login))
        // POST /auth/register
        // Self-service account creation. The account starts unapproved and
        // cannot authenticate until an administrator approves it.
        .route("/auth/register", post(handlers::register))
}
