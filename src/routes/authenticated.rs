use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any caller who has passed the
/// Authentication Gate. Every handler here can rely on a resolved `AuthUser`
/// being attached to the request by the `auth_middleware` layer above this
/// module, so no handler re-validates tokens itself.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /auth/logout
        // Clears the session cookie. Stateless tokens mean there is nothing to
        // invalidate server-side.
        .route("/auth/logout", post(handlers::logout))
        // GET /auth/me
        // Returns the identity resolved by the Authentication Gate for this request.
        .route("/auth/me", get(handlers::get_me))
        // POST /auth/change-password
        // Rotates the caller's password after re-verifying the current one.
        .route("/auth/change-password", post(handlers::change_password))
}
