use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Account-lifecycle operations restricted to administrators: reviewing
/// registrations, approving accounts, assigning roles, and direct user
/// creation/removal.
///
/// Access Control:
/// This entire router is wrapped in two layers applied in `create_router`:
/// the Authentication Gate (`auth_middleware`) runs first and attaches the
/// caller's identity, then the Authorization Gate (`admin_middleware`) checks
/// the role threshold. A request with no credential is rejected 401 before
/// the role check can ever produce a 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET  /admin/users        List all users, including unapproved ones.
        // POST /admin/users        Create a user directly (role assignable, live immediately).
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        // GET    /admin/users/{id}  Fetch one user record.
        // DELETE /admin/users/{id}  Remove an account (also cuts off its live tokens).
        .route(
            "/users/{id}",
            get(handlers::get_user).delete(handlers::delete_user),
        )
        // PUT /admin/users/{id}/approve
        // Marks the account eligible to authenticate.
        .route("/users/{id}/approve", put(handlers::approve_user))
        // PUT /admin/users/{id}/role
        // Role escalation/demotion. The only path that can change privileges.
        .route("/users/{id}/role", put(handlers::update_user_role))
}
