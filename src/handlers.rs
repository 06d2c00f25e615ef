use crate::{
    AppState,
    auth::{self, AuthUser},
    errors::AuthError,
    models::{
        AuthResponse, ChangePasswordRequest, CreateUserRequest, LoginRequest, MessageResponse,
        NewUser, RegisterRequest, RegisterResponse, Role, UpdateRoleRequest, User, UserProfile,
    },
    password, session,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

// --- Session Flows ---

/// login
///
/// [Public Route] Authenticates a user by email and password and opens a session.
///
/// *Flow*: lookup by email -> verify password -> reject unapproved accounts ->
/// issue token -> set session cookie. The token is also returned in the body so
/// API clients that cannot use cookies get the identical credential.
///
/// *Note*: an unknown email is reported as 404, distinctly from a bad password
/// (401). This mirrors the original system's contract and is a deliberate
/// user-enumeration trade-off; see DESIGN.md.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Wrong password"),
        (status = 403, description = "Account pending approval"),
        (status = 404, description = "Unknown email"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::Input("Email and password are required".to_string()));
    }

    let user = state
        .repo
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    if !password::verify(&payload.password, &user.password_hash)? {
        return Err(AuthError::Credential("Invalid email or password".to_string()));
    }

    // Distinct from bad credentials: the password was right, the account is
    // simply not yet eligible to authenticate.
    if !user.approved {
        return Err(AuthError::Forbidden(
            "Account pending approval - please contact admin".to_string(),
        ));
    }

    let token = auth::issue_token(&user, &state.config.jwt_secret)?;
    let cookie = session::login_cookie(&token, &state.config);

    tracing::info!(user_id = %user.id, "login successful");

    let body = AuthResponse {
        user: user.profile(),
        token,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// register
///
/// [Public Route] Self-service account creation. The new record starts with
/// `role=user` and `approved=false`; no token is issued, since registration
/// does not imply login while approval is pending.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered, pending approval", body = RegisterResponse),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AuthError> {
    if payload.name.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::Input("All fields are required".to_string()));
    }

    if state.repo.count_by_email(&payload.email).await? > 0 {
        return Err(AuthError::Conflict("Email already registered".to_string()));
    }

    // Only the hash travels onward; the plaintext dies with this scope.
    let password_hash = password::hash(&payload.password)?;

    let created = state
        .repo
        .insert_user(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash,
            role: Role::User,
            approved: false,
        })
        .await?;

    tracing::info!(user_id = %created.id, "user registered, awaiting approval");

    Ok(Json(RegisterResponse {
        message: "Registration successful. Please wait for admin approval.".to_string(),
        user: created.profile(),
    }))
}

/// logout
///
/// [Authenticated Route] Clears the session cookie. Tokens are stateless, so
/// this is purely client-side: an already-captured token stays valid until its
/// natural expiry.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = session::clear_cookie(&state.config);
    (
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
        .into_response()
}

/// get_me
///
/// [Authenticated Route] Returns the identity the Authentication Gate resolved
/// for this request. No extra store read: the gate already did it.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(user: AuthUser) -> Json<UserProfile> {
    Json(UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    })
}

/// change_password
///
/// [Authenticated Route] Rotates the caller's password after verifying the
/// current one. Re-fetches the full record, since the request-scoped identity
/// deliberately lacks the stored hash.
///
/// Existing tokens are *not* invalidated; they remain valid until natural
/// expiry (no server-side revocation exists). See DESIGN.md.
#[utoipa::path(
    post,
    path = "/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Current password incorrect")
    )
)]
pub async fn change_password(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(AuthError::Input(
            "Current and new password are required".to_string(),
        ));
    }

    let full_user = state
        .repo
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AuthError::Credential("User not found".to_string()))?;

    if !password::verify(&payload.current_password, &full_user.password_hash)? {
        return Err(AuthError::Credential(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = password::hash(&payload.new_password)?;
    if !state.repo.update_password(user.id, &new_hash).await? {
        return Err(AuthError::Internal("Failed to update password".to_string()));
    }

    tracing::info!(user_id = %user.id, "password changed");

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

// --- Admin User Management ---
// Role enforcement happens in the admin middleware layer; by the time these
// handlers run, the caller is an authenticated admin.

/// list_users
///
/// [Admin Route] Lists every user record, including unapproved ones, so
/// pending registrations can be reviewed. Password hashes are excluded by
/// the model's serialization rules.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AuthError> {
    Ok(Json(state.repo.list_users().await?))
}

/// get_user
///
/// [Admin Route] Fetches a single user record by id.
#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = User),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AuthError> {
    let user = state
        .repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

/// create_user
///
/// [Admin Route] Creates an account directly. Unlike self-registration the
/// role is assignable here and the account is approved immediately; this is
/// the only path that can mint an admin.
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AuthError> {
    if payload.name.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::Input("All fields are required".to_string()));
    }

    if state.repo.count_by_email(&payload.email).await? > 0 {
        return Err(AuthError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password::hash(&payload.password)?;

    let created = state
        .repo
        .insert_user(NewUser {
            name: payload.name,
            email: payload.email,
            password_hash,
            role: payload.role,
            approved: true,
        })
        .await?;

    tracing::info!(user_id = %created.id, role = %created.role, "user created by admin");

    Ok((StatusCode::CREATED, Json(created)))
}

/// approve_user
///
/// [Admin Route] Marks an account eligible to authenticate. This is the step
/// that moves a self-registered user from "registered" to "can log in".
#[utoipa::path(
    put,
    path = "/admin/users/{id}/approve",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Approved", body = User),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn approve_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AuthError> {
    let user = state
        .repo
        .set_approved(id, true)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "user approved");

    Ok(Json(user))
}

/// update_user_role
///
/// [Admin Route] Changes a user's role. Escalation is only possible through
/// this admin-gated operation, never by the subject themselves. The change
/// takes effect on the target's next request, because the Authentication Gate
/// re-reads the role from the store rather than trusting the token claim.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<User>, AuthError> {
    let user = state
        .repo
        .set_role(id, payload.role)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, role = %user.role, "user role updated");

    Ok(Json(user))
}

/// delete_user
///
/// [Admin Route] Removes an account. Deletion immediately invalidates the
/// subject's outstanding tokens in practice, because the gate's store lookup
/// will no longer find them.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AuthError> {
    if state.repo.delete_user(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AuthError::NotFound("User not found".to_string()))
    }
}
