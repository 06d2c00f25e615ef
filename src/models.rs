use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The RBAC field, modeled as an **ordered** hierarchy rather than a raw string:
/// `User < Admin`. The Authorization Gate compares against a required threshold,
/// so adding an intermediate privilege level later does not require ad hoc
/// branching at every call site.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS, ToSchema,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// User
///
/// The canonical identity record stored in the `users` table. The password
/// hash field is excluded from every serialization target, so the admin user
/// management endpoints can return this struct directly.
#[derive(Debug, Clone, Serialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    // The user's primary identifier. Unique, case-sensitive.
    pub email: String,
    /// The bcrypt hash. Plaintext passwords must never reach this field, and
    /// this field must never reach a client.
    #[serde(skip_serializing)]
    #[ts(skip)]
    #[schema(ignore)]
    pub password_hash: String,
    pub role: Role,
    /// Self-registered accounts start unapproved and cannot log in until an
    /// administrator flips this flag.
    pub approved: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// Manual row mapping so the `role` column (TEXT) decodes into the ordered enum.
impl<'r> sqlx::FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role_str: String = row.try_get("role")?;
        let role = Role::from_str(&role_str).map_err(|e| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: e.into(),
        })?;
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role,
            approved: row.try_get("approved")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl User {
    /// The non-sensitive projection handed to clients and attached to requests.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// NewUser
///
/// Internal insert payload for the Credential Store Adapter. The password is
/// already hashed by the time this struct exists; handlers own the hashing step.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub approved: bool,
}

/// UserProfile
///
/// The minimal identity projection: what the Authentication Gate attaches to a
/// request and what login/registration return. Never carries the hash, the
/// approval flag or timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /auth/register).
/// The password only exists in memory long enough to be hashed; it is never
/// persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// ChangePasswordRequest
///
/// Input payload for POST /auth/change-password. Requires proof of the current
/// password before the new one is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChangePasswordRequest {
    #[serde(rename = "currentPassword")]
    pub current_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// CreateUserRequest
///
/// Admin-only user creation payload (POST /admin/users). Unlike self-service
/// registration, the role is assignable here and the account is live immediately.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// UpdateRoleRequest
///
/// Admin-only role change payload (PUT /admin/users/{id}/role).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// --- Response Schemas (Output) ---

/// AuthResponse
///
/// Output schema for a successful login. The token is delivered twice: in the
/// `auth-token` cookie for browser clients and in this body for API/mobile
/// clients. Both channels carry the identical token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

/// RegisterResponse
///
/// Output schema for registration. No token: registration does not imply login,
/// since the account still awaits admin approval.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserProfile,
}

/// MessageResponse
///
/// Generic acknowledgement body used by logout and password change.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}
