use crate::errors::StoreError;
use crate::models::{NewUser, Role, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// UserStore Trait
///
/// The Credential Store Adapter: the abstract contract for all persistence
/// operations the authentication core needs. Handlers and gates interact with
/// the data layer through this trait without knowing the concrete backend
/// (Postgres, Mock, ...).
///
/// Semantics: every read returns `Ok(None)` for not-found, which is always
/// distinguishable from a transport failure (`Err(StoreError)`). Writes are
/// fire-and-confirm; no partial-write recovery lives in this core.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn UserStore>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait UserStore: Send + Sync {
    // --- Reads ---
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    // Existence count used by registration to enforce email uniqueness.
    async fn count_by_email(&self, email: &str) -> Result<i64, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    // --- Writes ---
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    // Replaces the stored hash and refreshes `updated_at`. Returns whether a row matched.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError>;
    // Admin lifecycle operations. Return the updated record, `None` if the id is unknown.
    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<Option<User>, StoreError>;
    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// UserStoreState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type UserStoreState = Arc<dyn UserStore>;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, approved, created_at, updated_at";

/// PostgresUserStore
///
/// The concrete implementation of the `UserStore` trait, backed by PostgreSQL.
/// All sqlx failures are classified into the `StoreError` taxonomy at this
/// boundary (see `From<sqlx::Error> for StoreError`).
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Creates a new store instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    /// find_by_email
    ///
    /// Lookup by the unique email column. Case-sensitive, matching the store's
    /// uniqueness constraint.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn count_by_email(&self, email: &str) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// insert_user
    ///
    /// Inserts a new identity record. The id is assigned here; the caller has
    /// already hashed the password and decided role/approval per the flow
    /// (self-registration: `user`/unapproved, admin creation: assignable/live).
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash, role, approved, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.approved)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET approved = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(approved)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(role.to_string())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
