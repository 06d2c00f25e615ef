use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use coders_cms::{
    AppState,
    auth::{AuthUser, Claims, TokenError, issue_token, verify_token},
    errors::StoreError,
    models::{NewUser, Role, User},
    repository::UserStore,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use uuid::Uuid;

// --- Mock Store for Gate Logic ---

/// Failure injection for the mock store, mirroring the adapter's taxonomy.
#[derive(Clone, Copy, Default)]
enum FailMode {
    #[default]
    None,
    Timeout,
    Unavailable,
}

#[derive(Default)]
struct MockAuthStore {
    user_to_return: Option<User>,
    fail: FailMode,
}

impl MockAuthStore {
    fn check(&self) -> Result<(), StoreError> {
        match self.fail {
            FailMode::None => Ok(()),
            FailMode::Timeout => Err(StoreError::Timeout),
            FailMode::Unavailable => Err(StoreError::Unavailable),
        }
    }
}

#[async_trait]
impl UserStore for MockAuthStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        Ok(self.user_to_return.clone())
    }
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
        self.check()?;
        Ok(self.user_to_return.clone())
    }
    async fn count_by_email(&self, _email: &str) -> Result<i64, StoreError> {
        self.check()?;
        Ok(if self.user_to_return.is_some() { 1 } else { 0 })
    }
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.check()?;
        Ok(self.user_to_return.clone().into_iter().collect())
    }
    async fn insert_user(&self, _user: NewUser) -> Result<User, StoreError> {
        self.check()?;
        Ok(User::default())
    }
    async fn update_password(&self, _id: Uuid, _hash: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(true)
    }
    async fn set_approved(&self, _id: Uuid, _approved: bool) -> Result<Option<User>, StoreError> {
        self.check()?;
        Ok(self.user_to_return.clone())
    }
    async fn set_role(&self, _id: Uuid, _role: Role) -> Result<Option<User>, StoreError> {
        self.check()?;
        Ok(self.user_to_return.clone())
    }
    async fn delete_user(&self, _id: Uuid) -> Result<bool, StoreError> {
        self.check()?;
        Ok(false)
    }
}

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn test_user(id: Uuid, role: Role) -> User {
    User {
        id,
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        password_hash: "$2b$04$irrelevant-for-gate-tests".to_string(),
        role,
        approved: true,
        ..User::default()
    }
}

/// Hand-rolls a token with an arbitrary expiry offset (negative = already expired).
fn create_token(user_id: Uuid, exp_offset: i64, secret: &str) -> String {
    let now = chrono::Utc::now().timestamp();

    let claims = Claims {
        sub: user_id,
        email: "test@example.com".to_string(),
        role: Role::User,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(store: MockAuthStore) -> AppState {
    let mut config = coders_cms::config::AppConfig::default();
    config.jwt_secret = TEST_JWT_SECRET.to_string();

    AppState {
        repo: Arc::new(store),
        config,
    }
}

/// Helper to get the mutable Parts struct from a generated Request.
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

// --- Token Issuer/Verifier Tests ---

#[test]
fn test_issue_and_verify_roundtrip() {
    let user = test_user(TEST_USER_ID, Role::Admin);
    let token = issue_token(&user, TEST_JWT_SECRET).unwrap();

    let claims = verify_token(&token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.sub, TEST_USER_ID);
    assert_eq!(claims.email, "test@example.com");
    assert_eq!(claims.role, Role::Admin);

    // Expiry sits ~7 days ahead of issuance.
    let now = chrono::Utc::now().timestamp() as usize;
    let seven_days = 60 * 60 * 24 * 7;
    assert!(claims.exp >= now + seven_days - 5);
    assert!(claims.exp <= now + seven_days + 5);
}

#[test]
fn test_verify_with_wrong_secret_is_invalid_signature() {
    let user = test_user(TEST_USER_ID, Role::User);
    let token = issue_token(&user, "secret-one").unwrap();

    let err = verify_token(&token, "secret-two").unwrap_err();
    assert_eq!(err, TokenError::InvalidSignature);
}

#[test]
fn test_verify_expired_token_is_expired() {
    // Correctly signed, but expired an hour ago.
    let token = create_token(TEST_USER_ID, -3600, TEST_JWT_SECRET);

    let err = verify_token(&token, TEST_JWT_SECRET).unwrap_err();
    assert_eq!(err, TokenError::Expired);
}

#[test]
fn test_verify_rejects_token_expired_by_one_second() {
    // No grace window: a token even one second past its expiry is stale.
    // Offsets inside the first minute matter here, since the default
    // validation settings would wave them through.
    for offset in [-1, -30, -59] {
        let token = create_token(TEST_USER_ID, offset, TEST_JWT_SECRET);
        let err = verify_token(&token, TEST_JWT_SECRET).unwrap_err();
        assert_eq!(err, TokenError::Expired, "offset {offset} must be rejected");
    }
}

#[test]
fn test_verify_garbage_token_is_malformed() {
    let err = verify_token("not-even-a-jwt", TEST_JWT_SECRET).unwrap_err();
    assert_eq!(err, TokenError::Malformed);
}

// --- Authentication Gate Tests ---

#[tokio::test]
async fn test_auth_success_with_bearer_token() {
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);

    let store = MockAuthStore {
        user_to_return: Some(test_user(TEST_USER_ID, Role::User)),
        ..MockAuthStore::default()
    };
    let app_state = create_app_state(store);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.role, Role::User);
    assert_eq!(user.email, "test@example.com");
}

#[tokio::test]
async fn test_auth_success_with_session_cookie() {
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);

    let store = MockAuthStore {
        user_to_return: Some(test_user(TEST_USER_ID, Role::Admin)),
        ..MockAuthStore::default()
    };
    let app_state = create_app_state(store);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("auth-token={}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    assert_eq!(auth_user.unwrap().role, Role::Admin);
}

#[tokio::test]
async fn test_auth_failure_with_missing_credential() {
    let app_state = create_app_state(MockAuthStore::default());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    let token = create_token(TEST_USER_ID, -600, TEST_JWT_SECRET);

    let store = MockAuthStore {
        user_to_return: Some(test_user(TEST_USER_ID, Role::User)),
        ..MockAuthStore::default()
    };
    let app_state = create_app_state(store);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    // Signed with a different secret than the server's.
    let token = create_token(TEST_USER_ID, 3600, "some-other-secret");

    let store = MockAuthStore {
        user_to_return: Some(test_user(TEST_USER_ID, Role::User)),
        ..MockAuthStore::default()
    };
    let app_state = create_app_state(store);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_when_subject_deleted() {
    // Token is valid, but the user no longer exists in the store.
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);

    let app_state = create_app_state(MockAuthStore::default());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(auth_user.unwrap_err().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_store_outage_is_503_not_401() {
    // A store outage must not masquerade as bad credentials.
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);

    let store = MockAuthStore {
        user_to_return: None,
        fail: FailMode::Unavailable,
    };
    let app_state = create_app_state(store);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_err());
    assert_eq!(
        auth_user.unwrap_err().status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_store_timeout_is_503() {
    let token = create_token(TEST_USER_ID, 3600, TEST_JWT_SECRET);

    let store = MockAuthStore {
        user_to_return: None,
        fail: FailMode::Timeout,
    };
    let app_state = create_app_state(store);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(
        auth_user.unwrap_err().status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_attached_identity_is_reused_without_store_read() {
    // An identity already attached by the middleware wins over the headers,
    // even when the store would fail. One store read per request.
    let store = MockAuthStore {
        user_to_return: None,
        fail: FailMode::Unavailable,
    };
    let app_state = create_app_state(store);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.extensions.insert(AuthUser {
        id: TEST_USER_ID,
        name: "Cached".to_string(),
        email: "cached@example.com".to_string(),
        role: Role::Admin,
    });

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.name, "Cached");
    assert_eq!(user.role, Role::Admin);
}
