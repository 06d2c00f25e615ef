use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    errors::AuthError,
    models::{Role, User},
    repository::UserStoreState,
    session::AUTH_COOKIE_NAME,
};

/// Session token lifetime: 7 days from issuance, regardless of activity.
/// Tokens are self-contained; there is no refresh and no revocation, so this
/// window is also the maximum staleness after a password or role change.
pub const TOKEN_TTL_SECS: u64 = 60 * 60 * 24 * 7;

/// Claims
///
/// The payload structure carried inside a session token (JWT). These claims are
/// signed with the server's secret and validated on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user, used to re-resolve the identity
    /// record on each request.
    pub sub: Uuid,
    /// Email at issuance time. Informational; the store remains authoritative.
    pub email: String,
    /// Role at issuance time. The gate re-reads the current role from the
    /// store, so a demotion takes effect on the next request, not at expiry.
    pub role: Role,
    /// Expiration time (exp): timestamp after which the token must be rejected.
    pub exp: usize,
    /// Issued at (iat): timestamp when the token was created.
    pub iat: usize,
}

/// TokenError
///
/// Verification failure taxonomy. All three map to 401 at the HTTP surface but
/// are kept distinct so logs and tests can tell a forged token from a stale one.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        AuthError::Credential(e.to_string())
    }
}

/// issue_token
///
/// Signs a session token for a freshly authenticated user: subject id, email
/// and role, expiring `TOKEN_TTL_SECS` from now. HS256 with the process-wide
/// secret; rotating the secret invalidates every outstanding token.
pub fn issue_token(user: &User, secret: &str) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        iat: now,
        exp: now + TOKEN_TTL_SECS as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| AuthError::Internal(format!("Token generation failed: {e}")))
}

/// verify_token
///
/// Validates signature and expiry against the same secret used at issuance and
/// returns the decoded claims. Expiry is strictly checked; a valid signature on
/// a stale token still fails.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    // Ensure expiration time validation is always active, with no grace
    // window: the default validation allows 60 seconds of clock leeway,
    // which would accept recently expired tokens.
    validation.validate_exp = true;
    validation.leeway = 0;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            ErrorKind::InvalidSignature => Err(TokenError::InvalidSignature),
            // Undecodable claims, wrong algorithm, truncated token, etc.
            _ => Err(TokenError::Malformed),
        },
    }
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the trusted, minimal
/// projection of the caller for the duration of one request. Handlers receive
/// it as an extractor argument; it never includes the password hash.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// This is the Authentication Gate. Implementing Axum's `FromRequestParts`
/// makes `AuthUser` usable as a function argument in any protected handler and
/// as the guard inside the authentication middleware.
///
/// The process:
/// 1. Reuse: if a prior gate already attached an identity to the request
///    extensions, return it (one store read per request).
/// 2. Token extraction: the `auth-token` session cookie, falling back to an
///    `Authorization: Bearer` header for API clients.
/// 3. Token validation: signature + expiry against the configured secret.
/// 4. Store lookup: the subject must still exist; this catches users deleted
///    after the token was issued and picks up role changes immediately.
///
/// Rejection: 401 for any credential failure, 503/500 if the store itself
/// failed (an outage must not masquerade as bad credentials).
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    UserStoreState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Identity already attached by the authentication middleware.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = UserStoreState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Token extraction: cookie first, bearer header as fallback.
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(AUTH_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.strip_prefix("Bearer "))
                    .map(|token| token.to_string())
            })
            .ok_or_else(|| AuthError::Credential("Missing authentication token".to_string()))?;

        // 3. Signature and expiry validation.
        let claims = verify_token(&token, &config.jwt_secret)?;

        // 4. Store lookup (final verification). A store failure is surfaced as
        // such; only a genuinely missing subject is a credential error.
        let user = repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AuthError::Credential("User not found".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        })
    }
}
