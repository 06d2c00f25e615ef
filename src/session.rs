use crate::auth::TOKEN_TTL_SECS;
use crate::config::{AppConfig, Env};

/// Name of the session cookie carrying the signed token.
pub const AUTH_COOKIE_NAME: &str = "auth-token";

/// login_cookie
///
/// Builds the `Set-Cookie` header value delivered on a successful login.
/// Scoped to the whole site, script-inaccessible, `SameSite=Lax`, with a
/// max-age matching the token lifetime. `Secure` is appended only in
/// production so local HTTP development keeps working.
pub fn login_cookie(token: &str, config: &AppConfig) -> String {
    let mut cookie = format!(
        "{AUTH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={TOKEN_TTL_SECS}"
    );
    if config.env == Env::Production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// clear_cookie
///
/// Builds the immediate-expiry `Set-Cookie` header value used by logout.
/// Logout is purely client-side: the token itself stays valid until its
/// natural expiry, since there is no server-side revocation list.
pub fn clear_cookie(config: &AppConfig) -> String {
    let mut cookie =
        format!("{AUTH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.env == Env::Production {
        cookie.push_str("; Secure");
    }
    cookie
}
