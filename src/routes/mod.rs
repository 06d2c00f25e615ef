/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. This structure ensures that
/// access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The three modules map directly to the defined access tiers.

/// Routes accessible to any client: health check, login, registration.
pub mod public;

/// Routes protected by the Authentication Gate (`auth_middleware`).
/// Requires a valid session token.
pub mod authenticated;

/// Routes additionally protected by the Authorization Gate (`admin_middleware`).
/// Restricted to users whose role meets the admin threshold.
pub mod admin;
