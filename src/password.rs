use crate::errors::AuthError;

/// Fixed bcrypt cost factor. Deliberately slow: offline brute force against a
/// leaked hash must stay expensive. Raising this only affects newly stored
/// hashes; existing ones keep the cost they were created with.
pub const BCRYPT_COST: u32 = 10;

/// hash
///
/// One-way adaptive hash of a plaintext password. Salting is handled by bcrypt
/// itself (the salt is embedded in the output string). Fails only on internal
/// algorithm/entropy failure, which surfaces as a 500.
pub fn hash(plaintext: &str) -> Result<String, AuthError> {
    bcrypt::hash(plaintext, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("Password processing failed: {e}")))
}

/// verify
///
/// Checks a plaintext password against a stored hash. A mismatch is `Ok(false)`,
/// not an error; a structurally invalid hash is a distinct internal failure.
/// bcrypt performs the comparison in constant time, so timing does not leak
/// whether the candidate was close.
pub fn verify(plaintext: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(plaintext, hash)
        .map_err(|e| AuthError::Internal(format!("Password verification failed: {e}")))
}
