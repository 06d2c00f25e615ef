use coders_cms::password;

#[test]
fn test_hash_then_verify_roundtrip() {
    let hash = password::hash("correct horse battery staple").unwrap();
    assert!(password::verify("correct horse battery staple", &hash).unwrap());
}

#[test]
fn test_wrong_password_is_false_not_error() {
    let hash = password::hash("right-password").unwrap();
    // A mismatch is a normal outcome, reported in-band.
    assert!(!password::verify("wrong-password", &hash).unwrap());
}

#[test]
fn test_hash_is_salted() {
    // Same input twice must produce different hashes, both of which verify.
    let first = password::hash("samePassword1").unwrap();
    let second = password::hash("samePassword1").unwrap();
    assert_ne!(first, second);
    assert!(password::verify("samePassword1", &first).unwrap());
    assert!(password::verify("samePassword1", &second).unwrap());
}

#[test]
fn test_hash_never_contains_plaintext() {
    let hash = password::hash("hunter2hunter2").unwrap();
    assert!(!hash.contains("hunter2"));
    assert!(hash.starts_with("$2"));
}

#[test]
fn test_malformed_stored_hash_is_an_error() {
    // A corrupted stored hash is an internal failure, not a mismatch. It must
    // never be mistaken for a wrong password.
    assert!(password::verify("anything", "not-a-bcrypt-hash").is_err());
}
