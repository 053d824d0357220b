// auth-server/src/utils/token.rs
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Characters in an issued nonce. 24 alphanumerics carry ~142 bits of entropy.
pub const NONCE_LEN: usize = 24;

/// Generate a random alphanumeric token from the operating system's CSPRNG
pub fn generate_secure_token(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generate a sign-in nonce. Uniqueness comes from entropy, not from a lookup.
pub fn generate_nonce() -> String {
    generate_secure_token(NONCE_LEN)
}
