//! Invite token generation.

/// Generates a URL-safe single-use token with 256 bits of entropy.
#[must_use]
pub fn generate() -> String {
    let bytes: [u8; 32] = rand::random();
    base64_url::encode(&bytes)
}
