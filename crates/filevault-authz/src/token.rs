//! Guest link token generation and hashing.
//!
//! Tokens are 32 bytes of CSPRNG output, hex-encoded. Storage keeps only
//! the SHA-256 digest; a plain unsalted digest is sufficient because the
//! tokens are high-entropy random strings, not passwords.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a fresh raw guest token.
///
/// The caller receives the only copy; once hashed and stored it cannot
/// be recovered.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// Hash a raw token for storage or lookup.
pub fn hash_token(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
