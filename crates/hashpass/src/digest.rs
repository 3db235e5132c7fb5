use crate::Secret;
use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha512};

/// Returns the standard (padded) base64 encoding of the SHA-512 digest of
/// `secret`.
pub fn hash_secret(secret: &Secret) -> String {
    STANDARD.encode(Sha512::digest(secret.expose()))
}
