//! Class codes, PINs and student session tokens
//!
//! Session tokens only ever leave the server inside the cookie; the
//! database stores `hash_token(token)`.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Class code alphabet without look-alikes (no I, O, 0, 1).
pub const CLASS_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CLASS_CODE_LEN: usize = 6;

const TOKEN_BYTES: usize = 32;

pub fn generate_class_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CLASS_CODE_LEN)
        .map(|_| CLASS_CODE_ALPHABET[rng.gen_range(0..CLASS_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Four-digit PIN, leading zeros kept.
pub fn generate_pin() -> String {
    format!("{:04}", rand::thread_rng().gen_range(0..10_000))
}

/// 32 random bytes as 64 lowercase hex characters.
pub fn generate_session_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// SHA-256 of the token as lowercase hex.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
