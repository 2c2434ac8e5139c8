//!
//! # Global common utils
//!

#![deny(missing_docs)]

pub mod ecdsa;
pub mod logging;

use sha2::{Digest, Sha256, Sha512};

/// Hex-encoded SHA-512 of `data`, always 128 lowercase characters.
#[inline(always)]
pub fn sha512_hex<T: ?Sized + AsRef<[u8]>>(data: &T) -> String {
    hex::encode(Sha512::digest(data.as_ref()))
}

/// Raw SHA-256 of `data`, the pre-hash fed to the secp256k1 signer.
#[inline(always)]
pub fn sha256<T: ?Sized + AsRef<[u8]>>(data: &T) -> [u8; 32] {
    Sha256::digest(data.as_ref()).into()
}

/// Check that `s` is non-empty lowercase hex of exactly `len` characters.
#[inline(always)]
pub fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
