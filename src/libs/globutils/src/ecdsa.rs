//!
//! secp256k1 signing identities for ledger headers
//!
//! Messages are pre-hashed with SHA-256 and signed with RFC-6979 nonces, so
//! a given key always produces the same signature for the same bytes. The
//! signature travels as the 64-byte compact form in lowercase hex, the public
//! key as the 33-byte compressed point in lowercase hex.
//!

use {
    crate::sha256,
    libsecp256k1::{Message, PublicKey, SecretKey, Signature},
    rand::{rngs::OsRng, RngCore},
    ruc::*,
    std::{fmt, fs, path::Path},
};

/// A secret seed (which is bytewise essentially equivalent to a SecretKey).
type Seed = [u8; 32];

/// Hex length of a compressed public key.
pub const PUBLIC_KEY_HEX_LEN: usize = 66;

/// Hex length of a compact signature.
pub const SIGNATURE_HEX_LEN: usize = 128;

/// Anything able to sign ledger headers.
///
/// `sign` may fail (remote signers, hardware tokens); callers propagate the
/// failure and never retry it.
pub trait Signer {
    /// Compressed public key, lowercase hex.
    fn public_key_hex(&self) -> String;

    /// Signature over `message`, lowercase hex.
    fn sign(&self, message: &[u8]) -> Result<String>;
}

/// A secp256k1 key pair.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct SecpPair {
    public: PublicKey,
    secret: SecretKey,
}

impl fmt::Debug for SecpPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SecpPair({})", self.public_key_hex())
    }
}

impl SecpPair {
    /// Generate a fresh random key pair.
    pub fn generate() -> Self {
        loop {
            let mut seed = Seed::default();
            OsRng.fill_bytes(seed.as_mut());
            // out-of-range scalars are astronomically rare, just draw again
            if let Ok(pair) = Self::from_seed_slice(&seed) {
                return pair;
            }
        }
    }

    /// Make a new key pair from secret seed material.
    /// The slice must be 32 bytes long and a valid scalar.
    pub fn from_seed_slice(seed_slice: &[u8]) -> Result<SecpPair> {
        let secret = SecretKey::parse_slice(seed_slice)
            .map_err(|e| eg!(format!("invalid private key: {e:?}")))?;
        let public = PublicKey::from_secret_key(&secret);
        Ok(SecpPair { public, secret })
    }

    /// Parse a hex-encoded private key, surrounding whitespace ignored.
    pub fn from_hex(private_key: &str) -> Result<SecpPair> {
        hex::decode(private_key.trim())
            .c(d!("private key is not valid hex"))
            .and_then(|bytes| Self::from_seed_slice(&bytes).c(d!()))
    }

    /// Load the hex private key stored in `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SecpPair> {
        let path = path.as_ref();
        fs::read_to_string(path)
            .c(d!(format!("failed to read private key {}", path.display())))
            .and_then(|s| Self::from_hex(&s).c(d!()))
    }

    /// Private key as lowercase hex, the format `from_hex` accepts.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret.serialize())
    }

    /// Sign `message`, returning the compact signature bytes.
    pub fn sign_bytes(&self, message: &[u8]) -> [u8; 64] {
        let message = Message::parse(&sha256(message));
        libsecp256k1::sign(&message, &self.secret).0.serialize()
    }
}

impl Signer for SecpPair {
    fn public_key_hex(&self) -> String {
        hex::encode(self.public.serialize_compressed())
    }

    fn sign(&self, message: &[u8]) -> Result<String> {
        Ok(hex::encode(self.sign_bytes(message)))
    }
}

/// Verify a hex signature over `message` against a hex compressed public key.
/// Malformed inputs simply fail verification.
pub fn verify(signature_hex: &str, message: &[u8], public_key_hex: &str) -> bool {
    let sig = match hex::decode(signature_hex)
        .ok()
        .and_then(|b| Signature::parse_standard_slice(&b).ok())
    {
        Some(sig) => sig,
        None => return false,
    };
    let pk = match hex::decode(public_key_hex)
        .ok()
        .and_then(|b| PublicKey::parse_slice(&b, None).ok())
    {
        Some(pk) => pk,
        None => return false,
    };
    libsecp256k1::verify(&Message::parse(&sha256(message)), &sig, &pk)
}
