use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

// Deterministic RNG using provably-fair HMAC construction
// server_seed (key) + "client_seed:nonce:index" -> HMAC-SHA256 -> first 13 hex digits -> [0,1]

pub type HmacSha256 = Hmac<Sha256>;

/// Hex digits of the digest consumed by one draw.
pub const DRAW_HEX_DIGITS: usize = 13;

/// `16^13 - 1`, the largest value 13 hex digits can hold.
const DRAW_SCALE: f64 = ((1u64 << (DRAW_HEX_DIGITS * 4)) - 1) as f64;

pub fn derive_hash_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// Hex SHA-256 of the server seed, published before a round as its commitment.
pub fn server_seed_hash(server_seed: &str) -> String {
    derive_hash_hex(server_seed.as_bytes())
}

/// Raw HMAC-SHA256 digest for one position of the stream.
pub fn draw_digest(server_seed: &str, client_seed: &str, nonce: u64, index: u64) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(server_seed.as_bytes()).expect("HMAC key");
    let msg = format!("{}:{}:{}", client_seed, nonce, index);
    mac.update(msg.as_bytes());
    let res = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&res);
    out
}

/// Leading 13 hex digits of the digest as an integer.
///
/// Seven bytes carry fourteen hex digits, so the last nibble is shifted away.
pub fn digest_prefix(digest: &[u8; 32]) -> u64 {
    let mut buf = [0u8; 8];
    buf[1..].copy_from_slice(&digest[..7]);
    u64::from_be_bytes(buf) >> 4
}

/// One value of the stream: `prefix / (16^13 - 1)`.
///
/// Callers must reject empty seeds first; see [`crate::SeedBundle::validate`].
pub fn draw(server_seed: &str, client_seed: &str, nonce: u64, index: u64) -> f64 {
    let digest = draw_digest(server_seed, client_seed, nonce, index);
    digest_prefix(&digest) as f64 / DRAW_SCALE
}

/// Per-round view of the stream. The cursor starts at 0 and moves once per draw.
#[derive(Debug, Clone)]
pub struct DrawStream<'a> {
    server_seed: &'a str,
    client_seed: &'a str,
    nonce: u64,
    cursor: u64,
}

impl<'a> DrawStream<'a> {
    pub fn new(server_seed: &'a str, client_seed: &'a str, nonce: u64) -> Self {
        Self {
            server_seed,
            client_seed,
            nonce,
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn next_draw(&mut self) -> f64 {
        let value = draw(self.server_seed, self.client_seed, self.nonce, self.cursor);
        self.cursor += 1;
        value
    }
}

impl Iterator for DrawStream<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_draw())
    }
}
