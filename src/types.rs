//! Value types shared across the client: account addresses and the opaque
//! byte sequences (hash, account key, signature) carried over the wire in
//! hex form.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An account identifier. Canonical string form is `#<digits>`; on the wire
/// it appears either as that string or as the bare numeric value, depending
/// on the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(u64);

impl Address {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Reads an address out of a JSON payload field, accepting either the
    /// numeric form or the `#<digits>` string form.
    pub(crate) fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().map(Self),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error)]
#[error("invalid address `{0}`: expected #<digits>")]
pub struct AddressParseError(String);

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| AddressParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("invalid {what} hex: {source}")]
pub struct HexParseError {
    what: &'static str,
    source: hex::FromHexError,
}

/// A 32-byte digest produced by the peer's prepare step; this is the exact
/// value the key pair signs. Equality is byte-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hash([u8; 32]);

impl Hash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, HexParseError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|source| HexParseError { what: "hash", source })?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The public half of an account key pair, hex-encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountKey([u8; 32]);

impl AccountKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, HexParseError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|source| HexParseError { what: "account key", source })?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// A detached signature over a [`Hash`], produced only by
/// [`Signer::sign`](crate::Signer::sign). Hex-encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}
