//! The signing capability consumed by the transaction pipeline.
//!
//! Key generation and the signature scheme itself live outside this crate;
//! the pipeline only needs something that can expose a public account key
//! and sign the hash the peer hands back from the prepare step. An
//! implementation for [`ed25519_dalek::SigningKey`] is provided since that
//! is the scheme the peer uses, but any signer (hardware token, remote KMS)
//! can be plugged in.

use crate::types::{AccountKey, Hash, Signature};

/// A key pair bound to a [`Connection`](crate::Connection).
///
/// Implementations must sign exactly the bytes of the hash they are given;
/// the submit payload is rejected by the peer otherwise.
pub trait Signer {
    /// The public account key, as posted on account creation and attached
    /// to every transaction submit.
    fn account_key(&self) -> AccountKey;

    /// Signs a prepare-step hash. Local, non-suspending work; it runs
    /// inside the pipeline's continuation between the two network calls.
    fn sign(&self, hash: &Hash) -> Signature;
}

impl Signer for ed25519_dalek::SigningKey {
    fn account_key(&self) -> AccountKey {
        AccountKey::from_bytes(self.verifying_key().to_bytes())
    }

    fn sign(&self, hash: &Hash) -> Signature {
        let sig = ed25519_dalek::Signer::sign(self, hash.as_bytes());
        Signature::from_bytes(sig.to_bytes())
    }
}
