//! RSA key component extraction.
//!
//! The TLS stack on the Wi-Fi module takes the certificate's key as two raw
//! big-endian integers. [`RsaComponents::from_pem`] accepts any common PEM
//! encoding of the key and returns the modulus (padded to the key size) and
//! the public exponent (minimal length).

use crate::error::{Error, Result};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;

/// Big-endian modulus and exponent of an RSA key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaComponents {
    /// Modulus, left-padded to exactly `key_size()` bytes
    pub modulus: Vec<u8>,
    /// Public exponent without leading zero bytes
    pub exponent: Vec<u8>,
}

impl RsaComponents {
    /// Extracts the components from a public key
    pub fn from_public_key(key: &RsaPublicKey) -> Self {
        let size = key.size();
        let raw = key.n().to_bytes_be();

        let mut modulus = vec![0u8; size.saturating_sub(raw.len())];
        modulus.extend_from_slice(&raw);

        Self {
            modulus,
            exponent: key.e().to_bytes_be(),
        }
    }

    /// Parses a PEM key and extracts its components.
    ///
    /// Tried in order: PKCS#1 private, PKCS#8 private, PKCS#1 public,
    /// SubjectPublicKeyInfo public.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = parse_public_key(pem)?;
        let components = Self::from_public_key(&key);
        debug!(
            "RSA key: {}-bit modulus, {}-byte exponent",
            components.modulus.len() * 8,
            components.exponent.len()
        );
        Ok(components)
    }

    /// Modulus length in bytes
    pub fn key_size(&self) -> usize {
        self.modulus.len()
    }
}

fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
    if let Ok(key) = RsaPrivateKey::from_pkcs1_pem(pem) {
        return Ok(key.to_public_key());
    }
    if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(pem) {
        return Ok(key.to_public_key());
    }
    if let Ok(key) = RsaPublicKey::from_pkcs1_pem(pem) {
        return Ok(key);
    }
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| {
        Error::invalid_key(format!(
            "not a PKCS#1 or PKCS#8 RSA key in PEM form ({e})"
        ))
    })
}
