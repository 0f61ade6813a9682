//! Envelope stripping for PEM / X.509 framed payloads.
//!
//! Certificates usually arrive as base64 text between a `BEGIN` and an `END`
//! marker. The [`EnvelopeTable`] holds the known marker pairs in priority
//! order; [`EnvelopeTable::strip`] finds the first pair present in the input,
//! extracts the text strictly between the markers and base64-decodes it.
//! Input with no known markers is returned unchanged and treated as raw bytes.
//!
//! ```
//! use fwembed_core::EnvelopeTable;
//!
//! let pem = b"-----BEGIN CERTIFICATE-----\nQQ==\n-----END CERTIFICATE-----\n";
//! let der = EnvelopeTable::certificates().strip(pem)?;
//! assert_eq!(der, vec![0x41]);
//! # Ok::<(), fwembed_core::Error>(())
//! ```

use crate::error::{Error, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use tracing::{debug, trace};

/// A single header/footer marker pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeDescriptor {
    /// Human-readable name used in diagnostics
    pub name: String,
    /// Marker preceding the base64 region
    pub header: Vec<u8>,
    /// Marker following the base64 region
    pub footer: Vec<u8>,
}

impl EnvelopeDescriptor {
    /// Creates a new descriptor
    pub fn new(
        name: impl Into<String>,
        header: impl Into<Vec<u8>>,
        footer: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            header: header.into(),
            footer: footer.into(),
        }
    }

    /// X.509 certificate with CRLF line endings
    pub fn x509_crlf() -> Self {
        Self::new(
            "X.509 (CRLF)",
            &b"-----BEGIN CERTIFICATE-----\r\n"[..],
            &b"\r\n-----END CERTIFICATE-----\r\n"[..],
        )
    }

    /// PEM certificate with LF line endings
    pub fn pem_lf() -> Self {
        Self::new(
            "PEM (LF)",
            &b"-----BEGIN CERTIFICATE-----\n"[..],
            &b"\n-----END CERTIFICATE-----\n"[..],
        )
    }

    /// Returns the region strictly between the first header and the first
    /// footer that follows it.
    ///
    /// `Ok(None)` means neither marker occurs; a lone marker is an error.
    pub fn enclosed<'a>(&self, data: &'a [u8]) -> Result<Option<&'a [u8]>> {
        let Some(header_pos) = find_subsequence(data, &self.header) else {
            if find_subsequence(data, &self.footer).is_some() {
                return Err(Error::malformed_envelope(
                    &self.name,
                    "footer marker found without a preceding header",
                ));
            }
            return Ok(None);
        };

        let body_start = header_pos + self.header.len();
        let Some(footer_rel) = find_subsequence(&data[body_start..], &self.footer) else {
            return Err(Error::malformed_envelope(
                &self.name,
                format!("header marker at offset {header_pos} has no matching footer"),
            ));
        };

        Ok(Some(&data[body_start..body_start + footer_rel]))
    }
}

/// Ordered set of envelope descriptors, tried first to last
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeTable {
    descriptors: Vec<EnvelopeDescriptor>,
}

impl EnvelopeTable {
    /// Creates an empty table; everything passes through verbatim
    pub fn new() -> Self {
        Self::default()
    }

    /// The certificate table: CRLF-framed X.509 first, then LF-framed PEM
    pub fn certificates() -> Self {
        Self::new()
            .with(EnvelopeDescriptor::x509_crlf())
            .with(EnvelopeDescriptor::pem_lf())
    }

    /// Appends a descriptor with the lowest priority so far
    pub fn with(mut self, descriptor: EnvelopeDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Returns the descriptors in priority order
    pub fn descriptors(&self) -> &[EnvelopeDescriptor] {
        &self.descriptors
    }

    /// Strips the first matching envelope and base64-decodes its content.
    ///
    /// Returns `data` unchanged if no descriptor matches.
    pub fn strip(&self, data: &[u8]) -> Result<Vec<u8>> {
        for descriptor in &self.descriptors {
            trace!("Trying envelope {}", descriptor.name);
            if let Some(enclosed) = descriptor.enclosed(data)? {
                debug!(
                    "Matched {} envelope ({} bytes of base64)",
                    descriptor.name,
                    enclosed.len()
                );
                return decode_base64(enclosed);
            }
        }

        debug!("No envelope matched, using {} bytes verbatim", data.len());
        Ok(data.to_vec())
    }
}

/// Decode base64 text, ignoring embedded line breaks and other whitespace
pub fn decode_base64(text: &[u8]) -> Result<Vec<u8>> {
    let compact: Vec<u8> = text
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(BASE64_STANDARD.decode(compact)?)
}

/// Find a subsequence within a byte slice
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PEM_LF: &[u8] = b"-----BEGIN CERTIFICATE-----\nQQ==\n-----END CERTIFICATE-----\n";

    #[test]
    fn test_strip_pem_lf() {
        let table = EnvelopeTable::certificates();
        assert_eq!(table.strip(PEM_LF).unwrap(), vec![0x41]);
    }

    #[test]
    fn test_strip_x509_crlf_multiline() {
        let text = b"-----BEGIN CERTIFICATE-----\r\nAAEC\r\nAwQF\r\n-----END CERTIFICATE-----\r\n";
        let table = EnvelopeTable::certificates();
        assert_eq!(table.strip(text).unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_strip_matches_direct_decode() {
        let inner = b"MIIBszCCAV2gAwIBAgIUTest\nAQIDBAUGBwgJ";
        let mut text = b"-----BEGIN CERTIFICATE-----\n".to_vec();
        text.extend_from_slice(inner);
        text.extend_from_slice(b"\n-----END CERTIFICATE-----\n");

        let stripped = EnvelopeTable::certificates().strip(&text).unwrap();
        assert_eq!(stripped, decode_base64(inner).unwrap());
    }

    #[test]
    fn test_no_envelope_passes_through() {
        let raw = [0x30, 0x82, 0x01, 0x0A, 0xFF];
        let table = EnvelopeTable::certificates();
        assert_eq!(table.strip(&raw).unwrap(), raw.to_vec());
    }

    #[test]
    fn test_header_without_footer() {
        let text = b"-----BEGIN CERTIFICATE-----\nQQ==\n";
        let err = EnvelopeTable::certificates().strip(text).unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope { .. }));
    }

    #[test]
    fn test_footer_without_header() {
        let text = b"QQ==\n-----END CERTIFICATE-----\n";
        let err = EnvelopeTable::certificates().strip(text).unwrap_err();
        assert!(matches!(err, Error::MalformedEnvelope { .. }));
    }

    #[test]
    fn test_first_pair_only() {
        let text = b"-----BEGIN CERTIFICATE-----\nQQ==\n-----END CERTIFICATE-----\n\
                     -----BEGIN CERTIFICATE-----\nQg==\n-----END CERTIFICATE-----\n";
        assert_eq!(EnvelopeTable::certificates().strip(text).unwrap(), vec![0x41]);
    }

    #[test]
    fn test_priority_order() {
        let custom = EnvelopeTable::new()
            .with(EnvelopeDescriptor::new("KEY", &b"<key>"[..], &b"</key>"[..]))
            .with(EnvelopeDescriptor::pem_lf());
        assert_eq!(custom.strip(b"<key>Qg==</key>").unwrap(), vec![0x42]);
        assert_eq!(custom.strip(PEM_LF).unwrap(), vec![0x41]);
        assert_eq!(custom.descriptors()[0].name, "KEY");
    }

    #[test]
    fn test_invalid_base64() {
        let text = b"-----BEGIN CERTIFICATE-----\n!!!!\n-----END CERTIFICATE-----\n";
        let err = EnvelopeTable::certificates().strip(text).unwrap_err();
        assert!(matches!(err, Error::InvalidBase64(_)));
    }
}
