//! # fwembed-core
//!
//! A library for turning binary payloads into C array declarations that
//! embedded firmware can compile in.
//!
//! This crate provides the core functionality for:
//! - Stripping PEM / X.509 envelopes from certificates
//! - Framing web assets as complete HTTP responses
//! - Rendering bytes as line-wrapped `0xNN` array literals, and reading them back
//! - Extracting RSA key components and PCM samples from WAV files
//!
//! ## Architecture
//!
//! - [`envelope`]: Envelope table and base64 decoding
//! - [`http`]: Response header synthesis
//! - [`array`]: Hex array formatting and parsing
//! - [`bundle`]: Multi-declaration output files
//! - [`key`]: RSA modulus / exponent extraction
//! - [`wav`]: RIFF/WAVE parsing
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use fwembed_core::{ArrayBundle, EnvelopeTable, HexArrayFormatter, LineEnding};
//!
//! let pem = b"-----BEGIN CERTIFICATE-----\nQQ==\n-----END CERTIFICATE-----\n";
//! let der = EnvelopeTable::certificates().strip(pem)?;
//!
//! let mut bundle = ArrayBundle::new(LineEnding::Crlf);
//! bundle.push(HexArrayFormatter::new().declare("certificate", &der)?);
//! assert_eq!(
//!     bundle.render(),
//!     "const uint8_t certificate[1] = {\r\n0x41, \r\n};\r\n"
//! );
//! # Ok::<(), fwembed_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod array;
pub mod bundle;
pub mod envelope;
pub mod error;
pub mod http;
pub mod key;
pub mod wav;

// Re-export primary types for convenience
pub use array::{
    parse_body, parse_declaration, sanitize_identifier, ArrayDeclaration, FormatterConfig,
    HexArrayFormatter, LineEnding, DEFAULT_WRAP_WIDTH,
};
pub use bundle::ArrayBundle;
pub use envelope::{EnvelopeDescriptor, EnvelopeTable};
pub use error::{Error, Result};
pub use http::{content_type_for, HeaderTemplate};
pub use key::RsaComponents;
pub use wav::{WavFile, WavHeader};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
