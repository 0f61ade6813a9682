//! C array rendering.
//!
//! This module turns byte payloads into C source declarations of the form
//!
//! ```text
//! const uint8_t name[count] = {
//! 0x00, 0x01, ...
//! };
//! ```
//!
//! ## Layout
//!
//! - Each byte is a zero-padded, two-digit uppercase literal followed by `", "`.
//! - A line break follows every `wrap_width` elements (15 by default).
//! - The declared count is always the number of bytes encoded.
//! - Lines end in CRLF unless [`LineEnding::Lf`] is selected.
//!
//! [`parse_body`] reverses the body encoding, so generated files can be read
//! back and checked.

mod parse;

use crate::error::{Error, Result};
use std::fmt::Write as FmtWrite;
use tracing::trace;

pub use parse::{parse_body, parse_declaration};

/// Default number of elements per output line
pub const DEFAULT_WRAP_WIDTH: usize = 15;

/// Line terminator used in the generated source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\r\n`, expected by the firmware build environment
    #[default]
    Crlf,
    /// `\n`
    Lf,
}

impl LineEnding {
    /// Returns the terminator string
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Crlf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

/// Configuration for the hex array formatter
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Elements per line before a break is inserted
    pub wrap_width: usize,
    /// Line terminator
    pub line_ending: LineEnding,
    /// C element type of the declared array
    pub element_type: String,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            wrap_width: DEFAULT_WRAP_WIDTH,
            line_ending: LineEnding::Crlf,
            element_type: "uint8_t".to_string(),
        }
    }
}

impl FormatterConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of elements per line
    pub fn wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width;
        self
    }

    /// Sets the line terminator
    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Sets the C element type
    pub fn element_type(mut self, ty: impl Into<String>) -> Self {
        self.element_type = ty.into();
        self
    }
}

/// A rendered array declaration
///
/// Only [`HexArrayFormatter`] builds these, so the count always matches the
/// encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayDeclaration {
    name: String,
    qualifier: Option<String>,
    count: usize,
    body: String,
    element_type: String,
    line_ending: LineEnding,
}

impl ArrayDeclaration {
    /// C identifier of the array
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage qualifier placed after the brackets, e.g. `PROGMEM`
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Number of elements; always the number of encoded bytes
    pub fn count(&self) -> usize {
        self.count
    }

    /// Encoded, line-wrapped element list
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Renders the full declaration, terminated by the configured line ending
    pub fn render(&self) -> String {
        let eol = self.line_ending.as_str();
        let qualifier = self
            .qualifier
            .as_deref()
            .map(|q| format!(" {q}"))
            .unwrap_or_default();

        let mut out = format!(
            "const {} {}[{}]{} = {{{}",
            self.element_type, self.name, self.count, qualifier, eol
        );
        let body = self.body.strip_suffix(eol).unwrap_or(&self.body);
        if !body.is_empty() {
            out.push_str(body);
            out.push_str(eol);
        }
        out.push_str("};");
        out.push_str(eol);
        out
    }
}

/// Formats byte payloads as C array declarations
#[derive(Debug, Clone, Default)]
pub struct HexArrayFormatter {
    config: FormatterConfig,
}

impl HexArrayFormatter {
    /// Creates a new formatter with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new formatter with custom configuration
    pub fn with_config(config: FormatterConfig) -> Result<Self> {
        if config.wrap_width == 0 {
            return Err(Error::InvalidWrapWidth);
        }
        Ok(Self { config })
    }

    /// Returns the active configuration
    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Encodes the bytes as `0xNN, ` literals with a break after every
    /// `wrap_width` elements
    pub fn format_body(&self, data: &[u8]) -> String {
        let eol = self.config.line_ending.as_str();
        // "0xNN, " is six characters
        let breaks = data.len() / self.config.wrap_width;
        let mut body = String::with_capacity(data.len() * 6 + breaks * eol.len());

        for (i, byte) in data.iter().enumerate() {
            // Writing to a String cannot fail
            let _ = write!(body, "0x{byte:02X}, ");
            if (i + 1) % self.config.wrap_width == 0 {
                body.push_str(eol);
            }
        }

        body
    }

    /// Builds a named declaration for the bytes
    pub fn declare(&self, name: &str, data: &[u8]) -> Result<ArrayDeclaration> {
        validate_identifier(name)?;
        trace!("Formatting {} bytes as '{}'", data.len(), name);

        Ok(ArrayDeclaration {
            name: name.to_string(),
            qualifier: None,
            count: data.len(),
            body: self.format_body(data),
            element_type: self.config.element_type.clone(),
            line_ending: self.config.line_ending,
        })
    }

    /// Builds a named declaration carrying a storage qualifier
    pub fn declare_with_qualifier(
        &self,
        name: &str,
        qualifier: &str,
        data: &[u8],
    ) -> Result<ArrayDeclaration> {
        let mut decl = self.declare(name, data)?;
        decl.qualifier = Some(qualifier.to_string());
        Ok(decl)
    }
}

/// Checks that `name` is a C identifier
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArrayName {
            name: name.to_string(),
        })
    }
}

/// Turns an arbitrary string (typically a file name) into a C identifier
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, and a leading digit
/// gets a `_` prefix.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut ident: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}
