//! HTTP response framing for embedded web assets.
//!
//! The firmware web server sends a stored asset verbatim, so the stored bytes
//! must already be a complete HTTP response. [`HeaderTemplate`] renders the
//! status line and header fields with a `Content-Length` matching the
//! payload. Every line ends in CRLF and the header closes with an empty line.

use bytes::{BufMut, Bytes, BytesMut};
use std::path::Path;
use tracing::trace;

const CRLF: &[u8] = b"\r\n";

/// Content type used when the extension is unknown
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Returns the MIME type for a file based on its extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Static parts of the synthesized response header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTemplate {
    /// Status line without terminator
    pub status_line: String,
    /// Value of the `Content-Type` field
    pub content_type: String,
    /// Further `(name, value)` fields emitted after `Content-Length`
    pub extra_fields: Vec<(String, String)>,
}

impl Default for HeaderTemplate {
    fn default() -> Self {
        Self {
            status_line: "HTTP/1.1 200 OK".to_string(),
            content_type: "text/html".to_string(),
            extra_fields: vec![("Connection".to_string(), "close".to_string())],
        }
    }
}

impl HeaderTemplate {
    /// Creates a template with the default status line and fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a template whose content type is derived from `path`
    pub fn for_path(path: &Path) -> Self {
        Self::new().content_type(content_type_for(path))
    }

    /// Sets the status line
    pub fn status_line(mut self, line: impl Into<String>) -> Self {
        self.status_line = line.into();
        self
    }

    /// Sets the content type
    pub fn content_type(mut self, ty: impl Into<String>) -> Self {
        self.content_type = ty.into();
        self
    }

    /// Appends a static header field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_fields.push((name.into(), value.into()));
        self
    }

    /// Renders the header for a payload of `content_length` bytes
    pub fn render(&self, content_length: usize) -> Bytes {
        let mut buf = BytesMut::with_capacity(128);

        put_line(&mut buf, &self.status_line);
        put_line(&mut buf, &format!("Content-Type: {}", self.content_type));
        put_line(&mut buf, &format!("Content-Length: {content_length}"));
        for (name, value) in &self.extra_fields {
            put_line(&mut buf, &format!("{name}: {value}"));
        }
        buf.put_slice(CRLF);

        trace!("Rendered {} byte header for {} byte body", buf.len(), content_length);
        buf.freeze()
    }

    /// Returns the header followed by the payload
    pub fn frame(&self, payload: &[u8]) -> Vec<u8> {
        let header = self.render(payload.len());
        let mut buf = BytesMut::with_capacity(header.len() + payload.len());
        buf.put_slice(&header);
        buf.put_slice(payload);
        buf.to_vec()
    }
}

fn put_line(buf: &mut BytesMut, line: &str) {
    buf.put_slice(line.as_bytes());
    buf.put_slice(CRLF);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_default_header() {
        let header = HeaderTemplate::new().render(42);
        assert_eq!(
            &header[..],
            &b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\
               Content-Length: 42\r\nConnection: close\r\n\r\n"[..]
        );
    }

    #[test]
    fn test_frame_prepends_header() {
        let template = HeaderTemplate::for_path(Path::new("logo.PNG"));
        let framed = template.frame(&[0x89, b'P', b'N', b'G']);

        let text = String::from_utf8_lossy(&framed);
        assert!(text.contains("Content-Type: image/png\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(framed.ends_with(b"\r\n\r\n\x89PNG"));
    }

    #[test]
    fn test_extra_fields_and_status() {
        let header = HeaderTemplate::new()
            .status_line("HTTP/1.0 200 OK")
            .field("Cache-Control", "max-age=3600")
            .render(0);
        let text = String::from_utf8(header.to_vec()).unwrap();
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.ends_with("Connection: close\r\nCache-Control: max-age=3600\r\n\r\n"));
        assert!(!text.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("index.htm")), "text/html");
        assert_eq!(content_type_for(Path::new("photo.JPEG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("favicon.ico")), "image/x-icon");
        assert_eq!(content_type_for(Path::new("blob")), DEFAULT_CONTENT_TYPE);
    }
}
