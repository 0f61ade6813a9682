//! Reading generated arrays back into bytes.

use crate::error::{Error, Result};

/// Parses an array body (`0xNN, 0xNN, ...` with arbitrary line breaks)
/// back into the bytes it encodes.
pub fn parse_body(body: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(body.len() / 6);

    for (index, token) in body
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .enumerate()
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .ok_or_else(|| {
                Error::invalid_array_body(format!("element {index} '{token}' lacks a 0x prefix"))
            })?;

        if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::invalid_array_body(format!(
                "element {index} '{token}' is not a two-digit literal"
            )));
        }

        let value = u8::from_str_radix(digits, 16).map_err(|e| {
            Error::invalid_array_body(format!("element {index} '{token}': {e}"))
        })?;
        bytes.push(value);
    }

    Ok(bytes)
}

/// Parses a single rendered declaration, returning its name and bytes.
///
/// The declared count must match the number of elements.
pub fn parse_declaration(text: &str) -> Result<(String, Vec<u8>)> {
    let open = text
        .find('{')
        .ok_or_else(|| Error::invalid_array_body("missing '{'"))?;
    let close = text[open..]
        .find("};")
        .map(|p| p + open)
        .ok_or_else(|| Error::invalid_array_body("missing '};'"))?;

    let head = &text[..open];
    let lbracket = head
        .find('[')
        .ok_or_else(|| Error::invalid_array_body("missing '['"))?;
    let rbracket = head[lbracket..]
        .find(']')
        .map(|p| p + lbracket)
        .ok_or_else(|| Error::invalid_array_body("missing ']'"))?;

    let name = head[..lbracket]
        .split_whitespace()
        .last()
        .ok_or_else(|| Error::invalid_array_body("missing array name"))?
        .to_string();

    let declared: usize = head[lbracket + 1..rbracket].trim().parse().map_err(|_| {
        Error::invalid_array_body(format!(
            "count '{}' is not a number",
            &head[lbracket + 1..rbracket]
        ))
    })?;

    let bytes = parse_body(&text[open + 1..close])?;
    if bytes.len() != declared {
        return Err(Error::invalid_array_body(format!(
            "'{name}' declares {declared} elements but holds {}",
            bytes.len()
        )));
    }

    Ok((name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_ignores_layout() {
        let body = "0x00, 0xFF,\r\n 0x10, \n";
        assert_eq!(parse_body(body).unwrap(), vec![0x00, 0xFF, 0x10]);
    }

    #[test]
    fn test_parse_body_rejects_bad_tokens() {
        assert!(parse_body("0x1, ").is_err());
        assert!(parse_body("FF, ").is_err());
        assert!(parse_body("0xZZ, ").is_err());
        assert!(parse_body("0x+F, ").is_err());
        assert!(parse_body("0x-1, ").is_err());
    }

    #[test]
    fn test_parse_declaration() {
        let text = "const uint8_t sound[2] PROGMEM = {\r\n0x80, 0x7F, \r\n};\r\n";
        let (name, bytes) = parse_declaration(text).unwrap();
        assert_eq!(name, "sound");
        assert_eq!(bytes, vec![0x80, 0x7F]);
    }

    #[test]
    fn test_parse_declaration_count_mismatch() {
        let text = "const uint8_t x[3] = {\n0x01, \n};\n";
        assert!(matches!(
            parse_declaration(text),
            Err(Error::InvalidArrayBody { .. })
        ));
    }
}
