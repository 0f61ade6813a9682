//! Collecting declarations into one output file.

use crate::array::{ArrayDeclaration, LineEnding};

/// Ordered set of declarations written to a single source file
#[derive(Debug, Clone, Default)]
pub struct ArrayBundle {
    comments: Vec<String>,
    declarations: Vec<ArrayDeclaration>,
    line_ending: LineEnding,
}

impl ArrayBundle {
    /// Creates an empty bundle using the given line terminator
    pub fn new(line_ending: LineEnding) -> Self {
        Self {
            line_ending,
            ..Self::default()
        }
    }

    /// Adds a `//` comment line emitted before the declarations
    ///
    /// Control characters are replaced with spaces so the text stays on one
    /// line.
    pub fn comment(&mut self, text: impl Into<String>) {
        let text: String = text
            .into()
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();
        self.comments.push(text);
    }

    /// Appends a declaration
    pub fn push(&mut self, declaration: ArrayDeclaration) {
        self.declarations.push(declaration);
    }

    /// Declarations in output order
    pub fn declarations(&self) -> &[ArrayDeclaration] {
        &self.declarations
    }

    /// Total number of encoded bytes across all declarations
    pub fn total_bytes(&self) -> usize {
        self.declarations.iter().map(|d| d.count()).sum()
    }

    /// Returns true if the bundle holds no declarations
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Renders the whole file
    pub fn render(&self) -> String {
        let eol = self.line_ending.as_str();
        let mut out = String::new();

        for comment in &self.comments {
            out.push_str("// ");
            out.push_str(comment);
            out.push_str(eol);
        }
        if !self.comments.is_empty() && !self.declarations.is_empty() {
            out.push_str(eol);
        }

        for (i, decl) in self.declarations.iter().enumerate() {
            if i > 0 {
                out.push_str(eol);
            }
            out.push_str(&decl.render());
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{parse_declaration, HexArrayFormatter};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_bundle() {
        let formatter = HexArrayFormatter::new();
        let mut bundle = ArrayBundle::new(LineEnding::Crlf);
        bundle.comment("generated");
        bundle.push(formatter.declare("a", &[1]).unwrap());
        bundle.push(formatter.declare("b", &[2, 3]).unwrap());

        assert_eq!(
            bundle.render(),
            "// generated\r\n\r\n\
             const uint8_t a[1] = {\r\n0x01, \r\n};\r\n\
             \r\n\
             const uint8_t b[2] = {\r\n0x02, 0x03, \r\n};\r\n"
        );
        assert_eq!(bundle.total_bytes(), 3);
    }

    #[test]
    fn test_comment_stays_on_one_line() {
        let mut bundle = ArrayBundle::new(LineEnding::Lf);
        bundle.comment("evil\nname.html\r\tx");
        bundle.push(HexArrayFormatter::new().declare("a", &[1]).unwrap());

        let rendered = bundle.render();
        let first_line = rendered.lines().next().unwrap();
        assert_eq!(first_line, "// evil name.html  x");
        assert_eq!(
            parse_declaration(&rendered).unwrap(),
            ("a".to_string(), vec![1])
        );
    }

    #[test]
    fn test_declarations_parse_back() {
        let formatter = HexArrayFormatter::new();
        let mut bundle = ArrayBundle::new(LineEnding::Crlf);
        bundle.push(formatter.declare("first", &[0xAA; 20]).unwrap());
        bundle.push(formatter.declare("second", &[0x55; 3]).unwrap());

        let rendered = bundle.render();
        let split = rendered.find("const uint8_t second").unwrap();
        assert_eq!(
            parse_declaration(&rendered[..split]).unwrap(),
            ("first".to_string(), vec![0xAA; 20])
        );
        assert_eq!(
            parse_declaration(&rendered[split..]).unwrap(),
            ("second".to_string(), vec![0x55; 3])
        );
    }
}
