//! Syntactic type references.
//!
//! A `TypeSyntax` is the unresolved spelling of a type as it appears in the
//! source (`int`, `java.util.List<String>`, `Foo[][]`). Resolution against the
//! type database happens in the checker.

use serde::{Deserialize, Serialize};

/// Unresolved type reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSyntax {
    /// Simple or dotted name. `?` denotes a wildcard type argument.
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeSyntax>,
    /// Number of array dimensions.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub dims: u8,
}

fn is_zero(dims: &u8) -> bool {
    *dims == 0
}

pub const PRIMITIVE_NAMES: &[&str] = &[
    "boolean", "byte", "short", "char", "int", "long", "float", "double", "void",
];

impl TypeSyntax {
    pub fn named(name: impl Into<String>) -> Self {
        TypeSyntax {
            name: name.into(),
            args: Vec::new(),
            dims: 0,
        }
    }

    pub fn void() -> Self {
        TypeSyntax::named("void")
    }

    pub fn with_args(mut self, args: Vec<TypeSyntax>) -> Self {
        self.args = args;
        self
    }

    /// The same type with one more array dimension.
    pub fn array_of(mut self) -> Self {
        self.dims += 1;
        self
    }

    /// Element type of an array type (one dimension removed).
    pub fn element(&self) -> Option<TypeSyntax> {
        if self.dims == 0 {
            return None;
        }
        let mut element = self.clone();
        element.dims -= 1;
        Some(element)
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.dims > 0
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.dims == 0 && self.name == "void"
    }

    #[inline]
    pub fn is_primitive(&self) -> bool {
        self.dims == 0 && PRIMITIVE_NAMES.contains(&self.name.as_str())
    }

    /// Last segment of a dotted name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Parse a type spelling such as `Map<String, List<Integer>>[]`.
    pub fn parse(text: &str) -> Result<TypeSyntax, TypeSyntaxError> {
        let mut parser = TypeSyntaxParser {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

impl std::fmt::Display for TypeSyntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Error returned when a type spelling cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSyntaxError {
    pub text: String,
    pub position: usize,
    pub message: &'static str,
}

impl std::fmt::Display for TypeSyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid type '{}' at offset {}: {}",
            self.text, self.position, self.message
        )
    }
}

impl std::error::Error for TypeSyntaxError {}

struct TypeSyntaxParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl TypeSyntaxParser<'_> {
    fn error(&self, message: &'static str) -> TypeSyntaxError {
        TypeSyntaxError {
            text: self.text.to_string(),
            position: self.pos,
            message,
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.bytes.get(self.pos) == Some(&byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> Result<TypeSyntax, TypeSyntaxError> {
        self.skip_ws();
        let name = if self.eat(b'?') {
            "?".to_string()
        } else {
            self.parse_name()?
        };
        let mut ty = TypeSyntax::named(name);
        if self.eat(b'<') {
            loop {
                ty.args.push(self.parse_type()?);
                if self.eat(b',') {
                    continue;
                }
                if self.eat(b'>') {
                    break;
                }
                return Err(self.error("expected ',' or '>'"));
            }
        }
        while self.eat(b'[') {
            if !self.eat(b']') {
                return Err(self.error("expected ']'"));
            }
            ty.dims += 1;
        }
        Ok(ty)
    }

    fn parse_name(&mut self) -> Result<String, TypeSyntaxError> {
        self.skip_ws();
        let start = self.pos;
        loop {
            let segment_start = self.pos;
            while self.pos < self.bytes.len()
                && (self.bytes[self.pos].is_ascii_alphanumeric()
                    || self.bytes[self.pos] == b'_'
                    || self.bytes[self.pos] == b'$')
            {
                self.pos += 1;
            }
            if self.pos == segment_start {
                return Err(self.error("expected identifier"));
            }
            if self.bytes.get(self.pos) == Some(&b'.') {
                self.pos += 1;
                continue;
            }
            break;
        }
        Ok(self.text[start..self.pos].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_generics_and_arrays() {
        let ty = TypeSyntax::parse("java.util.Map<String, List<Integer>>[]").unwrap();
        assert_eq!(ty.name, "java.util.Map");
        assert_eq!(ty.dims, 1);
        assert_eq!(ty.args.len(), 2);
        assert_eq!(ty.args[1].name, "List");
        assert_eq!(ty.args[1].args[0].name, "Integer");
        assert_eq!(ty.to_string(), "java.util.Map<String, List<Integer>>[]");
        assert_eq!(ty.simple_name(), "Map");
    }

    #[test]
    fn parses_wildcards_and_primitives() {
        let ty = TypeSyntax::parse("List<?>").unwrap();
        assert_eq!(ty.args[0].name, "?");
        assert!(TypeSyntax::parse("int").unwrap().is_primitive());
        assert!(!TypeSyntax::parse("int[]").unwrap().is_primitive());
        assert_eq!(
            TypeSyntax::parse("int[][]").unwrap().element().unwrap(),
            TypeSyntax::parse("int[]").unwrap()
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(TypeSyntax::parse("List<String").is_err());
        assert!(TypeSyntax::parse("int[").is_err());
        assert!(TypeSyntax::parse("a..b").is_err());
        assert!(TypeSyntax::parse("int x").is_err());
    }
}
