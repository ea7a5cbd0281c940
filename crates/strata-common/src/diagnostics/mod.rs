//! Diagnostic types and message lookup.
//!
//! Message templates use positional `{0}`, `{1}` placeholders; the argument
//! list is kept alongside the rendered text so tooling can re-render.

use crate::position::TextRange;
use serde::Serialize;

mod data;
pub use data::{DIAGNOSTIC_MESSAGES, diagnostic_codes, diagnostic_messages};

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// A static message template.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// A structured error payload: message plus argument list plus optional range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub message_text: String,
    pub args: Vec<String>,
    /// Arena index of the node the payload is attached to, when known.
    pub node: Option<u32>,
    pub range: Option<TextRange>,
}

impl Diagnostic {
    /// Render `template` with `args` into a diagnostic.
    pub fn from_message(template: &DiagnosticMessage, args: &[&str]) -> Self {
        Diagnostic {
            category: template.category,
            code: template.code,
            message_text: format_message(template.message, args),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            node: None,
            range: None,
        }
    }

    pub fn error(message: impl Into<String>, code: u32) -> Self {
        Diagnostic {
            category: DiagnosticCategory::Error,
            code,
            message_text: message.into(),
            args: Vec::new(),
            node: None,
            range: None,
        }
    }

    pub fn warning(message: impl Into<String>, code: u32) -> Self {
        Diagnostic {
            category: DiagnosticCategory::Warning,
            ..Diagnostic::error(message, code)
        }
    }

    pub fn at_node(mut self, node: u32, range: TextRange) -> Self {
        self.node = Some(node);
        if !range.is_synthesized() {
            self.range = Some(range);
        }
        self
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let category = match self.category {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        match self.range {
            Some(range) => write!(
                f,
                "{category} SC{}: {} [{}..{}]",
                self.code, self.message_text, range.pos, range.end
            ),
            None => write!(f, "{category} SC{}: {}", self.code, self.message_text),
        }
    }
}

pub fn get_message_template(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positional_arguments() {
        let d = Diagnostic::from_message(&diagnostic_messages::TYPE_MISMATCH, &["int", "String"]);
        assert_eq!(d.code, diagnostic_codes::TYPE_MISMATCH);
        assert_eq!(
            d.message_text,
            "Type 'int' is not assignable to type 'String'."
        );
        assert_eq!(d.args, vec!["int".to_string(), "String".to_string()]);
    }

    #[test]
    fn templates_are_indexed_by_code() {
        let template = get_message_template(diagnostic_codes::BINDING_CYCLE).expect("template");
        assert_eq!(template.category, DiagnosticCategory::Error);
        assert!(get_message_template(9_999).is_none());
    }

    #[test]
    fn display_includes_range_when_present() {
        let d = Diagnostic::error("boom", 1).at_node(3, TextRange::new(5, 9));
        assert_eq!(d.to_string(), "error SC1: boom [5..9]");
        let synthesized = Diagnostic::error("boom", 1).at_node(3, TextRange::SYNTHESIZED);
        assert_eq!(synthesized.range, None);
    }
}
