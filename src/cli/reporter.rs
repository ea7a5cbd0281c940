use colored::Colorize;

use strata_ast::{NodeArena, NodeIndex};
use strata_common::{Diagnostic, DiagnosticCategory};

/// Renders diagnostics for the terminal, naming the node each one is
/// attached to.
pub struct Reporter<'a> {
    color: bool,
    arena: Option<&'a NodeArena>,
}

impl<'a> Reporter<'a> {
    pub fn new(color: bool) -> Self {
        Reporter { color, arena: None }
    }

    pub fn with_arena(mut self, arena: &'a NodeArena) -> Self {
        self.arena = Some(arena);
        self
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diagnostic in diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = self.format_location(diagnostic);
        output.push_str(" - ");
        output.push_str(&self.format_category(diagnostic.category));
        output.push(' ');
        output.push_str(&self.format_code(diagnostic.code));
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);
        output
    }

    /// `node 12 (Identifier) 40..45`, or whatever part of it is known.
    fn format_location(&self, diagnostic: &Diagnostic) -> String {
        let mut location = match diagnostic.node {
            Some(node) => {
                let kind = self
                    .arena
                    .map(|arena| arena.kind_name(NodeIndex(node)))
                    .unwrap_or("node");
                format!("node {node} ({kind})")
            }
            None => "<program>".to_string(),
        };
        if let Some(range) = diagnostic.range {
            location.push_str(&format!(" {}..{}", range.pos, range.end));
        }
        if self.color {
            location.cyan().to_string()
        } else {
            location
        }
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion | DiagnosticCategory::Message => label.blue().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let text = format!("SC{code}");
        if self.color {
            text.dimmed().to_string()
        } else {
            text
        }
    }
}
