//! Common types and utilities for the strata engine.
//!
//! This crate provides foundational types used across all strata crates:
//! - Diagnostic payloads attached to AST nodes (`Diagnostic`, codes, templates)
//! - Source ranges (`TextRange`)
//! - Engine limits and thresholds

// Diagnostics - structured error payloads with message templates
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticMessage, diagnostic_codes, diagnostic_messages,
    format_message,
};

// Position - Source ranges carried over from the parser collaborator
pub mod position;
pub use position::TextRange;

// Centralized limits and thresholds
pub mod limits;
