//! Error attachment.
//!
//! A node carries at most one diagnostic: the first one attached wins and
//! later attempts (repeated resolution after a refresh, cascading checks)
//! are no-ops.

use strata_ast::NodeIndex;
use strata_common::diagnostics::diagnostic_messages;
use strata_common::{Diagnostic, DiagnosticMessage};
use strata_solver::TypeRef;
use tracing::trace;

use crate::state::CheckerState;

impl<'a> CheckerState<'a> {
    /// Attach `message` rendered with `args` to `idx`. Returns `false` when
    /// the node already had an error.
    pub fn display_error(&mut self, idx: NodeIndex, message: &DiagnosticMessage, args: &[&str]) -> bool {
        let diag = Diagnostic::from_message(message, args).at_node(idx.0, self.ctx.arena.range(idx));
        let attached = self.ctx.model.attach_error(idx, diag);
        if attached {
            trace!(node = idx.0, code = message.code, "display_error");
        }
        attached
    }

    /// Attach a type mismatch (`actual` is not assignable to `expected`).
    pub fn display_type_error(&mut self, idx: NodeIndex, expected: &TypeRef, actual: &TypeRef) -> bool {
        let expected = self.display_type(expected);
        let actual = self.display_type(actual);
        self.display_error(idx, &diagnostic_messages::TYPE_MISMATCH, &[&actual, &expected])
    }

    /// Whether any node in the subtree rooted at `root` carries an error.
    pub fn has_errors(&self, root: NodeIndex) -> bool {
        self.ctx
            .arena
            .descendants(root)
            .into_iter()
            .any(|idx| self.ctx.model.error(idx).is_some_and(Diagnostic::is_error))
    }

    /// Every diagnostic attached in the subtree rooted at `root`.
    pub fn errors_in(&self, root: NodeIndex) -> Vec<Diagnostic> {
        self.ctx
            .arena
            .descendants(root)
            .into_iter()
            .filter_map(|idx| self.ctx.model.error(idx).cloned())
            .collect()
    }
}
