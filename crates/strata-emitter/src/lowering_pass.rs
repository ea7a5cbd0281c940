//! Lowering pass: rewrites a checked tree for the JavaScript target.
//!
//! The walk is parent-first. A node that needs rewriting is replaced in its
//! parent's child slot and the walk continues into the replacement, so
//! original subexpressions moved under it are lowered as well. Nodes the pass
//! creates carry no semantic information; transforms only consult the model
//! for nodes that existed when the tree was checked.

use serde::Serialize;
use strata_ast::{NodeArena, NodeData, NodeIndex, NodeState};
use strata_checker::SemanticModel;
use strata_common::limits::MAX_AST_DEPTH;
use strata_solver::TypeDatabase;
use tracing::{debug, trace};

use crate::LoweringOptions;

/// Number of rewrites by kind.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoweringStats {
    pub for_each: usize,
    pub casts: usize,
    pub divisions: usize,
    pub properties: usize,
    pub compound_assignments: usize,
}

impl LoweringStats {
    pub fn total(&self) -> usize {
        self.for_each + self.casts + self.divisions + self.properties + self.compound_assignments
    }
}

pub struct LoweringPass<'a> {
    pub(crate) arena: &'a mut NodeArena,
    pub(crate) db: &'a dyn TypeDatabase,
    pub(crate) model: &'a SemanticModel,
    pub(crate) options: LoweringOptions,
    pub(crate) stats: LoweringStats,
    /// Nodes that took the place of a rewritten node.
    replacements: Vec<NodeIndex>,
    next_temp: u32,
    visit_depth: u32,
}

impl<'a> LoweringPass<'a> {
    pub fn new(
        arena: &'a mut NodeArena,
        db: &'a dyn TypeDatabase,
        model: &'a SemanticModel,
        options: LoweringOptions,
    ) -> Self {
        LoweringPass {
            arena,
            db,
            model,
            options,
            stats: LoweringStats::default(),
            replacements: Vec::new(),
            next_temp: 0,
            visit_depth: 0,
        }
    }

    pub fn run(&mut self, root: NodeIndex) -> LoweringStats {
        self.visit(root);
        debug!(
            for_each = self.stats.for_each,
            casts = self.stats.casts,
            divisions = self.stats.divisions,
            properties = self.stats.properties,
            compound = self.stats.compound_assignments,
            "[lowering] done"
        );
        self.stats
    }

    pub fn into_replacements(self) -> Vec<NodeIndex> {
        self.replacements
    }

    fn visit(&mut self, idx: NodeIndex) {
        if idx.is_none() {
            return;
        }
        self.visit_depth += 1;
        if self.visit_depth > MAX_AST_DEPTH {
            debug!(node = idx.0, "[lowering] depth limit reached, subtree left as is");
            self.visit_depth -= 1;
            return;
        }
        let current = match self.lower(idx) {
            Some(replacement) => {
                trace!(from = idx.0, to = replacement.0, "[lowering] replaced");
                self.arena.set_state(replacement, NodeState::Transformed);
                self.replacements.push(replacement);
                replacement
            }
            None => idx,
        };
        for child in self.arena.children(current) {
            self.visit(child);
        }
        self.visit_depth -= 1;
    }

    /// Rewrite `idx` when the target cannot express it; returns the node
    /// now occupying its place.
    fn lower(&mut self, idx: NodeIndex) -> Option<NodeIndex> {
        let data = self.arena.data(idx)?.clone();
        // Captured first: building the replacement re-parents `idx`'s
        // children, and possibly `idx` itself.
        let parent = self.arena.parent_of(idx);
        let replacement = match data {
            NodeData::ForEach {
                ty,
                name,
                expression,
                body,
            } => self.lower_for_each(idx, ty, &name, expression, body),
            NodeData::Cast { expression, .. } if self.options.narrowing_casts => {
                self.lower_cast(idx, expression)
            }
            NodeData::Binary { op, left, right } if self.options.integer_division => {
                self.lower_division(idx, op, left, right)
            }
            NodeData::Unary { op, operand } if op.is_update() && self.options.rewrite_properties => {
                self.lower_property_update(idx, op, operand)
            }
            NodeData::Assignment { op, target, value } => self.lower_assignment(idx, op, target, value),
            NodeData::Identifier { .. } | NodeData::Selector { .. } if self.options.rewrite_properties => {
                self.lower_property_read(idx)
            }
            _ => None,
        }?;
        if parent.is_some() && !self.arena.replace_child(parent, idx, replacement) {
            debug!(node = idx.0, parent = parent.0, "[lowering] parent slot not found");
        }
        Some(replacement)
    }

    /// Suffix shared by the temporaries of one rewrite.
    pub(crate) fn fresh_temp(&mut self) -> u32 {
        let n = self.next_temp;
        self.next_temp += 1;
        n
    }

    /// `StrataRuntime.<helper>(args)`.
    pub(crate) fn runtime_call(&mut self, helper: &str, args: Vec<NodeIndex>) -> NodeIndex {
        self.arena.call(&format!("StrataRuntime.{helper}"), args)
    }
}
