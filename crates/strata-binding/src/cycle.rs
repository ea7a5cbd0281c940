//! Binding-cycle detection.
//!
//! `CycleInfo` walks the binding graph depth-first starting at a bound
//! field. Every visited declaration is recorded in a visited map keyed by
//! node identity together with the `ThisContext` it was reached under; an
//! entry is removed again once the subtree below it is exhausted, so the map
//! only ever holds the current path. Revisiting a node that is still on the
//! path is a cycle when the two contexts may denote the same object.
//!
//! Two reads of the same field through receivers whose types are unrelated
//! (neither assignable to the other) are different objects and never form a
//! cycle. Compatible types reached through different explicit receiver paths
//! (`a.next` vs `b.next`) cannot be decided statically; `MismatchPolicy`
//! chooses how that case is reported.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use strata_ast::{NodeArena, NodeData, NodeIndex};
use strata_checker::SemanticModel;
use strata_common::Diagnostic;
use strata_common::diagnostics::diagnostic_messages;
use strata_common::limits::MAX_CYCLE_WALK_DEPTH;
use strata_solver::{DepthCounter, TypeDatabase, TypeId, is_subtype_of};
use tracing::{debug, trace};

use crate::references::{Reference, ReferenceScan};

/// The object a reference is evaluated against: the type of `this` and the
/// receiver path used to reach it, relative to the binding's own `this`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThisContext {
    pub enclosing: Option<TypeId>,
    /// `None` when the reference goes through the binding's own `this`.
    pub prefix: Option<String>,
}

/// How two visit contexts of the same node relate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContextRelation {
    /// May be the same object.
    Same,
    /// Receiver types are unrelated: different objects.
    Distinct,
    /// Related types reached through different receiver paths.
    Ambiguous,
}

impl ThisContext {
    pub fn of_type(id: TypeId) -> Self {
        ThisContext {
            enclosing: Some(id),
            prefix: None,
        }
    }

    pub fn qualified(enclosing: Option<TypeId>, prefix: impl Into<String>) -> Self {
        ThisContext {
            enclosing,
            prefix: Some(prefix.into()),
        }
    }

    /// Receiver path `path` appended to this context's own prefix.
    pub(crate) fn extend(&self, path: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}.{path}"),
            None => path.to_string(),
        }
    }

    pub fn relation(&self, db: &dyn TypeDatabase, other: &ThisContext) -> ContextRelation {
        if let (Some(a), Some(b)) = (self.enclosing, other.enclosing)
            && a != b
            && !is_subtype_of(db, a, b)
            && !is_subtype_of(db, b, a)
        {
            return ContextRelation::Distinct;
        }
        match (&self.prefix, &other.prefix) {
            (None, None) => ContextRelation::Same,
            (Some(a), Some(b)) if a == b => ContextRelation::Same,
            // `next.size` against `size` may or may not be the same object.
            _ => ContextRelation::Ambiguous,
        }
    }

    pub fn describe(&self, db: &dyn TypeDatabase) -> String {
        let path = self.prefix.as_deref().unwrap_or("this");
        match self.enclosing {
            Some(id) => format!("{path}: {}", db.type_name(id)),
            None => path.to_string(),
        }
    }
}

/// Reporting of the undecidable case: related types reached through receiver
/// paths that differ, or that only one side has.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Treat as a different object.
    Ignore,
    /// Record a warning and do not follow the reference further.
    #[default]
    Warn,
    /// Treat as a cycle.
    Error,
}

impl MismatchPolicy {
    pub fn from_name(name: &str) -> Option<MismatchPolicy> {
        match name.to_ascii_lowercase().as_str() {
            "ignore" => Some(MismatchPolicy::Ignore),
            "warn" | "warning" => Some(MismatchPolicy::Warn),
            "error" => Some(MismatchPolicy::Error),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CyclePolicy {
    pub mismatch: MismatchPolicy,
    /// Longest reference path followed before the walk gives up.
    pub max_depth: u32,
}

impl Default for CyclePolicy {
    fn default() -> Self {
        CyclePolicy {
            mismatch: MismatchPolicy::default(),
            max_depth: MAX_CYCLE_WALK_DEPTH,
        }
    }
}

/// One step of the walk.
#[derive(Clone, Debug, PartialEq)]
pub struct VisitEntry {
    /// Field or method declaration visited.
    pub node: NodeIndex,
    /// Expression the reference was read from (the field itself for the
    /// starting entry).
    pub via: NodeIndex,
    /// `Owner.member` for display.
    pub label: String,
    pub context: ThisContext,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CycleSeverity {
    Error,
    Warning,
}

/// A detected (or, for warnings, suspected) cycle: the path from the start
/// of the walk to the revisit, the revisiting entry last.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    pub severity: CycleSeverity,
    pub chain: Vec<VisitEntry>,
}

impl CycleReport {
    pub fn is_error(&self) -> bool {
        self.severity == CycleSeverity::Error
    }

    /// `A.x -> B.y -> A.x`
    pub fn trace(&self) -> String {
        self.chain
            .iter()
            .map(|entry| entry.label.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Declarations on the loop itself, sorted.
    pub fn members(&self) -> Vec<NodeIndex> {
        let start = self
            .closing_entry()
            .and_then(|last| self.chain.iter().position(|e| e.node == last.node))
            .unwrap_or(0);
        let mut nodes: Vec<NodeIndex> = self.chain[start..].iter().map(|e| e.node).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Where the cycle closes.
    pub fn closing_entry(&self) -> Option<&VisitEntry> {
        self.chain.last()
    }

    /// Like `trace`, with the receiver path of every step.
    pub fn detailed_trace(&self, db: &dyn TypeDatabase) -> String {
        self.chain
            .iter()
            .map(|entry| format!("{} [{}]", entry.label, entry.context.describe(db)))
            .collect::<Vec<_>>()
            .join("\n  -> ")
    }

    pub fn to_diagnostic(&self, arena: &NodeArena) -> Diagnostic {
        let diagnostic = match self.severity {
            CycleSeverity::Error => {
                Diagnostic::from_message(&diagnostic_messages::BINDING_CYCLE, &[&self.trace()])
            }
            CycleSeverity::Warning => {
                let label = self.closing_entry().map_or("", |e| e.label.as_str());
                Diagnostic::from_message(&diagnostic_messages::BINDING_CONTEXT_MISMATCH, &[label])
            }
        };
        match self.chain.first() {
            Some(start) => diagnostic.at_node(start.node.0, arena.range(start.node)),
            None => diagnostic,
        }
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.trace())
    }
}

/// Depth-first cycle walker over the binding graph of one checked tree.
pub struct CycleInfo<'a> {
    arena: &'a NodeArena,
    db: &'a dyn TypeDatabase,
    scan: ReferenceScan<'a>,
    policy: CyclePolicy,
    visited: FxHashMap<NodeIndex, SmallVec<[VisitEntry; 2]>>,
    path: Vec<VisitEntry>,
    depth: DepthCounter,
    cycle: Option<CycleReport>,
    warnings: Vec<CycleReport>,
}

impl<'a> CycleInfo<'a> {
    pub fn new(
        arena: &'a NodeArena,
        db: &'a dyn TypeDatabase,
        model: &'a SemanticModel,
        policy: CyclePolicy,
    ) -> Self {
        let depth = DepthCounter::new(policy.max_depth);
        CycleInfo {
            arena,
            db,
            scan: ReferenceScan { arena, db, model },
            policy,
            visited: FxHashMap::default(),
            path: Vec::new(),
            depth,
            cycle: None,
            warnings: Vec::new(),
        }
    }

    /// Walk the binding graph from the bound field `field`, with `this`
    /// being an instance of the declaring class.
    pub fn check_field(&mut self, field: NodeIndex) -> Option<CycleReport> {
        self.reset();
        let owner = self
            .arena
            .find_ancestor(field, |data| matches!(data, NodeData::ClassDeclaration { .. }))
            .and_then(|class| self.scan.model.declared_type(class));
        let context = match owner {
            Some(id) => ThisContext::of_type(id),
            None => ThisContext::default(),
        };
        self.visit(field, context);
        self.cycle.clone()
    }

    /// Every bound field below `root`, checked in tree order. Cycles and
    /// mismatch warnings are both returned.
    pub fn check_tree(&mut self, root: NodeIndex) -> Vec<CycleReport> {
        let fields: Vec<NodeIndex> = self
            .arena
            .descendants(root)
            .into_iter()
            .filter(|&idx| {
                matches!(
                    self.arena.data(idx),
                    Some(NodeData::FieldDeclaration { binding, initializer, .. })
                        if binding.is_bound() && initializer.is_some()
                )
            })
            .collect();
        let mut reports: Vec<CycleReport> = Vec::new();
        for field in fields {
            let found = self.check_field(field);
            for warning in self.warnings.drain(..) {
                if !reports.contains(&warning) {
                    reports.push(warning);
                }
            }
            if let Some(report) = found {
                // The same loop is found once from each field on it.
                let members = report.members();
                if !reports.iter().any(|r| r.is_error() && r.members() == members) {
                    reports.push(report);
                }
            }
        }
        reports
    }

    /// Visit `node` (a field or method declaration) reached under
    /// `context`. Returns `true` once a cycle has been found; the walk stops
    /// there and the visited map is left as it was at that point.
    pub fn visit(&mut self, node: NodeIndex, context: ThisContext) -> bool {
        let entry = VisitEntry {
            node,
            via: node,
            label: self.scan.label(node),
            context,
        };
        self.visit_entry(entry)
    }

    fn visit_entry(&mut self, entry: VisitEntry) -> bool {
        if self.cycle.is_some() {
            return true;
        }
        let node = entry.node;
        if let Some(prior) = self.visited.get(&node) {
            let mut ambiguous = false;
            let mut same = false;
            for earlier in prior.iter() {
                match earlier.context.relation(self.db, &entry.context) {
                    ContextRelation::Same => same = true,
                    ContextRelation::Ambiguous => ambiguous = true,
                    ContextRelation::Distinct => {}
                }
            }
            if same || (ambiguous && self.policy.mismatch == MismatchPolicy::Error) {
                debug!(node = %node, label = %entry.label, "binding cycle");
                self.cycle = Some(self.report(CycleSeverity::Error, entry));
                return true;
            }
            if ambiguous {
                if self.policy.mismatch == MismatchPolicy::Warn {
                    let warning = self.report(CycleSeverity::Warning, entry);
                    if !self.warnings.contains(&warning) {
                        self.warnings.push(warning);
                    }
                }
                return false;
            }
            trace!(node = %node, "revisit under a distinct receiver type");
        }

        if !self.depth.enter() {
            debug!(node = %node, depth = self.depth.depth(), "cycle walk depth limit reached");
            return false;
        }
        self.visited.entry(node).or_default().push(entry.clone());
        self.path.push(entry.clone());

        let references = self.scan.references(node, &entry.context);
        for Reference { target, via, label, context } in references {
            let next = VisitEntry { node: target, via, label, context };
            if self.visit_entry(next) {
                return true;
            }
        }

        self.path.pop();
        if let Some(entries) = self.visited.get_mut(&node) {
            entries.pop();
            if entries.is_empty() {
                self.visited.remove(&node);
            }
        }
        self.depth.leave();
        false
    }

    fn report(&self, severity: CycleSeverity, closing: VisitEntry) -> CycleReport {
        let mut chain = self.path.clone();
        chain.push(closing);
        CycleReport { severity, chain }
    }

    fn reset(&mut self) {
        self.visited.clear();
        self.path.clear();
        self.depth.reset();
        self.cycle = None;
        self.warnings.clear();
    }

    /// The cycle found by the last walk.
    pub fn cycle(&self) -> Option<&CycleReport> {
        self.cycle.as_ref()
    }

    /// Mismatch warnings recorded by the last walk.
    pub fn warnings(&self) -> &[CycleReport] {
        &self.warnings
    }

    pub fn is_visited(&self, node: NodeIndex) -> bool {
        self.visited.contains_key(&node)
    }

    /// Visit entries currently recorded for `node`.
    pub fn visits(&self, node: NodeIndex) -> &[VisitEntry] {
        self.visited.get(&node).map_or(&[], |entries| entries.as_slice())
    }
}
