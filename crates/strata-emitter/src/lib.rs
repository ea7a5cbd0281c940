//! Lowering and JavaScript emission.
//!
//! This crate provides:
//! - `LoweringPass`, which rewrites a checked tree in place into constructs
//!   the JavaScript target understands (index/iterator loops, truncation
//!   helpers, explicit accessor calls)
//! - `lower_program`, which runs the pass and re-resolves the rewritten tree
//! - `JsPrinter`, which renders a lowered tree as JavaScript source

use strata_ast::{NodeArena, NodeIndex, NodeState};
use strata_checker::{CheckerOptions, CheckerState, SemanticModel};
use strata_solver::TypeDatabase;
use tracing::debug;

pub mod lowering_pass;
pub use lowering_pass::{LoweringPass, LoweringStats};

mod transforms;

pub mod printer;
pub use printer::JsPrinter;

/// ECMAScript edition the printed code targets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Target {
    /// No class fields: statics are assigned after the class body.
    Es2015,
    #[default]
    Es2022,
}

impl Target {
    pub fn from_name(name: &str) -> Option<Target> {
        match name.to_ascii_lowercase().as_str() {
            "es2015" | "es6" => Some(Target::Es2015),
            "es2022" | "esnext" => Some(Target::Es2022),
            _ => None,
        }
    }

    #[inline]
    pub fn has_static_fields(self) -> bool {
        self == Target::Es2022
    }
}

/// How `for (T x : items)` over a non-array is rewritten.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ForEachStrategy {
    /// `for (Iterator<T> it = items.iterator(); it.hasNext();)`.
    #[default]
    Iterator,
    /// `for (int i = 0; i < items.size(); i++)` for lists; other iterables
    /// still use an iterator.
    Index,
}

impl ForEachStrategy {
    pub fn from_name(name: &str) -> Option<ForEachStrategy> {
        match name.to_ascii_lowercase().as_str() {
            "iterator" => Some(ForEachStrategy::Iterator),
            "index" => Some(ForEachStrategy::Index),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoweringOptions {
    pub target: Target,
    pub for_each: ForEachStrategy,
    /// Rewrite computed-property reads, writes and updates into explicit
    /// getter/setter calls.
    pub rewrite_properties: bool,
    /// Route integral `/` through `StrataRuntime.idiv`/`ldiv`.
    pub integer_division: bool,
    /// Route narrowing primitive casts through the truncation helpers.
    pub narrowing_casts: bool,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        LoweringOptions {
            target: Target::default(),
            for_each: ForEachStrategy::default(),
            rewrite_properties: true,
            integer_division: true,
            narrowing_casts: true,
        }
    }
}

/// Lower `root` in place, then stop and re-check it so the model describes
/// the rewritten tree. Replacement nodes end in the `Transformed` state.
pub fn lower_program(
    arena: &mut NodeArena,
    db: &dyn TypeDatabase,
    model: &mut SemanticModel,
    root: NodeIndex,
    options: &LoweringOptions,
    checker: CheckerOptions,
) -> LoweringStats {
    let mut pass = LoweringPass::new(arena, db, model, options.clone());
    let stats = pass.run(root);
    let replacements = pass.into_replacements();
    let mut state = CheckerState::new(arena, db, model, checker);
    state.stop(root);
    state.check(root);
    for idx in replacements {
        if arena.state(idx).is_validated() {
            arena.set_state(idx, NodeState::Transformed);
        }
    }
    debug!(rewrites = stats.total(), diagnostics = model.diagnostics().len(), "[lowering] re-checked");
    stats
}

#[cfg(test)]
#[path = "../tests/lowering_tests.rs"]
mod lowering_tests;

#[cfg(test)]
#[path = "../tests/printer_tests.rs"]
mod printer_tests;
