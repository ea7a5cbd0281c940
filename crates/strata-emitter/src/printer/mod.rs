//! JavaScript printer.
//!
//! Prints a checked (and usually lowered) tree as a standalone script.
//! Expressions render to strings; statements and declarations write lines
//! into the output buffer. Runtime helpers and exception classes the program
//! references are collected while printing and emitted in front of it.

mod declarations;
mod expressions;
mod runtime;
mod statements;

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use strata_ast::{NodeArena, NodeIndex};
use strata_checker::SemanticModel;
use strata_common::limits::MAX_EMIT_RECURSION_DEPTH;
use strata_solver::{DepthCounter, TypeDatabase, TypeId, TypeOrigin, is_subtype_of};
use tracing::debug;

use crate::Target;
pub(crate) use runtime::Helper;

pub struct JsPrinter<'a> {
    pub(crate) arena: &'a NodeArena,
    pub(crate) db: &'a dyn TypeDatabase,
    pub(crate) model: &'a SemanticModel,
    pub(crate) target: Target,
    output: String,
    indent_level: usize,
    pub(crate) helpers: BTreeSet<Helper>,
    /// Compiled exception types the program mentions.
    pub(crate) exceptions: BTreeSet<TypeId>,
    /// Method names declared with more than one arity; printed as `name$arity`.
    pub(crate) overloaded: FxHashSet<String>,
    pub(crate) depth: DepthCounter,
}

impl<'a> JsPrinter<'a> {
    pub fn new(
        arena: &'a NodeArena,
        db: &'a dyn TypeDatabase,
        model: &'a SemanticModel,
        target: Target,
    ) -> Self {
        JsPrinter {
            arena,
            db,
            model,
            target,
            output: String::new(),
            indent_level: 0,
            helpers: BTreeSet::new(),
            exceptions: BTreeSet::new(),
            overloaded: FxHashSet::default(),
            depth: DepthCounter::new(MAX_EMIT_RECURSION_DEPTH),
        }
    }

    pub fn print(mut self, root: NodeIndex) -> String {
        self.overloaded = self.collect_overloads();
        self.emit_top_level(root);
        let body = std::mem::take(&mut self.output);

        let mut prelude = String::new();
        for helper in self.helpers.clone() {
            if let Some(exception) = helper.throws().and_then(|name| self.db.find_type(name)) {
                self.exceptions.insert(exception);
            }
        }
        for helper in &self.helpers {
            prelude.push_str(helper.source());
        }
        prelude.push_str(&self.exception_classes());
        debug!(
            helpers = self.helpers.len(),
            exceptions = self.exceptions.len(),
            bytes = prelude.len() + body.len(),
            "[printer] done"
        );
        if prelude.is_empty() {
            return body;
        }
        prelude.push('\n');
        prelude + &body
    }

    /// Method names with several arities among the program's own types.
    fn collect_overloads(&self) -> FxHashSet<String> {
        let mut arities: FxHashMap<String, BTreeSet<usize>> = FxHashMap::default();
        for (_, id) in self.model.declared_types() {
            let Some(decl) = self.db.declaration(id) else {
                continue;
            };
            for method in &decl.methods {
                arities
                    .entry(method.name.clone())
                    .or_default()
                    .insert(method.params.len());
            }
        }
        arities
            .into_iter()
            .filter(|(_, set)| set.len() > 1)
            .map(|(name, _)| name)
            .collect()
    }

    /// Referenced exception classes with their ancestors, parents first.
    fn exception_classes(&self) -> String {
        let Some(throwable) = self.db.well_known().throwable else {
            return String::new();
        };
        let mut chain: Vec<(usize, TypeId)> = Vec::new();
        let mut seen = FxHashSet::default();
        for &id in &self.exceptions {
            let mut current = Some(id);
            let mut ancestors = Vec::new();
            while let Some(cur) = current {
                ancestors.push(cur);
                if cur == throwable {
                    break;
                }
                current = self
                    .db
                    .declaration(cur)
                    .and_then(|d| d.extends.as_ref())
                    .and_then(|ty| ty.class_id());
            }
            let depth = ancestors.len();
            for (i, ancestor) in ancestors.into_iter().enumerate() {
                if seen.insert(ancestor) {
                    chain.push((depth - i, ancestor));
                }
            }
        }
        chain.sort();

        let mut out = String::new();
        for (_, id) in chain {
            let Some(decl) = self.db.declaration(id) else {
                continue;
            };
            if id == throwable {
                out.push_str(runtime::THROWABLE_SOURCE);
                continue;
            }
            let parent = decl
                .extends
                .as_ref()
                .and_then(|ty| ty.class_id())
                .and_then(|p| self.db.declaration(p))
                .map_or("Throwable", |p| p.name.as_str());
            out.push_str(&format!("class {} extends {} {{}}\n", decl.name, parent));
        }
        out
    }

    /// Name a type is reachable under in the printed program.
    pub(crate) fn type_name(&mut self, id: TypeId) -> String {
        let Some(decl) = self.db.declaration(id) else {
            return "Object".to_string();
        };
        if decl.origin == TypeOrigin::Dynamic {
            return decl.name.clone();
        }
        if let Some(global) = runtime::global_name(&decl.qualified_name) {
            return global.to_string();
        }
        if decl.qualified_name == "java.lang.StringBuilder" {
            self.helpers.insert(Helper::StringBuilder);
        } else if self.is_throwable(id) {
            self.exceptions.insert(id);
        }
        decl.name.clone()
    }

    pub(crate) fn is_throwable(&self, id: TypeId) -> bool {
        self.db
            .well_known()
            .throwable
            .is_some_and(|throwable| is_subtype_of(self.db, id, throwable))
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub(crate) fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    pub(crate) fn write_line(&mut self) {
        self.output.push('\n');
    }

    pub(crate) fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str("    ");
        }
    }

    /// Indented line.
    pub(crate) fn line(&mut self, s: &str) {
        self.write_indent();
        self.write(s);
        self.write_line();
    }

    pub(crate) fn increase_indent(&mut self) {
        self.indent_level += 1;
    }

    pub(crate) fn decrease_indent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Run `emit` against an empty buffer and return what it wrote.
    pub(crate) fn capture(&mut self, emit: impl FnOnce(&mut Self)) -> String {
        let saved = std::mem::take(&mut self.output);
        emit(self);
        std::mem::replace(&mut self.output, saved)
    }
}
