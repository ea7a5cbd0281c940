//! Tree-walking interpreter for checked strata trees.
//!
//! This crate provides:
//! - `ExecutionContext`, the frame and current-object stacks of one
//!   interpretation session
//! - `Interpreter`, which executes statements (`exec`) and evaluates
//!   expressions (`evaluate`) using the bindings recorded in a
//!   `SemanticModel`
//! - `Value`, the runtime object model, and the native table backing the
//!   builtin types
//! - `RuntimeError`, the evaluation failures; catchable ones materialise as
//!   builtin exception objects for interpreted `catch` clauses

pub mod context;
pub mod error;
pub mod value;

mod eval;
mod exec;
mod invoke;
mod natives;
mod selectors;

pub use context::ExecutionContext;
pub use error::{RuntimeError, RuntimeResult};
pub use exec::ExecResult;
pub use value::{ArrayData, Closure, NativeState, Object, ObjectRef, Value};

use rustc_hash::FxHashMap;
use strata_ast::NodeArena;
use strata_checker::SemanticModel;
use strata_common::limits::MAX_CALL_DEPTH;
use strata_solver::{TypeDatabase, TypeId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// Nested interpreted calls allowed before evaluation fails.
    pub max_call_depth: u32,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        InterpreterOptions {
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

/// Static fields of one type chain.
#[derive(Debug, Default)]
pub(crate) struct StaticStorage {
    pub fields: FxHashMap<String, Value>,
}

pub struct Interpreter<'a> {
    pub(crate) arena: &'a NodeArena,
    pub(crate) db: &'a dyn TypeDatabase,
    pub(crate) model: &'a SemanticModel,
    pub(crate) options: InterpreterOptions,
    /// Keyed by chain root; present once static initialisation started.
    pub(crate) statics: FxHashMap<TypeId, StaticStorage>,
    /// Lazily created `System.out`.
    pub(crate) system_out: Option<Value>,
    pub(crate) call_depth: u32,
    next_object_id: u32,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        arena: &'a NodeArena,
        db: &'a dyn TypeDatabase,
        model: &'a SemanticModel,
        options: InterpreterOptions,
    ) -> Self {
        Interpreter {
            arena,
            db,
            model,
            options,
            statics: FxHashMap::default(),
            system_out: None,
            call_depth: 0,
            next_object_id: 1,
        }
    }

    pub fn db(&self) -> &'a dyn TypeDatabase {
        self.db
    }

    pub fn arena(&self) -> &'a NodeArena {
        self.arena
    }

    pub fn model(&self) -> &'a SemanticModel {
        self.model
    }

    pub(crate) fn next_id(&mut self) -> u32 {
        let id = self.next_object_id;
        self.next_object_id += 1;
        id
    }
}

#[cfg(test)]
#[path = "../tests/interp_tests.rs"]
mod interp_tests;

#[cfg(test)]
#[path = "../tests/control_flow_tests.rs"]
mod control_flow_tests;
