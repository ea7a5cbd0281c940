//! One program taken through the engine: declare, check, interpret, walk
//! bindings for cycles, lower and print.
//!
//! `Session` owns the arena together with the registry and semantic model
//! built from it, so hosts (and the CLI) do not have to thread the three
//! through every stage themselves.

use serde::{Deserialize, Serialize};
use strata_ast::{NodeArena, NodeIndex};
use strata_binding::{CycleInfo, CyclePolicy, CycleReport};
use strata_checker::{CheckerOptions, CheckerState, SemanticModel, declare_types};
use strata_common::Diagnostic;
use strata_emitter::{JsPrinter, LoweringOptions, LoweringStats, Target, lower_program};
use strata_interp::{ExecutionContext, Interpreter, InterpreterOptions, RuntimeResult, Value};
use strata_solver::{TypeDatabase, TypeId, TypeRegistry};
use tracing::debug;

/// Method invoked by `run` when a program file names none.
pub const DEFAULT_ENTRY: (&str, &str) = ("Main", "run");

/// A serialised tree as handed over by a parser: the arena and its root.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramFile {
    pub arena: NodeArena,
    pub root: NodeIndex,
    /// `Type.method` run by `strata run`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

impl ProgramFile {
    pub fn new(arena: NodeArena, root: NodeIndex) -> Self {
        ProgramFile {
            arena,
            root,
            entry: None,
        }
    }

    /// `(type, method)` to run, `Main.run` unless the file says otherwise.
    pub fn entry_point(&self) -> (String, String) {
        match self.entry.as_deref().and_then(|e| e.rsplit_once('.')) {
            Some((ty, method)) => (ty.to_string(), method.to_string()),
            None => (DEFAULT_ENTRY.0.to_string(), DEFAULT_ENTRY.1.to_string()),
        }
    }
}

/// Outcome of running one entry point.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: RuntimeResult<Value>,
    /// Everything the program printed.
    pub output: String,
}

pub struct Session {
    pub arena: NodeArena,
    pub registry: TypeRegistry,
    pub model: SemanticModel,
    pub root: NodeIndex,
    declared: Vec<(NodeIndex, TypeId)>,
}

impl Session {
    /// Register the classes under `root`. Nothing is checked yet.
    pub fn new(arena: NodeArena, root: NodeIndex) -> Self {
        let mut registry = TypeRegistry::new();
        let mut model = SemanticModel::new();
        let declared = declare_types(&arena, root, &mut registry, &mut model);
        Session {
            arena,
            registry,
            model,
            root,
            declared,
        }
    }

    pub fn from_file(file: ProgramFile) -> Self {
        Session::new(file.arena, file.root)
    }

    /// `(node, type)` for every declared class, outer classes first.
    pub fn declared_types(&self) -> &[(NodeIndex, TypeId)] {
        &self.declared
    }

    /// Run `init`, `start` and `validate` over the whole tree and return
    /// the diagnostics attached along the way.
    pub fn check(&mut self, options: CheckerOptions) -> Vec<Diagnostic> {
        CheckerState::new(&mut self.arena, &self.registry, &mut self.model, options).check(self.root);
        let diagnostics = self.diagnostics();
        debug!(count = diagnostics.len(), "[session] checked");
        diagnostics
    }

    /// Discard every resolution result and check again from scratch.
    pub fn restart(&mut self, options: CheckerOptions) -> Vec<Diagnostic> {
        let mut state = CheckerState::new(&mut self.arena, &self.registry, &mut self.model, options);
        state.stop(self.root);
        state.check(self.root);
        self.diagnostics()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.model.diagnostics().into_iter().cloned().collect()
    }

    pub fn has_errors(&self) -> bool {
        self.model.diagnostics().iter().any(|d| d.is_error())
    }

    /// Call the static method `type_name.method` with no arguments.
    pub fn run(&self, type_name: &str, method: &str, options: InterpreterOptions) -> RunOutcome {
        let mut interpreter = Interpreter::new(&self.arena, &self.registry, &self.model, options);
        let mut ctx = ExecutionContext::new();
        let result = interpreter.call_static(&mut ctx, type_name, method, Vec::new());
        debug!(type_name, method, ok = result.is_ok(), "[session] ran");
        RunOutcome {
            result,
            output: ctx.take_output(),
        }
    }

    /// Binding cycles (and mismatch warnings) among the bound fields.
    pub fn cycles(&self, policy: CyclePolicy) -> Vec<CycleReport> {
        CycleInfo::new(&self.arena, &self.registry, &self.model, policy).check_tree(self.root)
    }

    /// Lower the checked tree in place; the model is rebuilt for the
    /// rewritten tree.
    pub fn lower(&mut self, options: &LoweringOptions, checker: CheckerOptions) -> LoweringStats {
        lower_program(
            &mut self.arena,
            &self.registry,
            &mut self.model,
            self.root,
            options,
            checker,
        )
    }

    pub fn print_js(&self, target: Target) -> String {
        JsPrinter::new(&self.arena, &self.registry, &self.model, target).print(self.root)
    }

    pub fn find_type(&self, name: &str) -> Option<TypeId> {
        self.registry.find_type(name)
    }
}
