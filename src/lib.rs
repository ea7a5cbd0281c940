//! Evaluation, resolution and lowering engine for a layered Java-like
//! language.
//!
//! The engine is split across the workspace crates, re-exported here:
//! - `ast`: the arena-allocated expression/statement tree and its factory
//! - `solver`: type references, the type registry and assignability
//! - `checker`: the node lifecycle, type resolution and the semantic model
//! - `interp`: the tree-walking interpreter
//! - `binding`: binding cycle detection and reification
//! - `emitter`: lowering transforms and the JavaScript printer
//!
//! `Session` drives one program through all of them.

pub use strata_ast as ast;
pub use strata_binding as binding;
pub use strata_checker as checker;
pub use strata_common as common;
pub use strata_emitter as emitter;
pub use strata_interp as interp;
pub use strata_solver as solver;

// One program through the pipeline
pub mod program;
pub use program::{DEFAULT_ENTRY, ProgramFile, RunOutcome, Session};

// Subscriber setup for the binary (STRATA_LOG / STRATA_LOG_FORMAT)
pub mod tracing_config;

// Command-line front end
#[cfg(feature = "cli")]
pub mod cli;
