//! Semantic checking for the strata engine.
//!
//! This crate provides:
//! - `declare_types`, which registers the classes of a tree in a
//!   `TypeRegistry`
//! - `CheckerState`, which drives the node lifecycle
//!   (`init`/`start`/`validate`/`stop`) and resolves every expression's type
//! - `SemanticModel`, the side table of resolution results read by the
//!   interpreter and the lowering pass
//! - member bindings (`MemberBinding`, `PropertyAccessor`) fixed at
//!   resolution time

pub mod declare;
pub mod model;
pub mod scope;
pub mod state;

mod dependencies;
mod error_reporter;
mod expr;
mod lifecycle;
mod selectors;
mod statements;
mod validate;

pub use declare::{TypeScope, declare_types, resolve_syntax, resolve_type_name};
pub use dependencies::DependencyMode;
pub use model::{MemberBinding, MethodTarget, PropertyAccessor, Receiver, SemanticModel};
pub use scope::frame_size;
pub use state::{CheckerContext, CheckerOptions, CheckerState};

#[cfg(test)]
#[path = "../tests/checker_tests.rs"]
mod checker_tests;

#[cfg(test)]
#[path = "../tests/lifecycle_tests.rs"]
mod lifecycle_tests;
