//! Data-binding support for checked strata trees.
//!
//! This crate provides:
//! - `CycleInfo`, the depth-first walker that finds reference cycles in the
//!   graph of bound fields (field → binding expression → field), keyed by
//!   node identity and qualified by a `ThisContext`
//! - `CycleReport`, the trace handed to the binding subsystem, which decides
//!   whether a reported cycle fails construction of the binding
//! - reification hooks turning a binding expression into a descriptor
//!   (`binding_type_name`, `transform_binding_args`), evaluating the
//!   descriptor's dynamic inputs (`eval_binding_args`) and listing the
//!   property paths it listens on (`binding_dependencies`)

pub mod cycle;
pub mod reify;

mod references;

pub use cycle::{ContextRelation, CycleInfo, CyclePolicy, CycleReport, CycleSeverity, MismatchPolicy, ThisContext, VisitEntry};
pub use reify::{BindingDescriptor, binding_dependencies, binding_type_name, eval_binding_args, expression_text, transform_binding_args};

#[cfg(test)]
#[path = "../tests/cycle_tests.rs"]
mod cycle_tests;

#[cfg(test)]
#[path = "../tests/reify_tests.rs"]
mod reify_tests;
