//! Arena-allocated expression/statement tree.
//!
//! This crate provides:
//! - `NodeIndex`/`NodeList` handles into the arena
//! - `NodeData`, the closed sum type of every expression, statement and
//!   declaration kind, plus the per-node lifecycle `NodeState`
//! - `NodeArena` with parent links and in-place child replacement
//! - Builder helpers for programmatic construction
//! - `TypeSyntax`, the unresolved spelling of a type reference

pub mod base;
pub use base::{NodeIndex, NodeList};

pub mod ops;
pub use ops::{AssignOp, BinaryOp, BindingDirection, LiteralValue, UnaryOp};

pub mod syntax;
pub use syntax::{TypeSyntax, TypeSyntaxError};

pub mod node;
pub use node::{ClassKind, ModifierFlags, Node, NodeData, NodeState, Param, TypeParamSyntax};

pub mod node_arena;
pub use node_arena::NodeArena;

pub mod factory;
pub use factory::{ClassSpec, no_args, param};
