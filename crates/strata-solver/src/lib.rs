//! Type resolution for the strata engine.
//!
//! This crate owns the type side of the engine:
//! - `TypeRef`/`TypeDecl`, the resolved identity of compiled and dynamic types
//! - `TypeDatabase`, the lookup contract the layered build system satisfies,
//!   and `TypeRegistry`, the in-process implementation with builtin types
//! - assignability (`is_assignable_from`) and boxing rules
//! - `TypeContext`/`TypeParamContext` for type-variable substitution
//! - member lookup and overload selection (`find_field`, `find_method`)
//! - recursion guards shared with the checker

pub mod builtins;
pub mod compat;
pub mod context;
pub mod db;
pub mod recursion;
pub mod registry;
pub mod signature;
pub mod types;

pub use compat::{
    as_super, boxed_type, direct_supertypes, is_assignable_from, is_compatible,
    is_strictly_assignable_from, is_subtype_of, unboxed_kind,
};
pub use context::{TypeContext, TypeParamContext, declared_type_params, erase};
pub use db::{TypeDatabase, WellKnown};
pub use recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
pub use registry::{RegistryError, TypeRegistry, chain_root, layers};
pub use signature::{
    FieldMatch, MethodLookup, MethodMatch, find_constructor, find_field, find_method,
    find_override, functional_method, iteration_element,
};
pub use types::{
    FieldDecl, MethodDecl, PrimitiveKind, TypeDecl, TypeId, TypeKind, TypeOrigin, TypeParameter,
    TypeRef,
};
