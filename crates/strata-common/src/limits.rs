//! Centralized limits and thresholds for the strata engine.
//!
//! Recursion limits for the type solver (assignability, substitution) live in
//! `strata_solver::recursion::RecursionProfile`; the constants here cover the
//! checker, the interpreter, the binding cycle walker and the lowering pass.

// =============================================================================
// Resolution
// =============================================================================

/// Maximum depth for expression type resolution.
///
/// Each nested expression adds a frame while the checker resolves bound types
/// bottom-up; past this depth the node resolves to `Unresolved`.
pub const MAX_EXPR_CHECK_DEPTH: u32 = 500;

/// Maximum number of hops followed along a layer modification chain.
///
/// `resolve(modified = true)` walks from a type to the most specific layer
/// that modifies it. Chains are acyclic by construction; this only guards
/// against a corrupted registry.
pub const MAX_MODIFICATION_CHAIN: u32 = 256;

/// Maximum depth for supertype walks (`extends`/`implements` closure).
pub const MAX_SUPERTYPE_DEPTH: u32 = 128;

// =============================================================================
// Interpretation
// =============================================================================

/// Maximum interpreted call depth before evaluation fails with a stack
/// overflow error instead of exhausting the native stack.
pub const MAX_CALL_DEPTH: u32 = 256;

/// Maximum number of frames on a single execution context.
pub const MAX_FRAME_DEPTH: usize = 4_096;

// =============================================================================
// Binding / Lowering
// =============================================================================

/// Maximum depth of the binding-graph walk performed by the cycle detector.
///
/// Distinct this-contexts may legitimately revisit the same expression; this
/// bounds the walk when receivers chain without ever closing a cycle
/// (`a.next.next.next...`).
pub const MAX_CYCLE_WALK_DEPTH: u32 = 200;

/// Maximum depth for AST traversal during lowering.
pub const MAX_AST_DEPTH: u32 = 500;

/// Maximum depth for printer recursion.
pub const MAX_EMIT_RECURSION_DEPTH: u32 = 1_000;
