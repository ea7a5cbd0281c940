//! Checker state.
//!
//! `CheckerState` is split across several modules, each adding an
//! `impl CheckerState` block:
//! - `lifecycle` - `init`/`start`/`validate`/`stop`/`refresh_bound_types`
//! - `statements` - the start walk over declarations and statements
//! - `expr` - `resolve_type` for expressions, inferred-type seeding
//! - `selectors` - identifier chains, selector chains, calls
//! - `validate` - post-resolution checks
//! - `error_reporter` - `display_error`/`display_type_error`
//! - `dependencies` - `collect_dependencies`

use std::sync::Arc;

use strata_ast::NodeArena;
use strata_common::limits;
use strata_solver::{DepthCounter, TypeDatabase, TypeParameter, TypeRef};

use crate::model::SemanticModel;
use crate::scope::{ClassFrame, ScopeStack};

/// Checker configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckerOptions {
    /// Nesting depth past which expressions resolve to `Unresolved`.
    pub max_expression_depth: u32,
    /// Resolve `x.foo` to `getFoo()`/`setFoo()` when no field `foo` exists.
    pub computed_properties: bool,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        CheckerOptions {
            max_expression_depth: limits::MAX_EXPR_CHECK_DEPTH,
            computed_properties: true,
        }
    }
}

/// Shared state of one checking session.
pub struct CheckerContext<'a> {
    pub arena: &'a mut NodeArena,
    pub types: &'a dyn TypeDatabase,
    pub model: &'a mut SemanticModel,
    pub options: CheckerOptions,
    pub(crate) scopes: ScopeStack,
    pub(crate) classes: Vec<ClassFrame>,
    /// Method type variables in scope.
    pub(crate) method_type_params: Vec<Arc<TypeParameter>>,
    /// Expected return types of the enclosing methods and lambdas.
    pub(crate) returns: Vec<TypeRef>,
    pub(crate) depth: DepthCounter,
    pub(crate) walking: bool,
}

pub struct CheckerState<'a> {
    pub ctx: CheckerContext<'a>,
}

impl<'a> CheckerState<'a> {
    pub fn new(
        arena: &'a mut NodeArena,
        types: &'a dyn TypeDatabase,
        model: &'a mut SemanticModel,
        options: CheckerOptions,
    ) -> Self {
        let depth = DepthCounter::new(options.max_expression_depth);
        CheckerState {
            ctx: CheckerContext {
                arena,
                types,
                model,
                options,
                scopes: ScopeStack::new(),
                classes: Vec::new(),
                method_type_params: Vec::new(),
                returns: Vec::new(),
                depth,
                walking: false,
            },
        }
    }

    #[inline]
    pub fn db(&self) -> &'a dyn TypeDatabase {
        self.ctx.types
    }

    pub fn model(&self) -> &SemanticModel {
        self.ctx.model
    }

    pub fn arena(&self) -> &NodeArena {
        self.ctx.arena
    }

    /// Innermost class frame.
    pub(crate) fn current_class(&self) -> Option<&ClassFrame> {
        self.ctx.classes.last()
    }

    pub(crate) fn object_type(&self) -> TypeRef {
        self.db().object_type()
    }

    pub(crate) fn display_type(&self, ty: &TypeRef) -> String {
        ty.display(self.db())
    }

    /// Reset the walk-local context (scopes, class frames).
    pub(crate) fn reset_walk(&mut self) {
        self.ctx.scopes.clear();
        self.ctx.classes.clear();
        self.ctx.method_type_params.clear();
        self.ctx.returns.clear();
        self.ctx.depth.reset();
        self.ctx.walking = false;
    }
}
