//! Type-parameter contexts.
//!
//! A [`TypeParamContext`] answers "what does type variable `T` stand for
//! here?". Call sites build a [`TypeContext`] from the receiver's type
//! arguments, extend it by inference from the actual arguments, and
//! substitute it into the candidate signature.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::compat::{as_super, boxed_type};
use crate::db::TypeDatabase;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{TypeId, TypeParameter, TypeRef};

pub trait TypeParamContext {
    /// The type bound to `param`, if any.
    fn type_for_param(&self, param: &TypeParameter) -> Option<TypeRef>;

    /// Fallback for an unbound parameter: its erasure (the bound, or
    /// `Object`).
    fn default_type(&self, db: &dyn TypeDatabase, param: &TypeParameter) -> TypeRef {
        match &param.bound {
            Some(bound) => erase(db, bound),
            None => db.object_type(),
        }
    }
}

/// Replace every type variable by its erasure.
pub fn erase(db: &dyn TypeDatabase, ty: &TypeRef) -> TypeRef {
    TypeContext::new().substitute_or_default(db, ty)
}

/// Name-keyed substitution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeContext {
    bindings: FxHashMap<Arc<str>, TypeRef>,
}

impl TypeParamContext for TypeContext {
    fn type_for_param(&self, param: &TypeParameter) -> Option<TypeRef> {
        self.bindings.get(&param.name).cloned()
    }
}

impl TypeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `params[i] -> args[i]`. Raw uses (no args) bind nothing.
    pub fn from_params(params: &[Arc<TypeParameter>], args: &[TypeRef]) -> Self {
        let mut ctx = TypeContext::new();
        if params.len() == args.len() {
            for (param, arg) in params.iter().zip(args) {
                ctx.bind(param.name.clone(), arg.clone());
            }
        }
        ctx
    }

    /// Context for members accessed through a receiver of type `ty`.
    pub fn for_receiver(db: &dyn TypeDatabase, ty: &TypeRef) -> Self {
        let Some(id) = ty.class_id() else {
            return TypeContext::new();
        };
        let params = declared_type_params(db, id);
        TypeContext::from_params(&params, ty.type_args())
    }

    pub fn bind(&mut self, name: Arc<str>, ty: TypeRef) {
        self.bindings.insert(name, ty);
    }

    pub fn get(&self, name: &str) -> Option<&TypeRef> {
        self.bindings.get(name)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Merge another context; existing bindings win.
    pub fn extend_from(&mut self, other: &TypeContext) {
        for (name, ty) in &other.bindings {
            self.bindings
                .entry(name.clone())
                .or_insert_with(|| ty.clone());
        }
    }

    /// Substitute bound variables; unbound ones are left in place.
    pub fn substitute(&self, ty: &TypeRef) -> TypeRef {
        let mut depth = DepthCounter::with_profile(RecursionProfile::Substitution);
        self.substitute_inner(None, ty, &mut depth)
    }

    /// Substitute bound variables and erase unbound ones.
    pub fn substitute_or_default(&self, db: &dyn TypeDatabase, ty: &TypeRef) -> TypeRef {
        let mut depth = DepthCounter::with_profile(RecursionProfile::Substitution);
        self.substitute_inner(Some(db), ty, &mut depth)
    }

    fn substitute_inner(
        &self,
        db: Option<&dyn TypeDatabase>,
        ty: &TypeRef,
        depth: &mut DepthCounter,
    ) -> TypeRef {
        if !ty.has_type_params() {
            return ty.clone();
        }
        if !depth.enter() {
            return TypeRef::Unresolved;
        }
        let result = match ty {
            TypeRef::TypeParam(param) => match self.type_for_param(param) {
                Some(bound) => bound,
                None => match db {
                    Some(db) => self.default_type(db, param),
                    None => ty.clone(),
                },
            },
            TypeRef::Array(element) => {
                TypeRef::array_of(self.substitute_inner(db, element, depth))
            }
            TypeRef::Parameterized(id, args) => TypeRef::Parameterized(
                *id,
                args.iter()
                    .map(|a| self.substitute_inner(db, a, depth))
                    .collect(),
            ),
            other => other.clone(),
        };
        depth.leave();
        result
    }

    /// Infer bindings for the variables in `param_ty` from an argument of
    /// type `arg_ty`. Only variables named in `inferable` are bound; the
    /// first inference for a variable wins.
    pub fn infer(
        &mut self,
        db: &dyn TypeDatabase,
        inferable: &[Arc<TypeParameter>],
        param_ty: &TypeRef,
        arg_ty: &TypeRef,
    ) {
        let mut depth = DepthCounter::with_profile(RecursionProfile::Substitution);
        self.infer_inner(db, inferable, param_ty, arg_ty, &mut depth);
    }

    fn infer_inner(
        &mut self,
        db: &dyn TypeDatabase,
        inferable: &[Arc<TypeParameter>],
        param_ty: &TypeRef,
        arg_ty: &TypeRef,
        depth: &mut DepthCounter,
    ) {
        if arg_ty.is_unresolved() || matches!(arg_ty, TypeRef::Null) || !depth.enter() {
            return;
        }
        match param_ty {
            TypeRef::TypeParam(param) => {
                if inferable.iter().any(|p| p.name == param.name) && !self.is_bound(&param.name) {
                    let inferred = match arg_ty.primitive() {
                        Some(kind) => boxed_type(db, kind).unwrap_or_else(|| arg_ty.clone()),
                        None => arg_ty.clone(),
                    };
                    self.bind(param.name.clone(), inferred);
                }
            }
            TypeRef::Array(element) => {
                if let Some(arg_element) = arg_ty.element() {
                    self.infer_inner(db, inferable, element, arg_element, depth);
                }
            }
            TypeRef::Parameterized(id, params) => {
                if let Some(viewed) = as_super(db, arg_ty, *id) {
                    for (p, a) in params.iter().zip(viewed.type_args()) {
                        self.infer_inner(db, inferable, p, a, depth);
                    }
                }
            }
            _ => {}
        }
        depth.leave();
    }
}

/// Type parameters declared on the root layer of `id`'s chain.
pub fn declared_type_params(db: &dyn TypeDatabase, id: TypeId) -> Vec<Arc<TypeParameter>> {
    let root = crate::registry::chain_root(db, id);
    db.declaration(root)
        .map(|d| d.type_params.clone())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../tests/context_tests.rs"]
mod tests;
