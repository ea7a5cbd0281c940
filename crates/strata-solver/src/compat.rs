//! Assignability.
//!
//! `is_assignable_from(target, source)` is the directed compatibility
//! relation between types:
//! - primitives widen (`int -> long -> float -> double`) and box/unbox
//!   against their wrapper classes
//! - classes are nominal: the source must reach the target through
//!   `extends`/`implements`, with every layer of a modification chain
//!   counting as the same type
//! - interfaces are nominal first, then structural: a class providing every
//!   method of a non-empty interface is assignable to it
//! - `null` is assignable to every reference type; type variables are
//!   compared through their bounds

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::context::{TypeContext, declared_type_params, erase};
use crate::db::TypeDatabase;
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::registry::{chain_root, layers};
use crate::types::{PrimitiveKind, TypeId, TypeRef};

/// Wrapper class of a primitive kind.
pub fn boxed_type(db: &dyn TypeDatabase, kind: PrimitiveKind) -> Option<TypeRef> {
    let name = kind.boxed_name()?;
    db.find_type(name).map(TypeRef::Class)
}

/// Primitive kind wrapped by a boxed class type.
pub fn unboxed_kind(db: &dyn TypeDatabase, ty: &TypeRef) -> Option<PrimitiveKind> {
    match ty {
        TypeRef::Primitive(kind) => Some(*kind),
        TypeRef::Class(id) => {
            let decl = db.declaration(*id)?;
            PrimitiveKind::from_boxed_name(&decl.qualified_name)
        }
        _ => None,
    }
}

/// Declared direct supertypes of a chain (unsubstituted).
///
/// `extends` comes from the most specific layer declaring one; `implements`
/// is the union across layers. Every type other than `Object` has at least
/// `Object` as a supertype.
pub fn direct_supertypes(db: &dyn TypeDatabase, id: TypeId) -> Vec<TypeRef> {
    let mut extends = None;
    let mut implements: Vec<TypeRef> = Vec::new();
    for layer in layers(db, id) {
        let Some(decl) = db.declaration(layer) else {
            continue;
        };
        if extends.is_none() {
            extends = decl.extends.clone();
        }
        for iface in &decl.implements {
            if !implements.contains(iface) {
                implements.push(iface.clone());
            }
        }
    }
    let object = db.well_known().object;
    let mut out = Vec::with_capacity(implements.len() + 1);
    match extends {
        Some(ty) => out.push(ty),
        None => {
            if let Some(object) = object
                && chain_root(db, id) != chain_root(db, object)
            {
                out.push(TypeRef::Class(object));
            }
        }
    }
    out.extend(implements);
    out
}

/// View `source` as an instance of `target`'s chain, substituting type
/// arguments along the way (`ArrayList<String>` as `Iterable` is
/// `Iterable<String>`).
pub fn as_super(db: &dyn TypeDatabase, source: &TypeRef, target: TypeId) -> Option<TypeRef> {
    let mut guard = RecursionGuard::with_profile(RecursionProfile::SupertypeWalk);
    as_super_inner(db, source, chain_root(db, target), &mut guard)
}

fn as_super_inner(
    db: &dyn TypeDatabase,
    source: &TypeRef,
    target_root: TypeId,
    guard: &mut RecursionGuard<TypeId>,
) -> Option<TypeRef> {
    let source = match source {
        TypeRef::TypeParam(param) => match &param.bound {
            Some(bound) => bound.clone(),
            None => db.object_type(),
        },
        other => other.clone(),
    };
    let id = source.class_id()?;
    let root = chain_root(db, id);
    if root == target_root {
        return Some(source);
    }
    if !guard.enter(root).is_entered() {
        return None;
    }
    let receiver = TypeContext::for_receiver(db, &source);
    let raw = source.type_args().is_empty() && !declared_type_params(db, id).is_empty();
    let mut found = None;
    for sup in direct_supertypes(db, id) {
        let sup = if raw {
            erase_args(&sup)
        } else {
            receiver.substitute(&sup)
        };
        if let Some(hit) = as_super_inner(db, &sup, target_root, guard) {
            found = Some(hit);
            break;
        }
    }
    guard.leave(root);
    found
}

/// Raw view of a parameterized type.
fn erase_args(ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Parameterized(id, _) => TypeRef::Class(*id),
        other => other.clone(),
    }
}

/// Nominal subclass test between declarations (chains compare by root).
pub fn is_subtype_of(db: &dyn TypeDatabase, sub: TypeId, sup: TypeId) -> bool {
    as_super(db, &TypeRef::Class(sub), sup).is_some()
}

pub fn is_assignable_from(db: &dyn TypeDatabase, target: &TypeRef, source: &TypeRef) -> bool {
    let mut guard = RecursionGuard::with_profile(RecursionProfile::Assignability);
    let result = assignable(db, target, source, true, &mut guard);
    trace!(
        target = %target.display(db),
        source = %source.display(db),
        result,
        "is_assignable_from"
    );
    result
}

/// Assignability without boxing conversions (used to rank overloads).
pub fn is_strictly_assignable_from(
    db: &dyn TypeDatabase,
    target: &TypeRef,
    source: &TypeRef,
) -> bool {
    let mut guard = RecursionGuard::with_profile(RecursionProfile::Assignability);
    assignable(db, target, source, false, &mut guard)
}

/// Either direction: the types may denote the same object.
pub fn is_compatible(db: &dyn TypeDatabase, a: &TypeRef, b: &TypeRef) -> bool {
    is_assignable_from(db, a, b) || is_assignable_from(db, b, a)
}

fn assignable(
    db: &dyn TypeDatabase,
    target: &TypeRef,
    source: &TypeRef,
    allow_boxing: bool,
    guard: &mut RecursionGuard<(TypeId, TypeId)>,
) -> bool {
    if target.is_unresolved() || source.is_unresolved() || target == source {
        return true;
    }
    match (target, source) {
        (TypeRef::Primitive(PrimitiveKind::Void), _) | (_, TypeRef::Primitive(PrimitiveKind::Void)) => {
            false
        }
        (TypeRef::Primitive(t), TypeRef::Primitive(s)) => s.widens_to(*t),
        (TypeRef::Primitive(t), _) => {
            allow_boxing && unboxed_kind(db, source).is_some_and(|s| s.widens_to(*t))
        }
        (_, TypeRef::Null) => true,
        (_, TypeRef::Primitive(s)) => {
            allow_boxing
                && boxed_type(db, *s).is_some_and(|boxed| assignable(db, target, &boxed, false, guard))
        }
        (TypeRef::TypeParam(t), TypeRef::TypeParam(s)) => {
            t.name == s.name
                || s.bound
                    .as_ref()
                    .is_some_and(|bound| assignable(db, target, bound, allow_boxing, guard))
        }
        (TypeRef::TypeParam(_), _) => false,
        (_, TypeRef::TypeParam(s)) => {
            let bound = s.bound.clone().unwrap_or_else(|| db.object_type());
            assignable(db, target, &bound, allow_boxing, guard)
        }
        (TypeRef::Array(t), TypeRef::Array(s)) => {
            if t.is_primitive() || s.is_primitive() {
                t == s
            } else {
                assignable(db, t, s, false, guard)
            }
        }
        (_, TypeRef::Array(_)) => {
            // Arrays are Objects.
            target.class_id().zip(db.well_known().object).is_some_and(|(t, o)| {
                chain_root(db, t) == chain_root(db, o)
            })
        }
        (TypeRef::Array(_), _) => false,
        (TypeRef::Class(t) | TypeRef::Parameterized(t, _), TypeRef::Class(s) | TypeRef::Parameterized(s, _)) => {
            let key = (chain_root(db, *t), chain_root(db, *s));
            if !guard.enter(key).is_entered() {
                // Recursive generic bound: assume compatible.
                return true;
            }
            let result = class_assignable(db, target, source, *t, *s);
            guard.leave(key);
            result
        }
        _ => false,
    }
}

fn class_assignable(
    db: &dyn TypeDatabase,
    target: &TypeRef,
    source: &TypeRef,
    target_id: TypeId,
    source_id: TypeId,
) -> bool {
    match as_super(db, source, target_id) {
        Some(viewed) => type_args_compatible(target.type_args(), viewed.type_args()),
        None => {
            let is_interface = db.declaration(target_id).is_some_and(|d| d.is_interface());
            is_interface && structurally_implements(db, target_id, source_id)
        }
    }
}

/// Invariant type arguments, with raw types and unbound variables treated
/// as wildcards.
fn type_args_compatible(target: &[TypeRef], source: &[TypeRef]) -> bool {
    if target.is_empty() || source.is_empty() || target.len() != source.len() {
        return true;
    }
    target.iter().zip(source).all(|(t, s)| {
        t == s
            || matches!(t, TypeRef::TypeParam(_) | TypeRef::Unresolved)
            || matches!(s, TypeRef::TypeParam(_) | TypeRef::Unresolved)
    })
}

/// Every method of the interface (and its super-interfaces) has a
/// same-named, same-arity counterpart on the source type.
fn structurally_implements(db: &dyn TypeDatabase, iface: TypeId, source: TypeId) -> bool {
    let required = all_methods(db, iface);
    if required.is_empty() {
        return false;
    }
    let provided = all_methods(db, source);
    required.iter().all(|(name, arity, _)| {
        provided
            .iter()
            .any(|(n, a, is_abstract)| n == name && a == arity && !is_abstract)
    })
}

/// `(name, arity, abstract)` of every method visible on a type, excluding
/// those inherited from `Object`.
fn all_methods(db: &dyn TypeDatabase, id: TypeId) -> Vec<(String, usize, bool)> {
    let mut out = Vec::new();
    let mut seen = FxHashSet::default();
    let mut stack = vec![id];
    let object_root = db.well_known().object.map(|o| chain_root(db, o));
    while let Some(current) = stack.pop() {
        let root = chain_root(db, current);
        if Some(root) == object_root || !seen.insert(root) {
            continue;
        }
        for layer in layers(db, current) {
            if let Some(decl) = db.declaration(layer) {
                for m in decl.methods.iter().filter(|m| !m.is_static) {
                    out.push((m.name.clone(), m.params.len(), m.is_abstract));
                }
            }
        }
        for sup in direct_supertypes(db, current) {
            if let Some(sup_id) = erase(db, &sup).class_id() {
                stack.push(sup_id);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/compat_tests.rs"]
mod tests;
