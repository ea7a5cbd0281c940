//! Member lookup and signature matching.
//!
//! Lookups walk the modification chain of the receiver type (most specific
//! layer first) and then its supertypes, substituting the receiver's type
//! arguments into every member signature found.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::trace;

use crate::compat::{
    as_super, direct_supertypes, is_assignable_from, is_strictly_assignable_from,
};
use crate::context::TypeContext;
use crate::db::TypeDatabase;
use crate::registry::{chain_root, layers};
use crate::types::{FieldDecl, MethodDecl, TypeId, TypeRef};

/// A field found on a receiver type.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldMatch {
    /// Layer declaring the field.
    pub owner: TypeId,
    pub field: FieldDecl,
    /// Field type with the receiver's type arguments substituted.
    pub ty: TypeRef,
}

/// A method or constructor selected for a call.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodMatch {
    pub owner: TypeId,
    pub method: MethodDecl,
    /// Parameter types after substitution and inference.
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MethodLookup {
    Found(MethodMatch),
    /// No member with that name.
    NotFound,
    /// Members exist but none accepts the arguments.
    NotApplicable { candidates: usize },
}

impl MethodLookup {
    pub fn found(self) -> Option<MethodMatch> {
        match self {
            MethodLookup::Found(m) => Some(m),
            _ => None,
        }
    }
}

/// Every chain reachable from `ty` in lookup order, each paired with the
/// receiver type viewed as that chain.
fn lookup_order(db: &dyn TypeDatabase, ty: &TypeRef) -> Vec<TypeRef> {
    let mut out: Vec<TypeRef> = Vec::new();
    let mut seen = FxHashSet::default();
    let mut queue: SmallVec<[TypeRef; 8]> = SmallVec::new();
    let start = match ty {
        TypeRef::TypeParam(param) => param.bound.clone().unwrap_or_else(|| db.object_type()),
        TypeRef::Array(_) | TypeRef::Null => db.object_type(),
        other => other.clone(),
    };
    queue.push(start);
    let mut i = 0;
    while i < queue.len() {
        let current = queue[i].clone();
        i += 1;
        let Some(id) = current.class_id() else {
            continue;
        };
        if !seen.insert(chain_root(db, id)) {
            continue;
        }
        let receiver = TypeContext::for_receiver(db, &current);
        for sup in direct_supertypes(db, id) {
            queue.push(receiver.substitute(&sup));
        }
        out.push(current);
    }
    out
}

pub fn find_field(db: &dyn TypeDatabase, receiver: &TypeRef, name: &str) -> Option<FieldMatch> {
    for viewed in lookup_order(db, receiver) {
        let Some(id) = viewed.class_id() else {
            continue;
        };
        let ctx = TypeContext::for_receiver(db, &viewed);
        for layer in layers(db, id) {
            let Some(decl) = db.declaration(layer) else {
                continue;
            };
            if let Some(field) = decl.fields.get(name) {
                return Some(FieldMatch {
                    owner: layer,
                    field: field.clone(),
                    ty: ctx.substitute_or_default(db, &field.ty),
                });
            }
        }
    }
    None
}

/// Candidate methods named `name`, most specific declaration first, with
/// overridden signatures removed.
fn method_candidates(db: &dyn TypeDatabase, receiver: &TypeRef, name: &str) -> Vec<(TypeId, MethodDecl, TypeContext)> {
    let mut out: Vec<(TypeId, MethodDecl, TypeContext)> = Vec::new();
    for viewed in lookup_order(db, receiver) {
        let Some(id) = viewed.class_id() else {
            continue;
        };
        let ctx = TypeContext::for_receiver(db, &viewed);
        for layer in layers(db, id) {
            let Some(decl) = db.declaration(layer) else {
                continue;
            };
            for method in decl.methods_named(name) {
                let substituted: Vec<TypeRef> =
                    method.params.iter().map(|p| ctx.substitute(p)).collect();
                let overridden = out.iter().any(|(_, m, c)| {
                    m.params.len() == substituted.len()
                        && m.params
                            .iter()
                            .map(|p| c.substitute(p))
                            .zip(&substituted)
                            .all(|(a, b)| &a == b)
                });
                if !overridden {
                    out.push((layer, method.clone(), ctx.clone()));
                }
            }
        }
    }
    out
}

/// Instantiate `method` for `args`: infer its own type parameters, then
/// substitute. Returns `None` when the arguments are not applicable.
fn instantiate(
    db: &dyn TypeDatabase,
    owner: TypeId,
    method: &MethodDecl,
    receiver_ctx: &TypeContext,
    args: &[TypeRef],
    allow_boxing: bool,
) -> Option<MethodMatch> {
    if method.params.len() != args.len() {
        return None;
    }
    let mut ctx = TypeContext::new();
    for (param, arg) in method.params.iter().zip(args) {
        let param = receiver_ctx.substitute(param);
        ctx.infer(db, &method.type_params, &param, arg);
    }
    ctx.extend_from(receiver_ctx);
    let params: Vec<TypeRef> = method
        .params
        .iter()
        .map(|p| ctx.substitute_or_default(db, p))
        .collect();
    let applicable = params.iter().zip(args).all(|(p, a)| {
        if allow_boxing {
            is_assignable_from(db, p, a)
        } else {
            is_strictly_assignable_from(db, p, a)
        }
    });
    if !applicable {
        return None;
    }
    Some(MethodMatch {
        owner,
        method: method.clone(),
        return_type: ctx.substitute_or_default(db, &method.return_type),
        params,
    })
}

/// Pick the most specific of several applicable matches: one whose every
/// parameter is assignable to the corresponding parameter of all others.
fn most_specific(db: &dyn TypeDatabase, matches: Vec<MethodMatch>) -> Option<MethodMatch> {
    if matches.len() <= 1 {
        return matches.into_iter().next();
    }
    let best = matches.iter().position(|candidate| {
        matches.iter().all(|other| {
            candidate
                .params
                .iter()
                .zip(&other.params)
                .all(|(c, o)| is_strictly_assignable_from(db, o, c))
        })
    });
    // Ambiguous calls resolve to the first declared candidate.
    let index = best.unwrap_or(0);
    matches.into_iter().nth(index)
}

fn select(
    db: &dyn TypeDatabase,
    candidates: &[(TypeId, MethodDecl, TypeContext)],
    args: &[TypeRef],
) -> MethodLookup {
    if candidates.is_empty() {
        return MethodLookup::NotFound;
    }
    for allow_boxing in [false, true] {
        let applicable: Vec<MethodMatch> = candidates
            .iter()
            .filter_map(|(owner, m, ctx)| instantiate(db, *owner, m, ctx, args, allow_boxing))
            .collect();
        if let Some(found) = most_specific(db, applicable) {
            return MethodLookup::Found(found);
        }
    }
    MethodLookup::NotApplicable {
        candidates: candidates.len(),
    }
}

pub fn find_method(
    db: &dyn TypeDatabase,
    receiver: &TypeRef,
    name: &str,
    args: &[TypeRef],
) -> MethodLookup {
    let candidates = method_candidates(db, receiver, name);
    let result = select(db, &candidates, args);
    trace!(
        receiver = %receiver.display(db),
        name,
        candidates = candidates.len(),
        found = matches!(result, MethodLookup::Found(_)),
        "find_method"
    );
    result
}

/// Constructors are not inherited; a type declaring none has an implicit
/// no-argument constructor.
pub fn find_constructor(db: &dyn TypeDatabase, ty: &TypeRef, args: &[TypeRef]) -> MethodLookup {
    let Some(id) = ty.class_id() else {
        return MethodLookup::NotFound;
    };
    let ctx = TypeContext::for_receiver(db, ty);
    let mut candidates = Vec::new();
    for layer in layers(db, id) {
        if let Some(decl) = db.declaration(layer) {
            for ctor in &decl.constructors {
                candidates.push((layer, ctor.clone(), ctx.clone()));
            }
        }
    }
    if candidates.is_empty() {
        if args.is_empty() {
            return MethodLookup::Found(MethodMatch {
                owner: db.resolve(id, true),
                method: MethodDecl::new("<init>", Vec::new(), TypeRef::VOID),
                params: Vec::new(),
                return_type: TypeRef::VOID,
            });
        }
        return MethodLookup::NotApplicable { candidates: 0 };
    }
    select(db, &candidates, args)
}

/// The single abstract method of a functional interface type, substituted
/// for the given type arguments.
pub fn functional_method(db: &dyn TypeDatabase, ty: &TypeRef) -> Option<MethodMatch> {
    let id = ty.class_id()?;
    if !db.declaration(id).is_some_and(|d| d.is_interface()) {
        return None;
    }
    let mut found: Option<MethodMatch> = None;
    for viewed in lookup_order(db, ty) {
        let Some(vid) = viewed.class_id() else {
            continue;
        };
        let ctx = TypeContext::for_receiver(db, &viewed);
        for layer in layers(db, vid) {
            let Some(decl) = db.declaration(layer) else {
                continue;
            };
            for m in decl.methods.iter().filter(|m| m.is_abstract) {
                if found.is_some() {
                    return None;
                }
                found = Some(MethodMatch {
                    owner: layer,
                    method: m.clone(),
                    params: m.params.iter().map(|p| ctx.substitute_or_default(db, p)).collect(),
                    return_type: ctx.substitute_or_default(db, &m.return_type),
                });
            }
        }
    }
    found
}

/// Runtime dispatch: the most specific implementation of a statically
/// selected method on the receiver's runtime class.
///
/// An implementation matches on identical parameter types, or on arity when
/// it is the only same-named method of that arity in its layer (a generic
/// method overridden with concrete parameter types).
pub fn find_override(
    db: &dyn TypeDatabase,
    runtime: TypeId,
    selected: &MethodDecl,
) -> Option<(TypeId, MethodDecl)> {
    for viewed in lookup_order(db, &TypeRef::Class(runtime)) {
        let Some(id) = viewed.class_id() else {
            continue;
        };
        for layer in layers(db, id) {
            let Some(decl) = db.declaration(layer) else {
                continue;
            };
            let same_arity: SmallVec<[&MethodDecl; 2]> = decl
                .methods_named(&selected.name)
                .filter(|m| !m.is_abstract && m.params.len() == selected.params.len())
                .collect();
            let hit = same_arity
                .iter()
                .find(|m| m.params == selected.params)
                .or_else(|| (same_arity.len() == 1).then(|| &same_arity[0]));
            if let Some(m) = hit {
                return Some((layer, (*m).clone()));
            }
        }
    }
    None
}

/// The element type produced by iterating over `ty` (arrays and
/// `Iterable`s).
pub fn iteration_element(db: &dyn TypeDatabase, ty: &TypeRef) -> Option<TypeRef> {
    if let Some(element) = ty.element() {
        return Some(element.clone());
    }
    let iterable = db.well_known().iterable?;
    let viewed = as_super(db, ty, iterable)?;
    Some(match viewed.type_args().first() {
        Some(arg) => TypeContext::new().substitute_or_default(db, arg),
        None => db.object_type(),
    })
}

#[cfg(test)]
#[path = "../tests/signature_tests.rs"]
mod tests;
