//! Type declarations from `ClassDeclaration` nodes.
//!
//! `declare_types` runs in two passes: the first registers every class
//! (nested ones under `Outer.Inner`) so names resolve regardless of
//! declaration order; the second resolves headers and members.
//!
//! A class marked `modifies` becomes a new layer on the chain of the type
//! it names. Declaring the same tree again replaces each declaration in
//! place (hot reload), which bumps the registry generation.

use std::sync::Arc;

use strata_ast::{ClassKind, ModifierFlags, NodeArena, NodeData, NodeIndex, Param, TypeParamSyntax, TypeSyntax};
use strata_common::diagnostics::diagnostic_messages;
use strata_common::{Diagnostic, DiagnosticMessage};
use strata_solver::{
    FieldDecl, MethodDecl, PrimitiveKind, TypeDatabase, TypeDecl, TypeId, TypeKind, TypeOrigin,
    TypeParameter, TypeRef, TypeRegistry, declared_type_params,
};
use tracing::debug;

use crate::model::SemanticModel;

/// Names visible while resolving a type reference.
#[derive(Clone, Debug, Default)]
pub struct TypeScope {
    /// Type variables in scope, innermost last.
    pub type_params: Vec<Arc<TypeParameter>>,
    /// Enclosing classes, innermost last.
    pub enclosing: Vec<TypeId>,
}

impl TypeScope {
    pub fn new() -> Self {
        TypeScope::default()
    }

    /// Scope inside the body of `id`: its enclosing classes and every type
    /// variable they declare.
    pub fn for_class(db: &dyn TypeDatabase, id: TypeId) -> Self {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(class) = current {
            if chain.contains(&class) {
                break;
            }
            chain.push(class);
            current = db.declaration(class).and_then(|d| d.enclosing);
        }
        chain.reverse();
        let mut type_params = Vec::new();
        for &class in &chain {
            type_params.extend(declared_type_params(db, class));
        }
        TypeScope {
            type_params,
            enclosing: chain,
        }
    }

    pub fn find_param(&self, name: &str) -> Option<&Arc<TypeParameter>> {
        self.type_params.iter().rev().find(|p| &*p.name == name)
    }
}

/// Resolve a type name: nested types of the enclosing classes first, then
/// simple or qualified names.
pub fn resolve_type_name(db: &dyn TypeDatabase, name: &str, scope: &TypeScope) -> Option<TypeId> {
    for &outer in scope.enclosing.iter().rev() {
        let qualified = format!("{}.{}", db.qualified_type_name(outer), name);
        if let Some(id) = db.find_type(&qualified) {
            return Some(id);
        }
    }
    db.find_type(name)
}

/// Resolve a syntactic type. On failure returns the name that could not be
/// found.
pub fn resolve_syntax(
    db: &dyn TypeDatabase,
    syntax: &TypeSyntax,
    scope: &TypeScope,
) -> Result<TypeRef, String> {
    let base = if syntax.name == "?" {
        TypeRef::Unresolved
    } else if let Some(kind) = PrimitiveKind::from_name(&syntax.name) {
        TypeRef::Primitive(kind)
    } else if let Some(param) = scope
        .find_param(&syntax.name)
        .filter(|_| syntax.args.is_empty())
    {
        TypeRef::TypeParam(param.clone())
    } else {
        let id = resolve_type_name(db, &syntax.name, scope).ok_or_else(|| syntax.name.clone())?;
        let args = syntax
            .args
            .iter()
            .map(|a| resolve_syntax(db, a, scope))
            .collect::<Result<Vec<_>, _>>()?;
        TypeRef::parameterized(id, args)
    };
    let mut ty = base;
    for _ in 0..syntax.dims {
        ty = TypeRef::array_of(ty);
    }
    Ok(ty)
}

fn report(
    arena: &NodeArena,
    model: &mut SemanticModel,
    idx: NodeIndex,
    message: &DiagnosticMessage,
    args: &[&str],
) {
    let diag = Diagnostic::from_message(message, args).at_node(idx.0, arena.range(idx));
    model.attach_error(idx, diag);
}

/// Register every class declared under `root`. Returns the declared
/// `(node, type)` pairs in declaration order (outer classes first).
pub fn declare_types(
    arena: &NodeArena,
    root: NodeIndex,
    registry: &mut TypeRegistry,
    model: &mut SemanticModel,
) -> Vec<(NodeIndex, TypeId)> {
    let mut declared = Vec::new();
    register(arena, root, None, registry, model, &mut declared);
    for &(idx, id) in &declared {
        fill_members(arena, idx, id, registry, model);
    }
    debug!(count = declared.len(), "declared types");
    declared
}

fn register(
    arena: &NodeArena,
    idx: NodeIndex,
    outer: Option<TypeId>,
    registry: &mut TypeRegistry,
    model: &mut SemanticModel,
    out: &mut Vec<(NodeIndex, TypeId)>,
) {
    let Some(data) = arena.data(idx) else {
        return;
    };
    match data {
        NodeData::SourceFile { types } => {
            for ty in types.iter() {
                register(arena, ty, None, registry, model, out);
            }
        }
        NodeData::ClassDeclaration {
            name,
            kind,
            modifiers,
            members,
            modifies,
            ..
        } => {
            let qualified = match outer {
                Some(outer) => format!("{}.{}", registry.qualified_type_name(outer), name),
                None => name.clone(),
            };
            let type_kind = match kind {
                ClassKind::Class => TypeKind::Class,
                ClassKind::Interface => TypeKind::Interface,
            };
            let mut decl = TypeDecl::new(&qualified, type_kind, TypeOrigin::Dynamic);
            decl.decl_node = idx;
            decl.enclosing = outer;
            decl.is_abstract = *kind == ClassKind::Interface || modifiers.contains(ModifierFlags::ABSTRACT);
            decl.is_static = outer.is_none()
                || *kind == ClassKind::Interface
                || modifiers.contains(ModifierFlags::STATIC);

            let reloaded = model
                .declared_type(idx)
                .filter(|id| registry.declaration(*id).is_some_and(|d| d.decl_node == idx));
            let id = if let Some(existing) = reloaded {
                if let Some(current) = registry.declaration(existing) {
                    decl.name = current.name.clone();
                    decl.qualified_name = current.qualified_name.clone();
                }
                match registry.replace(existing, decl) {
                    Ok(()) => Some(existing),
                    Err(_) => None,
                }
            } else if *modifies {
                match registry.find_type(&qualified) {
                    Some(target) => registry.modify(target, decl).ok(),
                    None => {
                        report(arena, model, idx, &diagnostic_messages::UNRESOLVED_TYPE, &[&qualified]);
                        registry.declare(decl).ok()
                    }
                }
            } else {
                match registry.declare(decl) {
                    Ok(id) => Some(id),
                    Err(_) => {
                        report(arena, model, idx, &diagnostic_messages::DUPLICATE_TYPE, &[&qualified]);
                        None
                    }
                }
            };
            let Some(id) = id else {
                return;
            };
            model.set_declared_type(idx, id);
            out.push((idx, id));
            for member in members.iter() {
                if matches!(arena.data(member), Some(NodeData::ClassDeclaration { .. })) {
                    register(arena, member, Some(id), registry, model, out);
                }
            }
        }
        _ => {}
    }
}

fn type_params_of(
    db: &dyn TypeDatabase,
    syntax: &[TypeParamSyntax],
    scope: &TypeScope,
) -> Vec<Arc<TypeParameter>> {
    syntax
        .iter()
        .map(|tp| {
            let bound = tp
                .bound
                .as_ref()
                .and_then(|b| resolve_syntax(db, b, scope).ok());
            TypeParameter::new(&tp.name, bound)
        })
        .collect()
}

struct MemberResolver<'r> {
    arena: &'r NodeArena,
    registry: &'r TypeRegistry,
    scope: TypeScope,
    errors: Vec<(NodeIndex, String)>,
}

impl MemberResolver<'_> {
    fn resolve(&mut self, idx: NodeIndex, syntax: &TypeSyntax, scope: &TypeScope) -> TypeRef {
        match resolve_syntax(self.registry, syntax, scope) {
            Ok(ty) => ty,
            Err(name) => {
                self.errors.push((idx, name));
                TypeRef::Unresolved
            }
        }
    }

    fn signature(&mut self, idx: NodeIndex, params: &[Param], scope: &TypeScope) -> (Vec<TypeRef>, Vec<String>) {
        let types = params.iter().map(|p| self.resolve(idx, &p.ty, scope)).collect();
        let names = params.iter().map(|p| p.name.clone()).collect();
        (types, names)
    }

    fn member(&mut self, member: NodeIndex, is_interface: bool, decl: &mut TypeDecl) {
        let Some(data) = self.arena.data(member) else {
            return;
        };
        match data {
            NodeData::FieldDeclaration {
                modifiers,
                ty,
                name,
                binding,
                ..
            } => {
                let scope = self.scope.clone();
                let mut field = FieldDecl::new(name, self.resolve(member, ty, &scope));
                field.is_static = is_interface || modifiers.contains(ModifierFlags::STATIC);
                field.is_final = modifiers.contains(ModifierFlags::FINAL);
                field.binding = *binding;
                field.decl_node = member;
                decl.add_field(field);
            }
            NodeData::MethodDeclaration {
                modifiers,
                type_params,
                name,
                params,
                return_type,
                body,
            } => {
                let mut scope = self.scope.clone();
                let own = type_params_of(self.registry, type_params, &scope);
                scope.type_params.extend(own.iter().cloned());
                let (param_types, param_names) = self.signature(member, params, &scope);
                let ret = self.resolve(member, return_type, &scope);
                let mut method = MethodDecl::new(name, param_types, ret);
                method.param_names = param_names;
                method.type_params = own;
                method.is_static = modifiers.contains(ModifierFlags::STATIC);
                method.is_abstract = modifiers.contains(ModifierFlags::ABSTRACT)
                    || (is_interface && body.is_none());
                method.decl_node = member;
                decl.add_method(method);
            }
            NodeData::ConstructorDeclaration { params, .. } => {
                let scope = self.scope.clone();
                let (param_types, param_names) = self.signature(member, params, &scope);
                let mut ctor = MethodDecl::new("<init>", param_types, TypeRef::VOID);
                ctor.param_names = param_names;
                ctor.decl_node = member;
                decl.constructors.push(ctor);
            }
            _ => {}
        }
    }
}

fn fill_members(
    arena: &NodeArena,
    idx: NodeIndex,
    id: TypeId,
    registry: &mut TypeRegistry,
    model: &mut SemanticModel,
) {
    let Some(NodeData::ClassDeclaration {
        kind,
        type_params,
        extends,
        implements,
        members,
        ..
    }) = arena.data(idx)
    else {
        return;
    };
    let reader: &TypeRegistry = &*registry;
    let Some(mut decl) = reader.declaration(id).cloned() else {
        return;
    };
    let is_interface = *kind == ClassKind::Interface;

    let mut resolver = MemberResolver {
        arena,
        registry: reader,
        scope: TypeScope::for_class(reader, id),
        errors: Vec::new(),
    };
    // A modifying layer inherits the chain's type variables.
    if decl.modifies.is_none() || !type_params.is_empty() {
        let own = type_params_of(reader, type_params, &resolver.scope);
        resolver.scope.type_params.extend(own.iter().cloned());
        decl.type_params = own;
    }

    let scope = resolver.scope.clone();
    decl.extends = extends.as_ref().map(|ty| resolver.resolve(idx, ty, &scope));
    decl.implements = implements
        .iter()
        .map(|ty| resolver.resolve(idx, ty, &scope))
        .collect();
    decl.fields.clear();
    decl.methods.clear();
    decl.constructors.clear();
    for member in members.iter() {
        resolver.member(member, is_interface, &mut decl);
    }

    let errors = std::mem::take(&mut resolver.errors);
    for (node, name) in errors {
        report(arena, model, node, &diagnostic_messages::UNRESOLVED_TYPE, &[&name]);
    }
    if let Some(slot) = registry.declaration_mut(id) {
        *slot = decl;
    }
}

#[cfg(test)]
#[path = "../tests/declare_tests.rs"]
mod tests;
