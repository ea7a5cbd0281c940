//! Static scopes mirroring the interpreter's frames.

use rustc_hash::FxHashMap;
use strata_ast::{NodeArena, NodeData, NodeIndex};
use strata_solver::{TypeId, TypeRef};

#[derive(Clone, Debug, Default)]
struct Scope {
    vars: FxHashMap<String, TypeRef>,
    /// Lookups do not continue past a method boundary.
    method_boundary: bool,
}

/// Stack of lexical scopes during the start walk.
#[derive(Clone, Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack::default()
    }

    pub fn push(&mut self, method_boundary: bool) {
        self.scopes.push(Scope {
            vars: FxHashMap::default(),
            method_boundary,
        });
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn clear(&mut self) {
        self.scopes.clear();
    }

    /// Define `name` in the innermost scope. Returns `false` when the name
    /// is already defined there; shadowing an outer scope is allowed.
    pub fn define(&mut self, name: &str, ty: TypeRef) -> bool {
        if self.scopes.is_empty() {
            self.push(true);
        }
        let Some(scope) = self.scopes.last_mut() else {
            return false;
        };
        if scope.vars.contains_key(name) {
            return false;
        }
        scope.vars.insert(name.to_string(), ty);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeRef> {
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.vars.get(name) {
                return Some(ty);
            }
            if scope.method_boundary {
                break;
            }
        }
        None
    }
}

/// The class whose members are being resolved.
#[derive(Clone, Debug)]
pub struct ClassFrame {
    pub id: TypeId,
    /// `this` type: the class parameterized by its own type variables.
    pub this_type: TypeRef,
    /// Inside a static member (no `this`).
    pub static_context: bool,
}

/// Number of locals a scope-introducing node declares directly.
///
/// Blocks count their variable declarations; loops, catch clauses,
/// sequences, lambdas and methods count what their header introduces.
pub fn frame_size(arena: &NodeArena, idx: NodeIndex) -> usize {
    let declared = |list: &mut dyn Iterator<Item = NodeIndex>| -> usize {
        list.map(|stmt| match arena.data(stmt) {
            Some(NodeData::VariableStatement { declarations, .. }) => declarations.len(),
            _ => 0,
        })
        .sum()
    };
    match arena.data(idx) {
        Some(NodeData::Block { statements }) => declared(&mut statements.iter()),
        Some(NodeData::Switch { statements, .. }) => declared(&mut statements.iter()),
        Some(NodeData::For { initializer, .. }) => declared(&mut initializer.iter()),
        Some(NodeData::ForEach { .. }) | Some(NodeData::CatchClause { .. }) => 1,
        Some(NodeData::Sequence { temps, .. }) => temps.len(),
        Some(NodeData::Lambda { params, .. }) => params.len(),
        Some(NodeData::MethodDeclaration { params, .. })
        | Some(NodeData::ConstructorDeclaration { params, .. }) => params.len(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scopes_shadow_and_method_boundaries_stop_lookup() {
        let mut scopes = ScopeStack::new();
        scopes.push(true);
        assert!(scopes.define("x", TypeRef::INT));
        assert!(!scopes.define("x", TypeRef::LONG));
        scopes.push(false);
        assert!(scopes.define("x", TypeRef::LONG));
        assert_eq!(scopes.lookup("x"), Some(&TypeRef::LONG));
        scopes.pop();
        assert_eq!(scopes.lookup("x"), Some(&TypeRef::INT));

        scopes.push(true);
        assert_eq!(scopes.lookup("x"), None);
    }

    #[test]
    fn frame_sizes_count_direct_declarations() {
        let mut arena = NodeArena::new();
        let ty = strata_ast::TypeSyntax::named("int");
        let one = arena.int(1);
        let a = arena.var_declarator("a", one);
        let b = arena.var_declarator("b", NodeIndex::NONE);
        let decls = arena.var_stmt(ty.clone(), vec![a, b]);
        let nested_init = arena.int(2);
        let nested = arena.var(ty, "c", nested_init);
        let inner = arena.block(vec![nested]);
        let block = arena.block(vec![decls, inner]);
        assert_eq!(frame_size(&arena, block), 2);
        assert_eq!(frame_size(&arena, inner), 1);
    }
}
