//! In-process type database.
//!
//! Holds compiled (builtin) and dynamic (declared from source) types. Layers
//! are modelled as modification chains: `modify` appends a declaration that
//! supersedes the current most specific layer of a type, `replace` swaps a
//! declaration in place (hot reload). Both bump the generation counter that
//! nodes compare against to decide whether their cached types are stale.

use rustc_hash::FxHashMap;
use strata_common::limits;
use tracing::debug;

use crate::builtins;
use crate::db::{TypeDatabase, WellKnown};
use crate::types::{TypeDecl, TypeId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateType(String),
    UnknownType(TypeId),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicateType(name) => write!(f, "type '{name}' is already declared"),
            RegistryError::UnknownType(id) => write!(f, "unknown type id {}", id.0),
        }
    }
}

impl std::error::Error for RegistryError {}

#[derive(Clone, Debug)]
pub struct TypeRegistry {
    decls: Vec<TypeDecl>,
    /// Simple and qualified names, mapped to the root of each chain.
    names: FxHashMap<String, TypeId>,
    well_known: WellKnown,
    generation: u64,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Registry pre-populated with the builtin compiled types.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        builtins::install(&mut registry);
        registry
    }

    pub fn empty() -> Self {
        TypeRegistry {
            decls: Vec::new(),
            names: FxHashMap::default(),
            well_known: WellKnown::default(),
            generation: 0,
        }
    }

    pub fn well_known_mut(&mut self) -> &mut WellKnown {
        &mut self.well_known
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDecl> {
        self.decls.iter()
    }

    pub fn declaration_mut(&mut self, id: TypeId) -> Option<&mut TypeDecl> {
        self.decls.get_mut(id.index())
    }

    /// Register a new type. The qualified name must be unused; the simple
    /// name is registered when free (first declaration wins).
    pub fn declare(&mut self, mut decl: TypeDecl) -> Result<TypeId, RegistryError> {
        if self.names.contains_key(&decl.qualified_name) {
            return Err(RegistryError::DuplicateType(decl.qualified_name));
        }
        let id = TypeId(self.decls.len() as u32);
        decl.id = id;
        self.names.insert(decl.qualified_name.clone(), id);
        self.names.entry(decl.name.clone()).or_insert(id);
        debug!(name = %decl.qualified_name, id = id.0, "declare type");
        self.decls.push(decl);
        Ok(id)
    }

    /// Add a layer on top of `target`'s modification chain.
    ///
    /// The new declaration inherits the names of the chain and only needs
    /// to carry the members it adds or overrides.
    pub fn modify(&mut self, target: TypeId, mut decl: TypeDecl) -> Result<TypeId, RegistryError> {
        if target.index() >= self.decls.len() {
            return Err(RegistryError::UnknownType(target));
        }
        let latest = self.resolve(target, true);
        let id = TypeId(self.decls.len() as u32);
        let base = &self.decls[latest.index()];
        decl.id = id;
        decl.name = base.name.clone();
        decl.qualified_name = base.qualified_name.clone();
        decl.enclosing = decl.enclosing.or(base.enclosing);
        decl.modifies = Some(latest);
        decl.modified_by = None;
        self.decls[latest.index()].modified_by = Some(id);
        debug!(name = %decl.qualified_name, base = latest.0, id = id.0, "modify type");
        self.decls.push(decl);
        self.generation += 1;
        Ok(id)
    }

    /// Replace a declaration in place, keeping its id and chain links.
    pub fn replace(&mut self, id: TypeId, mut decl: TypeDecl) -> Result<(), RegistryError> {
        let Some(slot) = self.decls.get_mut(id.index()) else {
            return Err(RegistryError::UnknownType(id));
        };
        decl.id = id;
        decl.modifies = slot.modifies;
        decl.modified_by = slot.modified_by;
        debug!(name = %decl.qualified_name, id = id.0, "replace type");
        *slot = decl;
        self.generation += 1;
        Ok(())
    }

    /// Mark every cached resolution as stale without changing declarations.
    pub fn bump_generation(&mut self) {
        self.generation += 1;
    }

    /// First layer of `id`'s chain.
    pub fn chain_root(&self, id: TypeId) -> TypeId {
        chain_root(self, id)
    }
}

/// Follow `modifies` links to the first layer of a chain.
pub fn chain_root(db: &dyn TypeDatabase, id: TypeId) -> TypeId {
    let mut current = id;
    for _ in 0..limits::MAX_MODIFICATION_CHAIN {
        match db.declaration(current).and_then(|d| d.modifies) {
            Some(prev) => current = prev,
            None => break,
        }
    }
    current
}

/// Layers of a chain from most specific to root.
pub fn layers(db: &dyn TypeDatabase, id: TypeId) -> Vec<TypeId> {
    let mut out = Vec::new();
    let mut current = Some(db.resolve(id, true));
    while let Some(layer) = current {
        if out.len() as u32 >= limits::MAX_MODIFICATION_CHAIN || out.contains(&layer) {
            break;
        }
        out.push(layer);
        current = db.declaration(layer).and_then(|d| d.modifies);
    }
    out
}

impl TypeDatabase for TypeRegistry {
    fn declaration(&self, id: TypeId) -> Option<&TypeDecl> {
        self.decls.get(id.index())
    }

    fn find_type(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).map(|id| self.resolve(*id, true))
    }

    fn resolve(&self, id: TypeId, modified: bool) -> TypeId {
        if !modified {
            return id;
        }
        let mut current = id;
        for _ in 0..limits::MAX_MODIFICATION_CHAIN {
            match self.decls.get(current.index()).and_then(|d| d.modified_by) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
#[path = "../tests/registry_tests.rs"]
mod tests;
