//! Resolution results.
//!
//! `SemanticModel` is the side table the checker fills in for an arena: one
//! entry per node for the resolved type, the inferred (expected) type, the
//! member bindings of identifier and selector nodes, frame sizes and the
//! first diagnostic attached to the node. The interpreter and the lowering
//! pass only read it.

use rustc_hash::FxHashMap;
use strata_ast::{NodeArena, NodeIndex};
use strata_common::Diagnostic;
use strata_solver::{MethodDecl, MethodMatch, TypeId, TypeRef};

/// How a property is read and written once resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyAccessor {
    /// Field declared by an interpreted type; stored in the object (or in
    /// the type's static storage).
    Field {
        owner: TypeId,
        name: String,
        is_static: bool,
    },
    /// Property backed by a `getX`/`isX` method and an optional `setX`.
    Computed {
        owner: TypeId,
        getter: String,
        setter: Option<String>,
        is_static: bool,
    },
    /// Field of a compiled type served by the native table.
    Native { key: &'static str },
}

impl PropertyAccessor {
    pub fn is_static(&self) -> bool {
        match self {
            PropertyAccessor::Field { is_static, .. }
            | PropertyAccessor::Computed { is_static, .. } => *is_static,
            PropertyAccessor::Native { .. } => true,
        }
    }

    pub fn is_writable(&self) -> bool {
        match self {
            PropertyAccessor::Field { .. } => true,
            PropertyAccessor::Computed { setter, .. } => setter.is_some(),
            PropertyAccessor::Native { .. } => false,
        }
    }
}

/// Where the receiver of a member access comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Receiver {
    /// `this`, or an enclosing instance `outer` hops out.
    Implicit { outer: u32 },
    /// No receiver (static member).
    Static,
    /// The value produced by the preceding segment.
    Value,
}

/// A method (or constructor) selected at resolution time.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodTarget {
    pub owner: TypeId,
    pub method: MethodDecl,
    /// Parameter types after substitution.
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
}

impl From<MethodMatch> for MethodTarget {
    fn from(m: MethodMatch) -> Self {
        MethodTarget {
            owner: m.owner,
            method: m.method,
            params: m.params,
            return_type: m.return_type,
        }
    }
}

/// What one segment of an identifier chain or one selector refers to.
#[derive(Clone, Debug, PartialEq)]
pub enum MemberBinding {
    Local {
        name: String,
    },
    Property {
        accessor: PropertyAccessor,
        receiver: Receiver,
    },
    ArrayLength,
    /// A type name (possibly spanning several dotted segments).
    Type(TypeRef),
    Method {
        target: MethodTarget,
        receiver: Receiver,
    },
}

impl MemberBinding {
    /// Whether the segment can be assigned to.
    pub fn is_assignable(&self) -> bool {
        match self {
            MemberBinding::Local { .. } => true,
            MemberBinding::Property { accessor, .. } => accessor.is_writable(),
            _ => false,
        }
    }
}

/// Per-arena resolution results.
#[derive(Clone, Debug, Default)]
pub struct SemanticModel {
    /// Type declared by each `ClassDeclaration` node. Survives `stop`.
    declared: FxHashMap<NodeIndex, TypeId>,
    types: FxHashMap<NodeIndex, TypeRef>,
    inferred: FxHashMap<NodeIndex, TypeRef>,
    bindings: FxHashMap<NodeIndex, Vec<MemberBinding>>,
    frame_sizes: FxHashMap<NodeIndex, usize>,
    catch_types: FxHashMap<NodeIndex, Vec<TypeRef>>,
    /// Type written in a cast, `instanceof` or array creation.
    written: FxHashMap<NodeIndex, TypeRef>,
    /// Enclosing-instance hops for qualified `Outer.this`.
    this_hops: FxHashMap<NodeIndex, u32>,
    errors: FxHashMap<NodeIndex, Diagnostic>,
    /// Type database generation the cached results were computed against.
    generation: Option<u64>,
}

impl SemanticModel {
    pub fn new() -> Self {
        SemanticModel::default()
    }

    pub fn declared_type(&self, class: NodeIndex) -> Option<TypeId> {
        self.declared.get(&class).copied()
    }

    pub fn declared_types(&self) -> impl Iterator<Item = (NodeIndex, TypeId)> + '_ {
        self.declared.iter().map(|(k, v)| (*k, *v))
    }

    pub(crate) fn set_declared_type(&mut self, class: NodeIndex, id: TypeId) {
        self.declared.insert(class, id);
    }

    /// Resolved type of a node, if it has been resolved.
    pub fn type_of(&self, idx: NodeIndex) -> Option<&TypeRef> {
        self.types.get(&idx)
    }

    pub(crate) fn set_type(&mut self, idx: NodeIndex, ty: TypeRef) {
        self.types.insert(idx, ty);
    }

    pub fn inferred_type(&self, idx: NodeIndex) -> Option<&TypeRef> {
        self.inferred.get(&idx)
    }

    pub(crate) fn set_inferred(&mut self, idx: NodeIndex, ty: TypeRef) {
        self.inferred.insert(idx, ty);
    }

    /// Bindings of an identifier chain (one per segment) or a selector.
    pub fn bindings(&self, idx: NodeIndex) -> &[MemberBinding] {
        self.bindings.get(&idx).map_or(&[], Vec::as_slice)
    }

    /// Last binding of a node: the member a call or access finally reaches.
    pub fn final_binding(&self, idx: NodeIndex) -> Option<&MemberBinding> {
        self.bindings(idx).last()
    }

    pub(crate) fn set_bindings(&mut self, idx: NodeIndex, bindings: Vec<MemberBinding>) {
        self.bindings.insert(idx, bindings);
    }

    pub fn cached_frame_size(&self, idx: NodeIndex) -> Option<usize> {
        self.frame_sizes.get(&idx).copied()
    }

    pub(crate) fn set_frame_size(&mut self, idx: NodeIndex, size: usize) {
        self.frame_sizes.insert(idx, size);
    }

    pub fn catch_types(&self, clause: NodeIndex) -> &[TypeRef] {
        self.catch_types.get(&clause).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn set_catch_types(&mut self, clause: NodeIndex, types: Vec<TypeRef>) {
        self.catch_types.insert(clause, types);
    }

    pub fn written_type(&self, idx: NodeIndex) -> Option<&TypeRef> {
        self.written.get(&idx)
    }

    pub(crate) fn set_written_type(&mut self, idx: NodeIndex, ty: TypeRef) {
        self.written.insert(idx, ty);
    }

    pub fn this_hops(&self, idx: NodeIndex) -> u32 {
        self.this_hops.get(&idx).copied().unwrap_or(0)
    }

    pub(crate) fn set_this_hops(&mut self, idx: NodeIndex, hops: u32) {
        self.this_hops.insert(idx, hops);
    }

    pub fn error(&self, idx: NodeIndex) -> Option<&Diagnostic> {
        self.errors.get(&idx)
    }

    /// Attach `diag` unless the node already carries one. Returns whether
    /// the diagnostic was attached.
    pub(crate) fn attach_error(&mut self, idx: NodeIndex, diag: Diagnostic) -> bool {
        if self.errors.contains_key(&idx) {
            return false;
        }
        self.errors.insert(idx, diag);
        true
    }

    /// Every attached diagnostic, ordered by node.
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        let mut entries: Vec<(&NodeIndex, &Diagnostic)> = self.errors.iter().collect();
        entries.sort_by_key(|(idx, _)| idx.0);
        entries.into_iter().map(|(_, d)| d).collect()
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = Some(generation);
    }

    /// Drop every cached result for `idx` (declarations excepted).
    pub(crate) fn forget(&mut self, idx: NodeIndex) {
        self.types.remove(&idx);
        self.inferred.remove(&idx);
        self.bindings.remove(&idx);
        self.frame_sizes.remove(&idx);
        self.catch_types.remove(&idx);
        self.written.remove(&idx);
        self.this_hops.remove(&idx);
        self.errors.remove(&idx);
    }

    /// Drop every cached result in the subtree rooted at `root`.
    pub(crate) fn forget_subtree(&mut self, arena: &NodeArena, root: NodeIndex) {
        for idx in arena.descendants(root) {
            self.forget(idx);
        }
    }
}
