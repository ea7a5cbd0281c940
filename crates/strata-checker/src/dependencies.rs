//! Dependency collection for build-order analysis.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use strata_ast::NodeIndex;
use strata_solver::{TypeDatabase, TypeId, TypeRef, direct_supertypes};

use crate::model::{MemberBinding, PropertyAccessor};
use crate::scope;
use crate::state::CheckerState;

/// Which references count as dependencies.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DependencyMode {
    /// Types named by declarations, casts, allocations and member owners.
    #[default]
    Declared,
    /// Additionally the supertypes of every collected type, transitively.
    All,
}

fn add_type(db: &dyn TypeDatabase, ty: &TypeRef, out: &mut Vec<TypeId>) {
    match ty {
        TypeRef::Class(id) => out.push(*id),
        TypeRef::Parameterized(id, args) => {
            out.push(*id);
            for arg in args.iter() {
                add_type(db, arg, out);
            }
        }
        TypeRef::Array(element) => add_type(db, element, out),
        TypeRef::TypeParam(param) => {
            if let Some(bound) = &param.bound {
                add_type(db, bound, out);
            }
        }
        TypeRef::Primitive(_) | TypeRef::Null | TypeRef::Unresolved => {}
    }
}

impl<'a> CheckerState<'a> {
    /// Add the qualified names of every type the subtree references to
    /// `out`. The subtree is started first if needed.
    pub fn collect_dependencies(&mut self, root: NodeIndex, out: &mut IndexSet<String>, mode: DependencyMode) {
        if !self.ctx.arena.state(root).is_started() {
            self.start(root);
        }
        let db = self.db();
        let model = &*self.ctx.model;
        let mut ids = Vec::new();
        for idx in self.ctx.arena.descendants(root) {
            if let Some(id) = model.declared_type(idx) {
                ids.push(id);
            }
            if let Some(ty) = model.type_of(idx) {
                add_type(db, ty, &mut ids);
            }
            if let Some(ty) = model.written_type(idx) {
                add_type(db, ty, &mut ids);
            }
            for ty in model.catch_types(idx) {
                add_type(db, ty, &mut ids);
            }
            for binding in model.bindings(idx) {
                match binding {
                    MemberBinding::Type(ty) => add_type(db, ty, &mut ids),
                    MemberBinding::Method { target, .. } => ids.push(target.owner),
                    MemberBinding::Property { accessor, .. } => match accessor {
                        PropertyAccessor::Field { owner, .. } | PropertyAccessor::Computed { owner, .. } => {
                            ids.push(*owner)
                        }
                        PropertyAccessor::Native { .. } => {}
                    },
                    MemberBinding::Local { .. } | MemberBinding::ArrayLength => {}
                }
            }
        }

        let mut seen = FxHashSet::default();
        while let Some(id) = ids.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.insert(db.qualified_type_name(id).to_string());
            if mode == DependencyMode::All {
                for sup in direct_supertypes(db, id) {
                    add_type(db, &sup, &mut ids);
                }
            }
        }
    }

    /// Number of variable slots the frame opened by `idx` needs.
    pub fn frame_size(&self, idx: NodeIndex) -> usize {
        self.ctx
            .model
            .cached_frame_size(idx)
            .unwrap_or_else(|| scope::frame_size(self.ctx.arena, idx))
    }
}
