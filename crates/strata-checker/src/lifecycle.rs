//! Node lifecycle: `Unstarted → Initialized → Started → Validated`, with
//! `stop` discarding cached results from any state.
//!
//! Each entry point advances nodes that are behind: `validate` on an
//! unstarted subtree starts it first, `start` initializes it first.

use strata_ast::{NodeData, NodeIndex, NodeState};
use strata_solver::{TypeRef, declared_type_params};
use tracing::debug;

use crate::scope::ClassFrame;
use crate::state::CheckerState;

fn is_member(data: &NodeData) -> bool {
    matches!(
        data,
        NodeData::FieldDeclaration { .. }
            | NodeData::MethodDeclaration { .. }
            | NodeData::ConstructorDeclaration { .. }
    )
}

impl<'a> CheckerState<'a> {
    pub fn init(&mut self, root: NodeIndex) {
        for idx in self.ctx.arena.descendants(root) {
            if matches!(
                self.ctx.arena.state(idx),
                NodeState::Unstarted | NodeState::Stopped
            ) {
                self.ctx.arena.set_state(idx, NodeState::Initialized);
            }
        }
    }

    /// Resolve types in the subtree. Resolution always covers the whole
    /// enclosing member, since locals and `this` come from it.
    pub fn start(&mut self, root: NodeIndex) {
        let anchor = self.start_anchor(root);
        self.init(anchor);
        self.reset_walk();
        self.enter_enclosing_classes(anchor);
        self.ctx.walking = true;
        self.start_node(anchor);
        self.reset_walk();
        for idx in self.ctx.arena.descendants(anchor) {
            if self.ctx.arena.state(idx) == NodeState::Initialized {
                self.ctx.arena.set_state(idx, NodeState::Started);
            }
        }
        let generation = self.db().generation();
        self.ctx.model.set_generation(generation);
        debug!(root = root.0, anchor = anchor.0, generation, "started");
    }

    pub fn validate(&mut self, root: NodeIndex) {
        let needs_start = self
            .ctx
            .arena
            .descendants(root)
            .into_iter()
            .any(|idx| !self.ctx.arena.state(idx).is_started());
        if needs_start {
            self.start(root);
        }
        self.validate_subtree(root);
        for idx in self.ctx.arena.descendants(root) {
            if self.ctx.arena.state(idx) == NodeState::Started {
                self.ctx.arena.set_state(idx, NodeState::Validated);
            }
        }
    }

    /// `init`, `start` and `validate` in order.
    pub fn check(&mut self, root: NodeIndex) {
        self.init(root);
        self.start(root);
        self.validate(root);
    }

    /// Discard every cached result in the subtree so it can be restarted.
    /// Enclosing expressions up to the member are invalidated as well, as
    /// their types were computed from the subtree.
    pub fn stop(&mut self, root: NodeIndex) {
        self.ctx.model.forget_subtree(self.ctx.arena, root);
        for idx in self.ctx.arena.descendants(root) {
            self.ctx.arena.set_state(idx, NodeState::Stopped);
        }
        let mut current = self.ctx.arena.parent_of(root);
        while current.is_some() {
            let Some(data) = self.ctx.arena.data(current) else {
                break;
            };
            if is_member(data) || matches!(data, NodeData::ClassDeclaration { .. }) {
                break;
            }
            self.ctx.model.forget(current);
            self.ctx.arena.set_state(current, NodeState::Stopped);
            current = self.ctx.arena.parent_of(current);
        }
        debug!(root = root.0, "stopped");
    }

    /// Re-resolve the tree when the type database changed since it was
    /// started. Call on the root of the checked tree. Returns whether a
    /// refresh happened.
    pub fn refresh_bound_types(&mut self, root: NodeIndex) -> bool {
        let current = self.db().generation();
        if self.ctx.model.generation() == Some(current) {
            return false;
        }
        let was_validated = self.ctx.arena.state(root).is_validated();
        self.stop(root);
        self.start(root);
        if was_validated {
            self.validate(root);
        }
        debug!(root = root.0, generation = current, "refreshed bound types");
        true
    }

    fn start_anchor(&self, root: NodeIndex) -> NodeIndex {
        let arena = &*self.ctx.arena;
        match arena.data(root) {
            Some(data)
                if is_member(data)
                    || matches!(
                        data,
                        NodeData::SourceFile { .. } | NodeData::ClassDeclaration { .. }
                    ) =>
            {
                return root;
            }
            _ => {}
        }
        if let Some(member) = arena.find_ancestor(root, is_member) {
            return member;
        }
        // Free-standing statement tree: start from its top.
        let mut top = root;
        let mut steps = 0;
        while arena.parent_of(top).is_some() && steps <= arena.len() {
            top = arena.parent_of(top);
            steps += 1;
        }
        top
    }

    fn enter_enclosing_classes(&mut self, anchor: NodeIndex) {
        let mut classes = Vec::new();
        let mut current = anchor;
        while let Some(class) = self
            .ctx
            .arena
            .find_ancestor(current, |d| matches!(d, NodeData::ClassDeclaration { .. }))
        {
            classes.push(class);
            current = class;
        }
        for class in classes.into_iter().rev() {
            if let Some(frame) = self.class_frame(class) {
                self.ctx.classes.push(frame);
            }
        }
    }

    pub(crate) fn class_frame(&self, class: NodeIndex) -> Option<ClassFrame> {
        let id = self.ctx.model.declared_type(class)?;
        let params: Vec<TypeRef> = declared_type_params(self.db(), id)
            .into_iter()
            .map(TypeRef::TypeParam)
            .collect();
        Some(ClassFrame {
            id,
            this_type: TypeRef::parameterized(id, params),
            static_context: false,
        })
    }
}
