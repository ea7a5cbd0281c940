//! Outgoing edges of the binding graph.
//!
//! A bound field points at every field, computed property and interpreted
//! method its binding expression reads; a method points at whatever its body
//! reads. Fields without a binding are leaves: their initializer runs once
//! and never re-fires.

use strata_ast::{NodeArena, NodeData, NodeIndex, NodeList};
use strata_checker::{MemberBinding, PropertyAccessor, Receiver, SemanticModel};
use strata_solver::{TypeDatabase, TypeId, TypeRef, find_method};

use crate::cycle::ThisContext;
use crate::reify::expression_text;

/// One edge of the graph.
#[derive(Clone, Debug)]
pub(crate) struct Reference {
    /// Field or method declaration reached.
    pub target: NodeIndex,
    /// Identifier or selector node the reference is read from.
    pub via: NodeIndex,
    pub label: String,
    pub context: ThisContext,
}

pub(crate) struct ReferenceScan<'a> {
    pub arena: &'a NodeArena,
    pub db: &'a dyn TypeDatabase,
    pub model: &'a SemanticModel,
}

impl<'a> ReferenceScan<'a> {
    /// Edges leaving `node` when its `this` is described by `context`.
    pub fn references(&self, node: NodeIndex, context: &ThisContext) -> Vec<Reference> {
        let root = match self.arena.data(node) {
            Some(NodeData::FieldDeclaration {
                initializer, binding, ..
            }) if binding.is_bound() => *initializer,
            Some(NodeData::MethodDeclaration { body, .. }) => *body,
            _ => return Vec::new(),
        };
        let mut out = Vec::new();
        if root.is_none() {
            return out;
        }
        for idx in self.arena.descendants(root) {
            match self.arena.data(idx) {
                Some(NodeData::Identifier { names, .. }) => {
                    self.scan_identifier(idx, names, context, &mut out);
                }
                Some(NodeData::Selector {
                    expression,
                    selectors,
                }) => self.scan_selectors(idx, *expression, selectors, context, &mut out),
                _ => {}
            }
        }
        out
    }

    /// `Owner.member` of a field or method declaration node.
    pub fn label(&self, node: NodeIndex) -> String {
        let owner = self
            .arena
            .find_ancestor(node, |data| matches!(data, NodeData::ClassDeclaration { .. }))
            .and_then(|class| self.model.declared_type(class))
            .map(|id| self.db.type_name(id).to_string());
        let member = match self.arena.data(node) {
            Some(NodeData::FieldDeclaration { name, .. }) => name.clone(),
            Some(NodeData::MethodDeclaration { name, .. }) => format!("{name}()"),
            _ => format!("#{node}"),
        };
        match owner {
            Some(owner) => format!("{owner}.{member}"),
            None => member,
        }
    }

    fn scan_identifier(
        &self,
        idx: NodeIndex,
        names: &[String],
        context: &ThisContext,
        out: &mut Vec<Reference>,
    ) {
        let mut previous: Option<TypeRef> = None;
        for (i, binding) in self.model.bindings(idx).iter().enumerate() {
            if let Some((target, owner, label, receiver)) = self.target_of(binding) {
                let path = names[..i.min(names.len())].join(".");
                let path = (!path.is_empty()).then_some(path);
                out.push(Reference {
                    target,
                    via: idx,
                    label,
                    context: self.receiver_context(receiver, owner, context, previous.as_ref(), path.as_deref()),
                });
            }
            previous = self.member_type(binding);
        }
    }

    fn scan_selectors(
        &self,
        idx: NodeIndex,
        expression: NodeIndex,
        selectors: &NodeList,
        context: &ThisContext,
        out: &mut Vec<Reference>,
    ) {
        // `this.x` reads `x` of the binding's own `this`.
        let mut path = match self.arena.data(expression) {
            Some(NodeData::This { qualifier: None }) => None,
            _ => Some(expression_text(self.arena, expression)),
        };
        let mut previous = self.model.type_of(expression).cloned();
        for selector in selectors.iter() {
            if let Some(binding) = self.model.final_binding(selector)
                && let Some((target, owner, label, receiver)) = self.target_of(binding)
            {
                out.push(Reference {
                    target,
                    via: idx,
                    label,
                    context: self.receiver_context(receiver, owner, context, previous.as_ref(), path.as_deref()),
                });
            }
            let step = match self.arena.data(selector) {
                Some(NodeData::VariableSelector { name, arguments }) => match arguments {
                    Some(_) => format!("{name}()"),
                    None => name.clone(),
                },
                _ => "[]".to_string(),
            };
            path = Some(match path {
                Some(p) if step == "[]" => format!("{p}{step}"),
                Some(p) => format!("{p}.{step}"),
                None => step,
            });
            previous = self.model.type_of(selector).cloned();
        }
    }

    /// Declaration node, owner, label and receiver of a binding that leads
    /// into interpreted code.
    fn target_of(&self, binding: &MemberBinding) -> Option<(NodeIndex, TypeId, String, Receiver)> {
        let (node, owner, member, receiver) = match binding {
            MemberBinding::Property {
                accessor: PropertyAccessor::Field { owner, name, .. },
                receiver,
            } => {
                let field = self.db.declaration(*owner)?.fields.get(name)?;
                (field.decl_node, *owner, name.clone(), *receiver)
            }
            MemberBinding::Property {
                accessor: PropertyAccessor::Computed { owner, getter, .. },
                receiver,
            } => {
                let method = self
                    .db
                    .declaration(*owner)?
                    .methods_named(getter)
                    .find(|m| m.params.is_empty())?;
                (method.decl_node, *owner, format!("{getter}()"), *receiver)
            }
            MemberBinding::Method { target, receiver } => (
                target.method.decl_node,
                target.owner,
                format!("{}()", target.method.name),
                *receiver,
            ),
            _ => return None,
        };
        if node.is_none() {
            return None;
        }
        Some((node, owner, format!("{}.{member}", self.db.type_name(owner)), receiver))
    }

    /// Static type produced by a segment, when known.
    fn member_type(&self, binding: &MemberBinding) -> Option<TypeRef> {
        match binding {
            MemberBinding::Property { accessor, .. } => match accessor {
                PropertyAccessor::Field { owner, name, .. } => {
                    Some(self.db.declaration(*owner)?.fields.get(name)?.ty.clone())
                }
                PropertyAccessor::Computed { owner, getter, .. } => {
                    find_method(self.db, &TypeRef::Class(*owner), getter, &[])
                        .found()
                        .map(|m| m.return_type)
                }
                PropertyAccessor::Native { .. } => None,
            },
            MemberBinding::ArrayLength => Some(TypeRef::INT),
            MemberBinding::Type(ty) => Some(ty.clone()),
            MemberBinding::Method { target, .. } => Some(target.return_type.clone()),
            MemberBinding::Local { .. } => None,
        }
    }

    fn receiver_context(
        &self,
        receiver: Receiver,
        owner: TypeId,
        context: &ThisContext,
        previous: Option<&TypeRef>,
        path: Option<&str>,
    ) -> ThisContext {
        match receiver {
            Receiver::Implicit { outer: 0 } => context.clone(),
            Receiver::Implicit { .. } => {
                let outer = format!("{}.this", self.db.type_name(owner));
                ThisContext::qualified(Some(owner), context.extend(&outer))
            }
            Receiver::Static => ThisContext::of_type(owner),
            Receiver::Value => match path {
                Some(path) => {
                    ThisContext::qualified(previous.and_then(TypeRef::class_id), context.extend(path))
                }
                None => context.clone(),
            },
        }
    }
}
