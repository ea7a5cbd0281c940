//! Member resolution for identifier chains and selector chains.
//!
//! An identifier chain `a.b.c` binds one [`MemberBinding`] per segment; a
//! type name spanning several segments repeats its `Type` binding for each
//! of them so segment `i` always pairs with binding `i`. A selector chain
//! `e.f[i].m()` stores the binding and type of each selector on the
//! selector node itself.

use strata_ast::{NodeData, NodeIndex, NodeList};
use strata_common::diagnostics::diagnostic_messages;
use strata_solver::{FieldMatch, MethodLookup, PrimitiveKind, TypeRef, find_field, find_method, unboxed_kind};

use crate::declare::resolve_type_name;
use crate::model::{MemberBinding, PropertyAccessor, Receiver};
use crate::state::CheckerState;

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn field_accessor(found: &FieldMatch) -> PropertyAccessor {
    match found.field.native {
        Some(key) => PropertyAccessor::Native { key },
        None => PropertyAccessor::Field {
            owner: found.owner,
            name: found.field.name.clone(),
            is_static: found.field.is_static,
        },
    }
}

/// What the segment before a member access produced.
#[derive(Clone, Debug)]
struct Target {
    ty: TypeRef,
    /// The segment named a type: only static members are reachable.
    is_type: bool,
}

impl<'a> CheckerState<'a> {
    /// `get`/`is` accessor (with an optional `set` counterpart) standing in
    /// for a missing field.
    fn computed_property(&self, receiver: &TypeRef, name: &str) -> Option<(PropertyAccessor, TypeRef)> {
        if !self.ctx.options.computed_properties {
            return None;
        }
        let db = self.db();
        let cap = capitalize(name);
        for getter in [format!("get{cap}"), format!("is{cap}")] {
            let Some(found) = find_method(db, receiver, &getter, &[]).found() else {
                continue;
            };
            if found.return_type.is_void()
                || (getter.starts_with("is") && !found.return_type.is_boolean())
            {
                continue;
            }
            let setter_name = format!("set{cap}");
            let setter = find_method(db, receiver, &setter_name, std::slice::from_ref(&found.return_type))
                .found()
                .map(|_| setter_name);
            let accessor = PropertyAccessor::Computed {
                owner: found.owner,
                getter,
                setter,
                is_static: found.method.is_static,
            };
            return Some((accessor, found.return_type));
        }
        None
    }

    fn report_static_context(&mut self, node: NodeIndex, hops: usize, is_static: bool) {
        let in_static = self.current_class().is_some_and(|f| f.static_context);
        if hops == 0 && in_static && !is_static {
            self.display_error(node, &diagnostic_messages::STATIC_CONTEXT_THIS, &[]);
        }
    }

    /// First segment of an identifier chain that is not a call: a local, a
    /// field of `this` or an enclosing instance, or a computed property.
    fn resolve_simple_name(&mut self, node: NodeIndex, name: &str) -> Option<(MemberBinding, TypeRef)> {
        if let Some(ty) = self.ctx.scopes.lookup(name) {
            return Some((MemberBinding::Local { name: name.to_string() }, ty.clone()));
        }
        let db = self.db();
        let frames: Vec<TypeRef> = self.ctx.classes.iter().rev().map(|f| f.this_type.clone()).collect();
        for (hops, this_type) in frames.iter().enumerate() {
            if let Some(found) = find_field(db, this_type, name) {
                let is_static = found.field.is_static;
                self.report_static_context(node, hops, is_static);
                let receiver = if is_static {
                    Receiver::Static
                } else {
                    Receiver::Implicit { outer: hops as u32 }
                };
                let binding = MemberBinding::Property {
                    accessor: field_accessor(&found),
                    receiver,
                };
                return Some((binding, found.ty));
            }
            if let Some((accessor, ty)) = self.computed_property(this_type, name) {
                let receiver = if accessor.is_static() {
                    Receiver::Static
                } else {
                    Receiver::Implicit { outer: hops as u32 }
                };
                return Some((MemberBinding::Property { accessor, receiver }, ty));
            }
        }
        None
    }

    /// Longest dotted prefix of `names` (at most `limit` segments) naming a
    /// type.
    fn resolve_type_prefix(&self, names: &[String], limit: usize) -> Option<(usize, TypeRef)> {
        let scope = self.type_scope();
        (1..=limit.min(names.len())).rev().find_map(|len| {
            let dotted = names[..len].join(".");
            resolve_type_name(self.db(), &dotted, &scope).map(|id| (len, TypeRef::Class(id)))
        })
    }

    /// Field, array length or computed property `name` of `target`.
    fn member_access(&mut self, node: NodeIndex, target: &Target, name: &str) -> Option<(MemberBinding, TypeRef)> {
        let db = self.db();
        if !target.is_type && target.ty.element().is_some() && name == "length" {
            return Some((MemberBinding::ArrayLength, TypeRef::INT));
        }
        if let Some(found) = find_field(db, &target.ty, name)
            && (!target.is_type || found.field.is_static)
        {
            let receiver = if found.field.is_static {
                Receiver::Static
            } else {
                Receiver::Value
            };
            let binding = MemberBinding::Property {
                accessor: field_accessor(&found),
                receiver,
            };
            return Some((binding, found.ty));
        }
        if let Some((accessor, ty)) = self.computed_property(&target.ty, name)
            && (!target.is_type || accessor.is_static())
        {
            let receiver = if accessor.is_static() {
                Receiver::Static
            } else {
                Receiver::Value
            };
            return Some((MemberBinding::Property { accessor, receiver }, ty));
        }
        let shown = self.display_type(&target.ty);
        self.display_error(node, &diagnostic_messages::NO_SUCH_MEMBER, &[name, &shown]);
        None
    }

    /// Call `name(args)` on `target`.
    fn method_call(
        &mut self,
        node: NodeIndex,
        target: &Target,
        name: &str,
        args: &NodeList,
    ) -> Option<(MemberBinding, TypeRef)> {
        let arg_types = self.resolve_arguments(args);
        let lookup = find_method(self.db(), &target.ty, name, &arg_types);
        self.bind_call(node, lookup, name, &target.ty, &arg_types, args, |m| {
            if m.is_static || target.is_type {
                Receiver::Static
            } else {
                Receiver::Value
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn bind_call(
        &mut self,
        node: NodeIndex,
        lookup: MethodLookup,
        name: &str,
        receiver_ty: &TypeRef,
        arg_types: &[TypeRef],
        args: &NodeList,
        receiver: impl FnOnce(&strata_solver::MethodDecl) -> Receiver,
    ) -> Option<(MemberBinding, TypeRef)> {
        match lookup {
            MethodLookup::Found(found) => {
                let params = found.params.clone();
                let ty = found.return_type.clone();
                let receiver = receiver(&found.method);
                self.seed_lambda_arguments(args, Some(&params));
                Some((
                    MemberBinding::Method {
                        target: found.into(),
                        receiver,
                    },
                    ty,
                ))
            }
            MethodLookup::NotFound => {
                let shown = self.display_type(receiver_ty);
                self.display_error(node, &diagnostic_messages::NO_SUCH_MEMBER, &[name, &shown]);
                self.seed_lambda_arguments(args, None);
                None
            }
            MethodLookup::NotApplicable { .. } => {
                let shown = self.display_type(receiver_ty);
                let shown_args = self.display_types(arg_types);
                self.display_error(
                    node,
                    &diagnostic_messages::NO_MATCHING_METHOD,
                    &[name, &shown, &shown_args],
                );
                self.seed_lambda_arguments(args, None);
                None
            }
        }
    }

    /// Unqualified call `m(args)`: the innermost class declaring `m`
    /// decides, searching enclosing classes outward.
    fn implicit_call(&mut self, node: NodeIndex, name: &str, args: &NodeList) -> Option<(MemberBinding, TypeRef)> {
        let arg_types = self.resolve_arguments(args);
        let db = self.db();
        let frames: Vec<TypeRef> = self.ctx.classes.iter().rev().map(|f| f.this_type.clone()).collect();
        for (hops, this_type) in frames.iter().enumerate() {
            let lookup = find_method(db, this_type, name, &arg_types);
            if matches!(lookup, MethodLookup::NotFound) {
                continue;
            }
            if let MethodLookup::Found(found) = &lookup {
                self.report_static_context(node, hops, found.method.is_static);
            }
            return self.bind_call(node, lookup, name, this_type, &arg_types, args, |m| {
                if m.is_static {
                    Receiver::Static
                } else {
                    Receiver::Implicit { outer: hops as u32 }
                }
            });
        }
        self.display_error(node, &diagnostic_messages::UNRESOLVED_IDENTIFIER, &[name]);
        self.seed_lambda_arguments(args, None);
        None
    }

    /// Resolve `a.b.c` or `a.b.c(args)`.
    pub(crate) fn resolve_identifier(
        &mut self,
        idx: NodeIndex,
        names: &[String],
        arguments: Option<&NodeList>,
    ) -> TypeRef {
        let Some(first) = names.first() else {
            return TypeRef::Unresolved;
        };
        let mut bindings = Vec::with_capacity(names.len());

        if names.len() == 1
            && let Some(args) = arguments
        {
            let Some((binding, ty)) = self.implicit_call(idx, first, args) else {
                return TypeRef::Unresolved;
            };
            bindings.push(binding);
            self.ctx.model.set_bindings(idx, bindings);
            return ty;
        }

        // The last segment of a call is the method name.
        let member_count = if arguments.is_some() {
            names.len() - 1
        } else {
            names.len()
        };
        let mut target = if let Some((binding, ty)) = self.resolve_simple_name(idx, first) {
            bindings.push(binding);
            Target { ty, is_type: false }
        } else if let Some((len, ty)) = self.resolve_type_prefix(names, member_count) {
            for _ in 0..len {
                bindings.push(MemberBinding::Type(ty.clone()));
            }
            Target { ty, is_type: true }
        } else {
            self.display_error(idx, &diagnostic_messages::UNRESOLVED_IDENTIFIER, &[first]);
            if let Some(args) = arguments {
                self.resolve_arguments(args);
                self.seed_lambda_arguments(args, None);
            }
            return TypeRef::Unresolved;
        };

        while bindings.len() < member_count {
            let name = &names[bindings.len()];
            if target.ty.is_unresolved() {
                return TypeRef::Unresolved;
            }
            let Some((binding, ty)) = self.member_access(idx, &target, name) else {
                return TypeRef::Unresolved;
            };
            bindings.push(binding);
            target = Target { ty, is_type: false };
        }

        if let Some(args) = arguments {
            let name = &names[member_count];
            if target.ty.is_unresolved() {
                self.resolve_arguments(args);
                self.seed_lambda_arguments(args, None);
                return TypeRef::Unresolved;
            }
            let Some((binding, ty)) = self.method_call(idx, &target, name, args) else {
                return TypeRef::Unresolved;
            };
            bindings.push(binding);
            target = Target { ty, is_type: false };
        }

        self.ctx.model.set_bindings(idx, bindings);
        target.ty
    }

    /// Resolve `expression` followed by `selectors`; every selector node
    /// gets its own type and binding.
    pub(crate) fn resolve_selector_chain(
        &mut self,
        idx: NodeIndex,
        expression: NodeIndex,
        selectors: &NodeList,
    ) -> TypeRef {
        let root_ty = self.resolve_type(expression);
        let is_type = matches!(
            self.ctx.model.final_binding(expression),
            Some(MemberBinding::Type(_))
        );
        let mut target = Target { ty: root_ty, is_type };

        for sel in selectors.iter() {
            let ty = if target.ty.is_unresolved() {
                self.resolve_selector_children(sel);
                TypeRef::Unresolved
            } else {
                self.resolve_selector(sel, &target)
            };
            self.ctx.model.set_type(sel, ty.clone());
            target = Target { ty, is_type: false };
        }
        if let Some(last) = selectors.iter().last()
            && let Some(binding) = self.ctx.model.final_binding(last).cloned()
        {
            self.ctx.model.set_bindings(idx, vec![binding]);
        }
        target.ty
    }

    fn resolve_selector(&mut self, sel: NodeIndex, target: &Target) -> TypeRef {
        match self.ctx.arena.data(sel).cloned() {
            Some(NodeData::VariableSelector { name, arguments }) => {
                let resolved = match &arguments {
                    Some(args) => self.method_call(sel, target, &name, args),
                    None => self.member_access(sel, target, &name),
                };
                match resolved {
                    Some((binding, ty)) => {
                        self.ctx.model.set_bindings(sel, vec![binding]);
                        ty
                    }
                    None => TypeRef::Unresolved,
                }
            }
            Some(NodeData::ArraySelector { index }) => {
                let index_ty = self.resolve_type(index);
                let is_index = unboxed_kind(self.db(), &index_ty)
                    .is_some_and(|k| k.is_integral() && k.widens_to(PrimitiveKind::Int));
                if !index_ty.is_unresolved() && !is_index {
                    self.display_type_error(index, &TypeRef::INT, &index_ty);
                }
                match target.ty.element() {
                    Some(element) => element.clone(),
                    None => {
                        let shown = self.display_type(&target.ty);
                        let index_shown = self.display_type(&index_ty);
                        self.display_error(
                            sel,
                            &diagnostic_messages::OPERATOR_NOT_APPLICABLE,
                            &["[]", &shown, &index_shown],
                        );
                        TypeRef::Unresolved
                    }
                }
            }
            _ => TypeRef::Unresolved,
        }
    }

    /// Resolve the operands of a selector whose receiver did not resolve.
    fn resolve_selector_children(&mut self, sel: NodeIndex) {
        match self.ctx.arena.data(sel).cloned() {
            Some(NodeData::VariableSelector {
                arguments: Some(args),
                ..
            }) => {
                self.resolve_arguments(&args);
                self.seed_lambda_arguments(&args, None);
            }
            Some(NodeData::ArraySelector { index }) => {
                self.resolve_type(index);
            }
            _ => {}
        }
    }
}
