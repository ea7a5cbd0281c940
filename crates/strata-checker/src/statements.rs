//! The start walk over declarations and statements.
//!
//! Scopes are pushed and popped exactly where the interpreter pushes and
//! pops frames, so a local resolves statically to the declaration it will
//! find at run time.

use strata_ast::{ModifierFlags, NodeData, NodeIndex, Param, TypeSyntax};
use strata_common::diagnostics::diagnostic_messages;
use strata_solver::{TypeRef, iteration_element};

use crate::declare::{TypeScope, resolve_syntax};
use crate::scope::frame_size;
use crate::state::CheckerState;

impl<'a> CheckerState<'a> {
    /// Type scope at the current walk position.
    pub(crate) fn type_scope(&self) -> TypeScope {
        let mut scope = match self.current_class() {
            Some(frame) => TypeScope::for_class(self.db(), frame.id),
            None => TypeScope::new(),
        };
        scope
            .type_params
            .extend(self.ctx.method_type_params.iter().cloned());
        scope
    }

    /// Resolve a type written in the source; unresolvable names are
    /// reported on `idx`.
    pub(crate) fn resolve_type_syntax(&mut self, idx: NodeIndex, syntax: &TypeSyntax) -> TypeRef {
        let scope = self.type_scope();
        match resolve_syntax(self.db(), syntax, &scope) {
            Ok(ty) => ty,
            Err(name) => {
                self.display_error(idx, &diagnostic_messages::UNRESOLVED_TYPE, &[&name]);
                TypeRef::Unresolved
            }
        }
    }

    /// Define a local, reporting a redefinition in the same scope.
    pub(crate) fn define_local(&mut self, idx: NodeIndex, name: &str, ty: TypeRef) {
        if !self.ctx.scopes.define(name, ty) {
            self.display_error(idx, &diagnostic_messages::DUPLICATE_DEFINITION, &[name]);
        }
    }

    fn record_frame_size(&mut self, idx: NodeIndex) {
        let size = frame_size(self.ctx.arena, idx);
        self.ctx.model.set_frame_size(idx, size);
    }

    /// Start a statement, declaration or expression.
    pub(crate) fn start_node(&mut self, idx: NodeIndex) {
        let Some(data) = self.ctx.arena.data(idx).cloned() else {
            return;
        };
        if data.is_expression() {
            self.resolve_type(idx);
            return;
        }
        match data {
            NodeData::SourceFile { types } => {
                for ty in types.iter() {
                    self.start_node(ty);
                }
            }
            NodeData::ClassDeclaration { members, .. } => {
                let Some(frame) = self.class_frame(idx) else {
                    return;
                };
                self.ctx.model.set_type(idx, frame.this_type.clone());
                self.ctx.classes.push(frame);
                for member in members.iter() {
                    self.start_node(member);
                }
                self.ctx.classes.pop();
            }
            NodeData::FieldDeclaration {
                modifiers,
                ty,
                initializer,
                ..
            } => {
                let saved = self.enter_member(modifiers);
                let field_ty = self.resolve_type_syntax(idx, &ty);
                self.ctx.model.set_type(idx, field_ty.clone());
                if initializer.is_some() {
                    self.ctx.scopes.push(true);
                    self.set_inferred_type(initializer, field_ty);
                    self.resolve_type(initializer);
                    self.ctx.scopes.pop();
                }
                self.leave_member(saved);
            }
            NodeData::MethodDeclaration {
                modifiers,
                type_params,
                params,
                return_type,
                body,
                ..
            } => {
                let saved = self.enter_member(modifiers);
                let scope = self.type_scope();
                let own: Vec<_> = type_params
                    .iter()
                    .map(|tp| {
                        let bound = tp
                            .bound
                            .as_ref()
                            .and_then(|b| resolve_syntax(self.db(), b, &scope).ok());
                        strata_solver::TypeParameter::new(&tp.name, bound)
                    })
                    .collect();
                let outer_params = self.ctx.method_type_params.len();
                self.ctx.method_type_params.extend(own);
                let ret = self.resolve_type_syntax(idx, &return_type);
                self.ctx.model.set_type(idx, ret.clone());
                self.start_callable(idx, &params, ret, body);
                self.ctx.method_type_params.truncate(outer_params);
                self.leave_member(saved);
            }
            NodeData::ConstructorDeclaration {
                modifiers, params, body, ..
            } => {
                let saved = self.enter_member(modifiers);
                self.start_callable(idx, &params, TypeRef::VOID, body);
                self.leave_member(saved);
            }
            NodeData::Block { statements } => {
                self.record_frame_size(idx);
                self.ctx.scopes.push(false);
                for stmt in statements.iter() {
                    self.start_node(stmt);
                }
                self.ctx.scopes.pop();
            }
            NodeData::VariableStatement { ty, declarations } => {
                let declared = self.resolve_type_syntax(idx, &ty);
                self.ctx.model.set_type(idx, declared.clone());
                for decl in declarations.iter() {
                    let Some(NodeData::VariableDeclaration { name, initializer }) =
                        self.ctx.arena.data(decl).cloned()
                    else {
                        continue;
                    };
                    if initializer.is_some() {
                        self.set_inferred_type(initializer, declared.clone());
                        self.resolve_type(initializer);
                    }
                    self.ctx.model.set_type(decl, declared.clone());
                    self.define_local(decl, &name, declared.clone());
                }
            }
            NodeData::VariableDeclaration { .. } => {
                // Declarators are handled by their statement.
            }
            NodeData::ExpressionStatement { expression } => {
                self.resolve_type(expression);
            }
            NodeData::If {
                condition,
                then_statement,
                else_statement,
            } => {
                self.resolve_type(condition);
                self.start_node(then_statement);
                self.start_node(else_statement);
            }
            NodeData::While { condition, body } => {
                self.resolve_type(condition);
                self.start_node(body);
            }
            NodeData::DoWhile { body, condition } => {
                self.start_node(body);
                self.resolve_type(condition);
            }
            NodeData::For {
                initializer,
                condition,
                incrementor,
                body,
            } => {
                self.record_frame_size(idx);
                self.ctx.scopes.push(false);
                for init in initializer.iter() {
                    self.start_node(init);
                }
                if condition.is_some() {
                    self.resolve_type(condition);
                }
                for incr in incrementor.iter() {
                    self.start_node(incr);
                }
                self.start_node(body);
                self.ctx.scopes.pop();
            }
            NodeData::ForEach {
                ty,
                name,
                expression,
                body,
            } => {
                self.record_frame_size(idx);
                let iterable = self.resolve_type(expression);
                let element = match iteration_element(self.db(), &iterable) {
                    Some(element) => element,
                    None => {
                        if !iterable.is_unresolved() {
                            let shown = self.display_type(&iterable);
                            self.display_error(expression, &diagnostic_messages::NOT_ITERABLE, &[&shown]);
                        }
                        TypeRef::Unresolved
                    }
                };
                let declared = if ty.name == "var" {
                    element.clone()
                } else {
                    self.resolve_type_syntax(idx, &ty)
                };
                self.ctx.model.set_type(idx, declared.clone());
                self.ctx.model.set_inferred(idx, element);
                self.ctx.scopes.push(false);
                self.define_local(idx, &name, declared);
                self.start_node(body);
                self.ctx.scopes.pop();
            }
            NodeData::Labeled { statement, .. } => self.start_node(statement),
            NodeData::Break { .. } | NodeData::Continue { .. } | NodeData::Empty => {}
            NodeData::Return { expression } => {
                if expression.is_some() {
                    if let Some(expected) = self.ctx.returns.last().cloned() {
                        self.set_inferred_type(expression, expected);
                    }
                    self.resolve_type(expression);
                }
            }
            NodeData::Throw { expression } => {
                self.resolve_type(expression);
            }
            NodeData::Try {
                block,
                catches,
                finally_block,
            } => {
                self.start_node(block);
                for clause in catches.iter() {
                    self.start_node(clause);
                }
                self.start_node(finally_block);
            }
            NodeData::CatchClause { types, name, block } => {
                self.record_frame_size(idx);
                let caught: Vec<TypeRef> = types
                    .iter()
                    .map(|t| self.resolve_type_syntax(idx, t))
                    .collect();
                let variable_ty = match caught.as_slice() {
                    [single] => single.clone(),
                    _ => self
                        .db()
                        .well_known()
                        .throwable
                        .map_or(TypeRef::Unresolved, TypeRef::Class),
                };
                self.ctx.model.set_catch_types(idx, caught);
                self.ctx.model.set_type(idx, variable_ty.clone());
                self.ctx.scopes.push(false);
                self.define_local(idx, &name, variable_ty);
                self.start_node(block);
                self.ctx.scopes.pop();
            }
            NodeData::Switch {
                expression,
                statements,
            } => {
                self.record_frame_size(idx);
                let switch_ty = self.resolve_type(expression);
                self.ctx.scopes.push(false);
                for stmt in statements.iter() {
                    if let Some(NodeData::SwitchLabel { expression: label }) =
                        self.ctx.arena.data(stmt)
                    {
                        let label = *label;
                        if label.is_some() {
                            self.set_inferred_type(label, switch_ty.clone());
                        }
                    }
                    self.start_node(stmt);
                }
                self.ctx.scopes.pop();
            }
            NodeData::SwitchLabel { expression } => {
                if expression.is_some() {
                    self.resolve_type(expression);
                }
            }
            // Expressions were dispatched above.
            _ => {}
        }
    }

    fn start_callable(&mut self, idx: NodeIndex, params: &[Param], ret: TypeRef, body: NodeIndex) {
        self.record_frame_size(idx);
        self.ctx.scopes.push(true);
        for param in params {
            let ty = self.resolve_type_syntax(idx, &param.ty);
            self.define_local(idx, &param.name, ty);
        }
        self.ctx.returns.push(ret);
        self.start_node(body);
        self.ctx.returns.pop();
        self.ctx.scopes.pop();
    }

    /// Enter a member of the innermost class; returns the previous static
    /// flag for `leave_member`.
    fn enter_member(&mut self, modifiers: ModifierFlags) -> bool {
        let Some(frame) = self.ctx.classes.last_mut() else {
            return false;
        };
        let saved = frame.static_context;
        frame.static_context = modifiers.contains(ModifierFlags::STATIC);
        saved
    }

    fn leave_member(&mut self, saved: bool) {
        if let Some(frame) = self.ctx.classes.last_mut() {
            frame.static_context = saved;
        }
    }
}
