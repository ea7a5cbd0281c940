//! Statement execution.
//!
//! `exec` returns an [`ExecResult`] that wrapping constructs consume or
//! propagate:
//! - loops consume a `Break`/`Continue` that carries no label or their own
//!   label, and propagate everything else
//! - a labelled non-loop statement consumes a `Break` carrying its label
//! - `switch` consumes an unlabelled `Break`; `Continue` reaches the loop
//! - `try` runs its `finally` block on every exit path; a `finally` that
//!   completes abruptly replaces the pending result
//!
//! The label of a propagating jump lives in `ExecutionContext::current_label`
//! and the value of a `Return` in `current_return_value`.

use strata_ast::{NodeData, NodeIndex, NodeList};
use strata_checker::{MemberBinding, MethodTarget};
use strata_solver::{MethodLookup, TypeRef, find_method};
use tracing::trace;

use crate::context::ExecutionContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::value::{ArrayRef, NativeState, ObjectRef, Value};
use crate::Interpreter;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExecResult {
    Next,
    Break,
    Continue,
    Return,
}

/// What a loop does after its body completed with some result.
enum LoopStep {
    Proceed,
    Exit,
    Propagate(ExecResult),
}

/// Position in the collection a for-each loop walks.
enum Cursor {
    Array(ArrayRef, usize),
    List(ObjectRef, usize),
    Iterator {
        iterator: Value,
        has_next: MethodTarget,
        next: MethodTarget,
    },
}

impl<'a> Interpreter<'a> {
    /// Frame size recorded by the checker, or computed from the node.
    pub(crate) fn frame_size_of(&self, idx: NodeIndex) -> usize {
        self.model
            .cached_frame_size(idx)
            .unwrap_or_else(|| strata_checker::frame_size(self.arena, idx))
    }

    /// Run `body` inside a fresh frame, popping it on every exit path.
    pub(crate) fn in_frame<T>(
        &mut self,
        ctx: &mut ExecutionContext,
        size: usize,
        method_frame: bool,
        body: impl FnOnce(&mut Self, &mut ExecutionContext) -> RuntimeResult<T>,
    ) -> RuntimeResult<T> {
        ctx.push_frame(size, method_frame);
        let result = body(self, ctx);
        ctx.pop_frame();
        result
    }

    pub fn exec(&mut self, ctx: &mut ExecutionContext, idx: NodeIndex) -> RuntimeResult<ExecResult> {
        if idx.is_none() {
            return Ok(ExecResult::Next);
        }
        let arena = self.arena;
        let Some(data) = arena.data(idx) else {
            return Err(RuntimeError::Unresolved {
                node: idx,
                kind: "missing",
            });
        };
        if data.is_expression() {
            self.evaluate(ctx, idx)?;
            return Ok(ExecResult::Next);
        }
        match data {
            NodeData::Block { statements } => {
                let size = self.frame_size_of(idx);
                self.in_frame(ctx, size, false, |this, ctx| this.exec_list(ctx, statements))
            }
            NodeData::VariableStatement { declarations, .. } => {
                self.exec_declarations(ctx, idx, declarations)?;
                Ok(ExecResult::Next)
            }
            NodeData::ExpressionStatement { expression } => {
                self.evaluate(ctx, *expression)?;
                Ok(ExecResult::Next)
            }
            NodeData::If {
                condition,
                then_statement,
                else_statement,
            } => {
                if self.condition(ctx, *condition)? {
                    self.exec(ctx, *then_statement)
                } else {
                    self.exec(ctx, *else_statement)
                }
            }
            NodeData::While { condition, body } => {
                let label = self.loop_label(idx);
                while self.condition(ctx, *condition)? {
                    let result = self.exec(ctx, *body)?;
                    match loop_step(ctx, result, label) {
                        LoopStep::Proceed => {}
                        LoopStep::Exit => break,
                        LoopStep::Propagate(result) => return Ok(result),
                    }
                }
                Ok(ExecResult::Next)
            }
            NodeData::DoWhile { body, condition } => {
                let label = self.loop_label(idx);
                loop {
                    let result = self.exec(ctx, *body)?;
                    match loop_step(ctx, result, label) {
                        LoopStep::Proceed => {}
                        LoopStep::Exit => break,
                        LoopStep::Propagate(result) => return Ok(result),
                    }
                    if !self.condition(ctx, *condition)? {
                        break;
                    }
                }
                Ok(ExecResult::Next)
            }
            NodeData::For {
                initializer,
                condition,
                incrementor,
                body,
            } => {
                let size = self.frame_size_of(idx);
                let label = self.loop_label(idx);
                self.in_frame(ctx, size, false, |this, ctx| {
                    for init in initializer.iter() {
                        this.exec(ctx, init)?;
                    }
                    loop {
                        if condition.is_some() && !this.condition(ctx, *condition)? {
                            break;
                        }
                        let result = this.exec(ctx, *body)?;
                        match loop_step(ctx, result, label) {
                            LoopStep::Proceed => {}
                            LoopStep::Exit => break,
                            LoopStep::Propagate(result) => return Ok(result),
                        }
                        for incr in incrementor.iter() {
                            this.exec(ctx, incr)?;
                        }
                    }
                    Ok(ExecResult::Next)
                })
            }
            NodeData::ForEach {
                name,
                expression,
                body,
                ..
            } => self.exec_for_each(ctx, idx, name, *expression, *body),
            NodeData::Labeled { label, statement } => {
                let result = self.exec(ctx, *statement)?;
                if result == ExecResult::Break && ctx.current_label.as_deref() == Some(label.as_str()) {
                    ctx.current_label = None;
                    return Ok(ExecResult::Next);
                }
                Ok(result)
            }
            NodeData::Break { label } => {
                ctx.current_label = label.clone();
                Ok(ExecResult::Break)
            }
            NodeData::Continue { label } => {
                ctx.current_label = label.clone();
                Ok(ExecResult::Continue)
            }
            NodeData::Return { expression } => {
                let value = if expression.is_some() {
                    self.evaluate_inferred(ctx, *expression)?
                } else {
                    Value::Void
                };
                ctx.current_return_value = Some(value);
                Ok(ExecResult::Return)
            }
            NodeData::Throw { expression } => {
                let value = self.evaluate(ctx, *expression)?;
                if value.is_null() {
                    return Err(RuntimeError::NullReference {
                        member: "throw".to_string(),
                    });
                }
                let description = self.describe_exception(&value);
                trace!(%description, "throw");
                Err(RuntimeError::Thrown { value, description })
            }
            NodeData::Try {
                block,
                catches,
                finally_block,
            } => self.exec_try(ctx, *block, catches, *finally_block),
            NodeData::Switch {
                expression,
                statements,
            } => self.exec_switch(ctx, idx, *expression, statements),
            NodeData::SwitchLabel { .. } | NodeData::Empty => Ok(ExecResult::Next),
            // Member declarations execute through invocation and
            // instantiation, not in statement position.
            NodeData::SourceFile { .. }
            | NodeData::ClassDeclaration { .. }
            | NodeData::FieldDeclaration { .. }
            | NodeData::MethodDeclaration { .. }
            | NodeData::ConstructorDeclaration { .. } => Ok(ExecResult::Next),
            other => Err(RuntimeError::Unsupported {
                what: format!("{} in statement position", other.kind_name()),
            }),
        }
    }

    /// Execute statements in order until one completes abruptly.
    pub(crate) fn exec_list(&mut self, ctx: &mut ExecutionContext, statements: &NodeList) -> RuntimeResult<ExecResult> {
        for stmt in statements.iter() {
            let result = self.exec(ctx, stmt)?;
            if result != ExecResult::Next {
                return Ok(result);
            }
        }
        Ok(ExecResult::Next)
    }

    fn exec_declarations(
        &mut self,
        ctx: &mut ExecutionContext,
        statement: NodeIndex,
        declarations: &NodeList,
    ) -> RuntimeResult<()> {
        let arena = self.arena;
        let declared = self
            .model
            .type_of(statement)
            .cloned()
            .unwrap_or(TypeRef::Unresolved);
        for decl in declarations.iter() {
            let Some(NodeData::VariableDeclaration { name, initializer }) = arena.data(decl) else {
                continue;
            };
            let value = if initializer.is_some() {
                self.evaluate(ctx, *initializer)?.coerce(self.db, &declared)
            } else {
                Value::default_for(&declared)
            };
            ctx.define_variable(name, value)?;
        }
        Ok(())
    }

    /// Label of a loop that is the direct body of a labelled statement.
    fn loop_label(&self, idx: NodeIndex) -> Option<&'a str> {
        let arena = self.arena;
        match arena.data(arena.parent_of(idx)) {
            Some(NodeData::Labeled { label, .. }) => Some(label.as_str()),
            _ => None,
        }
    }

    fn exec_for_each(
        &mut self,
        ctx: &mut ExecutionContext,
        idx: NodeIndex,
        name: &str,
        expression: NodeIndex,
        body: NodeIndex,
    ) -> RuntimeResult<ExecResult> {
        let iterable = self.evaluate(ctx, expression)?;
        let declared = self.model.type_of(idx).cloned().unwrap_or(TypeRef::Unresolved);
        let label = self.loop_label(idx);
        let mut cursor = self.cursor(ctx, iterable)?;
        let size = self.frame_size_of(idx);
        self.in_frame(ctx, size, false, |this, ctx| {
            ctx.define_variable(name, Value::default_for(&declared))?;
            while let Some(item) = this.advance(ctx, &mut cursor)? {
                ctx.set_variable(name, item.coerce(this.db, &declared))?;
                let result = this.exec(ctx, body)?;
                match loop_step(ctx, result, label) {
                    LoopStep::Proceed => {}
                    LoopStep::Exit => break,
                    LoopStep::Propagate(result) => return Ok(result),
                }
            }
            Ok(ExecResult::Next)
        })
    }

    fn cursor(&mut self, ctx: &mut ExecutionContext, iterable: Value) -> RuntimeResult<Cursor> {
        match iterable {
            Value::Null => Err(RuntimeError::NullReference {
                member: "iterator".to_string(),
            }),
            Value::Array(array) => Ok(Cursor::Array(array, 0)),
            Value::Object(obj) if matches!(obj.borrow().native, NativeState::List(_)) => {
                Ok(Cursor::List(obj, 0))
            }
            other => {
                let iterator = self.call_by_name(ctx, other, "iterator")?;
                let ty = iterator.runtime_type(self.db);
                let lookup = |name: &str| match find_method(self.db, &ty, name, &[]) {
                    MethodLookup::Found(found) => Ok(MethodTarget::from(found)),
                    _ => Err(RuntimeError::Unsupported {
                        what: format!("iteration without '{name}'"),
                    }),
                };
                let has_next = lookup("hasNext")?;
                let next = lookup("next")?;
                Ok(Cursor::Iterator {
                    iterator,
                    has_next,
                    next,
                })
            }
        }
    }

    fn advance(&mut self, ctx: &mut ExecutionContext, cursor: &mut Cursor) -> RuntimeResult<Option<Value>> {
        match cursor {
            Cursor::Array(array, index) => {
                let item = array.borrow().items.get(*index).cloned();
                *index += 1;
                Ok(item)
            }
            Cursor::List(list, index) => {
                let item = match &list.borrow().native {
                    NativeState::List(items) => items.get(*index).cloned(),
                    _ => None,
                };
                *index += 1;
                Ok(item)
            }
            Cursor::Iterator {
                iterator,
                has_next,
                next,
            } => {
                let more = self.invoke_method(ctx, Some(iterator.clone()), has_next, Vec::new())?;
                if more.as_bool() != Some(true) {
                    return Ok(None);
                }
                self.invoke_method(ctx, Some(iterator.clone()), next, Vec::new())
                    .map(Some)
            }
        }
    }

    fn exec_try(
        &mut self,
        ctx: &mut ExecutionContext,
        block: NodeIndex,
        catches: &NodeList,
        finally_block: NodeIndex,
    ) -> RuntimeResult<ExecResult> {
        let mut outcome = self.exec(ctx, block);
        let caught = match &outcome {
            Err(err) if !catches.is_empty() => self.exception_for(ctx, err),
            _ => None,
        };
        if let Some(exception) = caught {
            let clause = catches
                .iter()
                .find(|clause| {
                    self.model
                        .catch_types(*clause)
                        .iter()
                        .any(|ty| self.is_instance(&exception, ty))
                });
            if let Some(clause) = clause {
                trace!(clause = clause.0, "catch");
                outcome = self.exec_catch(ctx, clause, exception);
            }
        }
        if finally_block.is_none() {
            return outcome;
        }
        let saved_return = ctx.current_return_value.take();
        let saved_label = ctx.current_label.take();
        match self.exec(ctx, finally_block) {
            Ok(ExecResult::Next) => {
                ctx.current_return_value = saved_return;
                ctx.current_label = saved_label;
                outcome
            }
            abrupt => abrupt,
        }
    }

    fn exec_catch(&mut self, ctx: &mut ExecutionContext, clause: NodeIndex, exception: Value) -> RuntimeResult<ExecResult> {
        let arena = self.arena;
        let Some(NodeData::CatchClause { name, block, .. }) = arena.data(clause) else {
            return Err(RuntimeError::Unresolved {
                node: clause,
                kind: "CatchClause",
            });
        };
        let size = self.frame_size_of(clause);
        self.in_frame(ctx, size, false, |this, ctx| {
            ctx.define_variable(name, exception)?;
            this.exec(ctx, *block)
        })
    }

    fn exec_switch(
        &mut self,
        ctx: &mut ExecutionContext,
        idx: NodeIndex,
        expression: NodeIndex,
        statements: &NodeList,
    ) -> RuntimeResult<ExecResult> {
        let arena = self.arena;
        let value = self.evaluate(ctx, expression)?;
        let size = self.frame_size_of(idx);
        self.in_frame(ctx, size, false, |this, ctx| {
            let mut matched = None;
            let mut default = None;
            for (i, stmt) in statements.iter().enumerate() {
                let Some(NodeData::SwitchLabel { expression: label }) = arena.data(stmt) else {
                    continue;
                };
                if label.is_none() {
                    default.get_or_insert(i);
                    continue;
                }
                if this.evaluate(ctx, *label)?.same(&value) {
                    matched = Some(i);
                    break;
                }
            }
            let Some(start) = matched.or(default) else {
                return Ok(ExecResult::Next);
            };
            for stmt in statements.nodes[start..].iter().copied() {
                if matches!(arena.data(stmt), Some(NodeData::SwitchLabel { .. })) {
                    continue;
                }
                match this.exec(ctx, stmt)? {
                    ExecResult::Next => {}
                    ExecResult::Break if ctx.current_label.is_none() => return Ok(ExecResult::Next),
                    other => return Ok(other),
                }
            }
            Ok(ExecResult::Next)
        })
    }

    /// Call a no-argument method by name on a value's runtime type.
    pub(crate) fn call_by_name(&mut self, ctx: &mut ExecutionContext, receiver: Value, name: &str) -> RuntimeResult<Value> {
        let ty = receiver.runtime_type(self.db);
        match find_method(self.db, &ty, name, &[]) {
            MethodLookup::Found(found) => {
                let target = MethodTarget::from(found);
                self.invoke_method(ctx, Some(receiver), &target, Vec::new())
            }
            _ => Err(RuntimeError::Unsupported {
                what: format!("'{name}' on {}", ty.display(self.db)),
            }),
        }
    }

    /// Binding recorded for an identifier or selector node.
    pub(crate) fn final_binding(&self, idx: NodeIndex) -> RuntimeResult<&'a MemberBinding> {
        let model = self.model;
        model.final_binding(idx).ok_or_else(|| RuntimeError::Unresolved {
            node: idx,
            kind: self.arena.kind_name(idx),
        })
    }
}

fn loop_step(ctx: &mut ExecutionContext, result: ExecResult, own_label: Option<&str>) -> LoopStep {
    let targets_this_loop = |ctx: &mut ExecutionContext| match ctx.current_label.as_deref() {
        None => true,
        Some(label) if Some(label) == own_label => {
            ctx.current_label = None;
            true
        }
        Some(_) => false,
    };
    match result {
        ExecResult::Next => LoopStep::Proceed,
        ExecResult::Break if targets_this_loop(ctx) => LoopStep::Exit,
        ExecResult::Continue if targets_this_loop(ctx) => LoopStep::Proceed,
        other => LoopStep::Propagate(other),
    }
}
