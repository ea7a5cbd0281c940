//! Post-resolution checks.
//!
//! Validation only reads the types and bindings the start walk cached;
//! it never resolves. Each check reports on the node that is wrong, so a
//! node shows at most one diagnostic no matter how often it is validated.

use strata_ast::{AssignOp, LiteralValue, NodeData, NodeIndex};
use strata_common::diagnostics::diagnostic_messages;
use strata_solver::{PrimitiveKind, TypeRef, is_assignable_from, unboxed_kind};

use crate::model::MemberBinding;
use crate::state::CheckerState;

/// Whether an `int` constant fits the narrower integral `target`.
fn constant_fits(value: i32, target: PrimitiveKind) -> bool {
    match target {
        PrimitiveKind::Byte => i8::try_from(value).is_ok(),
        PrimitiveKind::Short => i16::try_from(value).is_ok(),
        PrimitiveKind::Char => u16::try_from(value).is_ok(),
        _ => false,
    }
}

fn is_callable_boundary(data: &NodeData) -> bool {
    matches!(
        data,
        NodeData::MethodDeclaration { .. }
            | NodeData::ConstructorDeclaration { .. }
            | NodeData::FieldDeclaration { .. }
            | NodeData::Lambda { .. }
            | NodeData::ClassDeclaration { .. }
    )
}

impl<'a> CheckerState<'a> {
    pub(crate) fn validate_subtree(&mut self, root: NodeIndex) {
        for idx in self.ctx.arena.descendants(root) {
            let Some(data) = self.ctx.arena.data(idx).cloned() else {
                continue;
            };
            match data {
                NodeData::If { condition, .. }
                | NodeData::While { condition, .. }
                | NodeData::DoWhile { condition, .. }
                | NodeData::Conditional { condition, .. } => self.check_condition(condition),
                NodeData::For { condition, .. } if condition.is_some() => self.check_condition(condition),
                NodeData::VariableStatement { declarations, .. } => {
                    let declared = self.type_at(idx);
                    for decl in declarations.iter() {
                        if let Some(NodeData::VariableDeclaration { initializer, .. }) = self.ctx.arena.data(decl)
                            && initializer.is_some()
                        {
                            let initializer = *initializer;
                            self.check_assignable(initializer, &declared);
                        }
                    }
                }
                NodeData::FieldDeclaration { initializer, .. } if initializer.is_some() => {
                    let declared = self.type_at(idx);
                    self.check_assignable(initializer, &declared);
                }
                NodeData::Assignment { op, target, value } => {
                    if !self.is_lvalue(target) {
                        self.display_error(target, &diagnostic_messages::NOT_AN_LVALUE, &[]);
                    } else if op == AssignOp::Assign {
                        let declared = self.type_at(target);
                        self.check_assignable(value, &declared);
                    }
                }
                NodeData::Unary { op, operand } if op.is_update() => {
                    if !self.is_lvalue(operand) {
                        self.display_error(operand, &diagnostic_messages::NOT_AN_LVALUE, &[]);
                    }
                }
                NodeData::ForEach { .. } => {
                    let declared = self.type_at(idx);
                    if let Some(element) = self.ctx.model.inferred_type(idx).cloned()
                        && !declared.is_unresolved()
                        && !element.is_unresolved()
                        && !is_assignable_from(self.db(), &declared, &element)
                    {
                        self.display_type_error(idx, &declared, &element);
                    }
                }
                NodeData::Lambda { body, .. } => self.check_lambda_body(idx, body),
                NodeData::Return { expression } => self.check_return(idx, expression),
                NodeData::Throw { expression } => {
                    let thrown = self.type_at(expression);
                    if let Some(throwable) = self.db().well_known().throwable {
                        let expected = TypeRef::Class(throwable);
                        if !matches!(thrown, TypeRef::Null) && !is_assignable_from(self.db(), &expected, &thrown) {
                            self.display_type_error(expression, &expected, &thrown);
                        }
                    }
                }
                NodeData::Break { label } => self.check_jump(idx, label.as_deref(), false),
                NodeData::Continue { label } => self.check_jump(idx, label.as_deref(), true),
                _ => {}
            }
        }
    }

    fn type_at(&self, idx: NodeIndex) -> TypeRef {
        self.ctx
            .model
            .type_of(idx)
            .cloned()
            .unwrap_or(TypeRef::Unresolved)
    }

    fn check_condition(&mut self, condition: NodeIndex) {
        let ty = self.type_at(condition);
        if ty.is_unresolved() || unboxed_kind(self.db(), &ty) == Some(PrimitiveKind::Boolean) {
            return;
        }
        let shown = self.display_type(&ty);
        self.display_error(condition, &diagnostic_messages::CONDITION_NOT_BOOLEAN, &[&shown]);
    }

    /// Report `value` when its type cannot be assigned to `target`.
    /// Integer constants narrow to `byte`, `short` and `char` when they fit.
    pub(crate) fn check_assignable(&mut self, value: NodeIndex, target: &TypeRef) {
        let actual = self.type_at(value);
        if target.is_unresolved() || actual.is_unresolved() || is_assignable_from(self.db(), target, &actual) {
            return;
        }
        if let Some(kind) = target.primitive()
            && let Some(NodeData::Literal {
                value: LiteralValue::Int(constant),
            }) = self.ctx.arena.data(value)
            && constant_fits(*constant, kind)
        {
            return;
        }
        self.display_type_error(value, target, &actual);
    }

    /// Whether `expr` denotes a variable, field, writable property or array
    /// element. Unresolved expressions already carry their own error.
    pub(crate) fn is_lvalue(&self, expr: NodeIndex) -> bool {
        if self.type_at(expr).is_unresolved() {
            return true;
        }
        match self.ctx.arena.data(expr) {
            Some(NodeData::Identifier { arguments: None, .. }) => self
                .ctx
                .model
                .final_binding(expr)
                .is_some_and(MemberBinding::is_assignable),
            Some(NodeData::Selector { selectors, .. }) => {
                let Some(last) = selectors.iter().last() else {
                    return false;
                };
                match self.ctx.arena.data(last) {
                    Some(NodeData::ArraySelector { .. }) => true,
                    Some(NodeData::VariableSelector { arguments: None, .. }) => self
                        .ctx
                        .model
                        .final_binding(last)
                        .is_some_and(MemberBinding::is_assignable),
                    _ => false,
                }
            }
            Some(NodeData::Paren { expression }) => self.is_lvalue(*expression),
            _ => false,
        }
    }

    /// Expected return type for a `return` inside `idx`'s method or lambda,
    /// with the name used in diagnostics.
    fn enclosing_return(&self, idx: NodeIndex) -> Option<(String, TypeRef)> {
        let owner = self.ctx.arena.find_ancestor(idx, |d| {
            matches!(
                d,
                NodeData::MethodDeclaration { .. }
                    | NodeData::ConstructorDeclaration { .. }
                    | NodeData::Lambda { .. }
            )
        })?;
        match self.ctx.arena.data(owner)? {
            NodeData::MethodDeclaration { name, .. } => Some((name.clone(), self.type_at(owner))),
            NodeData::ConstructorDeclaration { .. } => Some(("<init>".to_string(), TypeRef::VOID)),
            NodeData::Lambda { .. } => match self.ctx.model.final_binding(owner) {
                Some(MemberBinding::Method { target, .. }) => {
                    Some((target.method.name.clone(), target.return_type.clone()))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn check_return(&mut self, idx: NodeIndex, expression: NodeIndex) {
        let Some((name, expected)) = self.enclosing_return(idx) else {
            return;
        };
        if expected.is_unresolved() {
            return;
        }
        if expression.is_none() {
            if !expected.is_void() {
                let shown = self.display_type(&expected);
                self.display_error(idx, &diagnostic_messages::MISSING_RETURN_VALUE, &[&name, &shown]);
            }
            return;
        }
        if expected.is_void() {
            let actual = self.type_at(expression);
            self.display_type_error(expression, &expected, &actual);
            return;
        }
        self.check_assignable(expression, &expected);
    }

    fn check_lambda_body(&mut self, idx: NodeIndex, body: NodeIndex) {
        if matches!(self.ctx.arena.data(body), Some(NodeData::Block { .. })) {
            return;
        }
        let expected = match self.ctx.model.final_binding(idx) {
            Some(MemberBinding::Method { target, .. }) => target.return_type.clone(),
            _ => return,
        };
        if !expected.is_void() {
            self.check_assignable(body, &expected);
        }
    }

    /// `break`/`continue` must target an enclosing statement of the same
    /// method or lambda.
    fn check_jump(&mut self, idx: NodeIndex, label: Option<&str>, is_continue: bool) {
        let keyword = if is_continue { "continue" } else { "break" };
        let arena = &*self.ctx.arena;
        let mut current = arena.parent_of(idx);
        let mut found = false;
        while current.is_some() {
            let Some(data) = arena.data(current) else {
                break;
            };
            if is_callable_boundary(data) {
                break;
            }
            match (label, data) {
                (Some(wanted), NodeData::Labeled { label, statement }) if label == wanted => {
                    found = !is_continue || arena.data(*statement).is_some_and(NodeData::is_loop);
                    break;
                }
                (None, data) if data.is_loop() => {
                    found = true;
                    break;
                }
                (None, NodeData::Switch { .. }) if !is_continue => {
                    found = true;
                    break;
                }
                _ => {}
            }
            current = arena.parent_of(current);
        }
        if found {
            return;
        }
        match label {
            Some(label) => {
                self.display_error(idx, &diagnostic_messages::UNDEFINED_LABEL, &[label]);
            }
            None => {
                self.display_error(idx, &diagnostic_messages::JUMP_OUTSIDE_LOOP, &[keyword]);
            }
        }
    }
}
