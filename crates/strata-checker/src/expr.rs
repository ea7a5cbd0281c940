//! Expression typing.
//!
//! `resolve_type` computes a node's static type once and caches it in the
//! semantic model. Expectations flow top-down through `set_inferred_type`
//! before the child is resolved: lambda bodies, conditional branches, array
//! initializer elements and diamond allocations read them.

use smallvec::SmallVec;
use strata_ast::{AssignOp, BinaryOp, LiteralValue, NodeData, NodeIndex, NodeList, TypeSyntax, UnaryOp};
use strata_common::diagnostics::diagnostic_messages;
use strata_solver::{
    MethodLookup, PrimitiveKind, TypeContext, TypeRef, as_super, boxed_type, chain_root,
    declared_type_params, find_constructor, functional_method, is_assignable_from, is_compatible,
    layers, unboxed_kind,
};
use tracing::trace;

use crate::model::{MemberBinding, Receiver};
use crate::state::CheckerState;

/// Unary numeric promotion.
pub(crate) fn promote_unary(kind: PrimitiveKind) -> PrimitiveKind {
    match kind {
        PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char => PrimitiveKind::Int,
        other => other,
    }
}

impl<'a> CheckerState<'a> {
    /// Static type of an expression, cached per node.
    ///
    /// Called outside a walk, the enclosing member is started first so
    /// locals and `this` are in scope.
    pub fn resolve_type(&mut self, idx: NodeIndex) -> TypeRef {
        if idx.is_none() {
            return TypeRef::Unresolved;
        }
        if let Some(ty) = self.ctx.model.type_of(idx) {
            return ty.clone();
        }
        if !self.ctx.walking {
            self.start(idx);
            return self
                .ctx
                .model
                .type_of(idx)
                .cloned()
                .unwrap_or(TypeRef::Unresolved);
        }
        if !self.ctx.depth.enter() {
            self.ctx.model.set_type(idx, TypeRef::Unresolved);
            return TypeRef::Unresolved;
        }
        let ty = self.compute_type(idx);
        self.ctx.depth.leave();
        trace!(node = idx.0, ty = %self.display_type(&ty), "resolve_type");
        self.ctx.model.set_type(idx, ty.clone());
        ty
    }

    /// Seed the type `idx` is expected to have. Propagates into
    /// parentheses, conditional branches and array initializer elements.
    pub fn set_inferred_type(&mut self, idx: NodeIndex, ty: TypeRef) {
        if idx.is_none() {
            return;
        }
        let mut forward: SmallVec<[(NodeIndex, TypeRef); 2]> = SmallVec::new();
        match self.ctx.arena.data(idx) {
            Some(NodeData::Paren { expression }) => forward.push((*expression, ty.clone())),
            Some(NodeData::Conditional {
                when_true,
                when_false,
                ..
            }) => {
                forward.push((*when_true, ty.clone()));
                forward.push((*when_false, ty.clone()));
            }
            Some(NodeData::ArrayInitializer { elements }) => {
                if let Some(element) = ty.element() {
                    forward.extend(elements.iter().map(|e| (e, element.clone())));
                }
            }
            _ => {}
        }
        self.ctx.model.set_inferred(idx, ty);
        for (child, child_ty) in forward {
            self.set_inferred_type(child, child_ty);
        }
    }

    pub(crate) fn display_types(&self, types: &[TypeRef]) -> String {
        types
            .iter()
            .map(|t| self.display_type(t))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn compute_type(&mut self, idx: NodeIndex) -> TypeRef {
        let Some(data) = self.ctx.arena.data(idx).cloned() else {
            return TypeRef::Unresolved;
        };
        match data {
            NodeData::Literal { value } => self.literal_type(&value),
            NodeData::Identifier { names, arguments } => {
                self.resolve_identifier(idx, &names, arguments.as_ref())
            }
            NodeData::Selector {
                expression,
                selectors,
            } => self.resolve_selector_chain(idx, expression, &selectors),
            // Resolved by the enclosing selector chain.
            NodeData::VariableSelector { .. } | NodeData::ArraySelector { .. } => TypeRef::Unresolved,
            NodeData::This { qualifier } => self.this_type(idx, qualifier.as_deref()),
            NodeData::Binary { op, left, right } => self.binary_type(idx, op, left, right),
            NodeData::Unary { op, operand } => self.unary_type(idx, op, operand),
            NodeData::Assignment { op, target, value } => self.assignment_type(idx, op, target, value),
            NodeData::Conditional {
                condition,
                when_true,
                when_false,
            } => self.conditional_type(idx, condition, when_true, when_false),
            NodeData::Cast { ty, expression } => self.cast_type(idx, &ty, expression),
            NodeData::InstanceOf { expression, ty } => {
                self.resolve_type(expression);
                let target = self.resolve_type_syntax(idx, &ty);
                self.ctx.model.set_written_type(idx, target);
                TypeRef::BOOLEAN
            }
            NodeData::New { ty, arguments } => self.new_type(idx, &ty, &arguments),
            NodeData::NewArray {
                element,
                dimensions,
                initializer,
            } => self.new_array_type(idx, &element, &dimensions, initializer),
            NodeData::ArrayInitializer { elements } => self.array_initializer_type(idx, &elements),
            NodeData::Lambda { params, body } => self.lambda_type(idx, &params, body),
            NodeData::Paren { expression } => self.resolve_type(expression),
            NodeData::Sequence { temps, expressions } => self.sequence_type(idx, &temps, &expressions),
            // Statements and declarations have no value.
            _ => TypeRef::VOID,
        }
    }

    fn literal_type(&self, value: &LiteralValue) -> TypeRef {
        match value {
            LiteralValue::Null => TypeRef::Null,
            LiteralValue::Boolean(_) => TypeRef::BOOLEAN,
            LiteralValue::Char(_) => TypeRef::CHAR,
            LiteralValue::Int(_) => TypeRef::INT,
            LiteralValue::Long(_) => TypeRef::LONG,
            LiteralValue::Float(_) => TypeRef::FLOAT,
            LiteralValue::Double(_) => TypeRef::DOUBLE,
            LiteralValue::String(_) => self.db().string_type(),
        }
    }

    pub(crate) fn is_string(&self, ty: &TypeRef) -> bool {
        let string = self.db().string_type();
        !string.is_unresolved() && *ty == string
    }

    /// Result type of `left op right`, or `None` when the operator does not
    /// apply to the operand types.
    pub(crate) fn binary_result(&self, op: BinaryOp, left: &TypeRef, right: &TypeRef) -> Option<TypeRef> {
        let db = self.db();
        let lk = unboxed_kind(db, left);
        let rk = unboxed_kind(db, right);
        let numeric = lk.zip(rk).filter(|(a, b)| a.is_numeric() && b.is_numeric());
        let integral = lk.zip(rk).filter(|(a, b)| a.is_integral() && b.is_integral());
        let both_boolean = lk == Some(PrimitiveKind::Boolean) && rk == Some(PrimitiveKind::Boolean);
        match op {
            BinaryOp::Add if self.is_string(left) || self.is_string(right) => {
                let other = if self.is_string(left) { right } else { left };
                (!other.is_void()).then(|| db.string_type())
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                numeric.map(|(a, b)| TypeRef::Primitive(PrimitiveKind::promote(a, b)))
            }
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => {
                integral.map(|(a, _)| TypeRef::Primitive(promote_unary(a)))
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
                if both_boolean {
                    Some(TypeRef::BOOLEAN)
                } else {
                    integral.map(|(a, b)| TypeRef::Primitive(PrimitiveKind::promote(a, b)))
                }
            }
            BinaryOp::And | BinaryOp::Or => both_boolean.then_some(TypeRef::BOOLEAN),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                numeric.map(|_| TypeRef::BOOLEAN)
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                let comparable = numeric.is_some()
                    || both_boolean
                    || (left.is_reference() && right.is_reference() && is_compatible(db, left, right))
                    || matches!(left, TypeRef::Null | TypeRef::TypeParam(_))
                    || matches!(right, TypeRef::Null | TypeRef::TypeParam(_));
                comparable.then_some(TypeRef::BOOLEAN)
            }
        }
    }

    fn operator_error(&mut self, idx: NodeIndex, symbol: &str, left: &TypeRef, right: &TypeRef) {
        let l = self.display_type(left);
        let r = self.display_type(right);
        self.display_error(idx, &diagnostic_messages::OPERATOR_NOT_APPLICABLE, &[symbol, &l, &r]);
    }

    fn binary_type(&mut self, idx: NodeIndex, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> TypeRef {
        let l = self.resolve_type(left);
        let r = self.resolve_type(right);
        let fallback = if op.yields_boolean() {
            TypeRef::BOOLEAN
        } else {
            TypeRef::Unresolved
        };
        if l.is_unresolved() || r.is_unresolved() {
            return fallback;
        }
        match self.binary_result(op, &l, &r) {
            Some(ty) => ty,
            None => {
                self.operator_error(idx, op.symbol(), &l, &r);
                fallback
            }
        }
    }

    fn unary_type(&mut self, idx: NodeIndex, op: UnaryOp, operand: NodeIndex) -> TypeRef {
        let ty = self.resolve_type(operand);
        if ty.is_unresolved() {
            return ty;
        }
        let kind = unboxed_kind(self.db(), &ty);
        let result = match op {
            UnaryOp::Not => (kind == Some(PrimitiveKind::Boolean)).then_some(TypeRef::BOOLEAN),
            UnaryOp::Plus | UnaryOp::Minus => kind
                .filter(|k| k.is_numeric())
                .map(|k| TypeRef::Primitive(promote_unary(k))),
            UnaryOp::BitNot => kind
                .filter(|k| k.is_integral())
                .map(|k| TypeRef::Primitive(promote_unary(k))),
            // Updates keep the variable's own type.
            _ => kind.filter(|k| k.is_numeric()).map(|_| ty.clone()),
        };
        match result {
            Some(result) => result,
            None => {
                let shown = self.display_type(&ty);
                self.display_error(
                    idx,
                    &diagnostic_messages::OPERATOR_NOT_APPLICABLE,
                    &[op.symbol(), &shown, ""],
                );
                TypeRef::Unresolved
            }
        }
    }

    fn assignment_type(&mut self, idx: NodeIndex, op: AssignOp, target: NodeIndex, value: NodeIndex) -> TypeRef {
        let target_ty = self.resolve_type(target);
        match op.binary_op() {
            None => {
                if !target_ty.is_unresolved() {
                    self.set_inferred_type(value, target_ty.clone());
                }
                self.resolve_type(value);
            }
            Some(binary) => {
                let value_ty = self.resolve_type(value);
                if !target_ty.is_unresolved()
                    && !value_ty.is_unresolved()
                    && self.binary_result(binary, &target_ty, &value_ty).is_none()
                {
                    self.operator_error(idx, op.symbol(), &target_ty, &value_ty);
                }
            }
        }
        target_ty
    }

    fn conditional_type(
        &mut self,
        idx: NodeIndex,
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    ) -> TypeRef {
        self.resolve_type(condition);
        let t = self.resolve_type(when_true);
        let f = self.resolve_type(when_false);
        let db = self.db();
        if t == f {
            return t;
        }
        if t.is_unresolved() || f.is_unresolved() {
            return TypeRef::Unresolved;
        }
        let kinds = unboxed_kind(db, &t).zip(unboxed_kind(db, &f));
        if let Some((a, b)) = kinds {
            if a.is_numeric() && b.is_numeric() {
                return TypeRef::Primitive(PrimitiveKind::promote(a, b));
            }
            if a == PrimitiveKind::Boolean && b == PrimitiveKind::Boolean {
                return TypeRef::BOOLEAN;
            }
        }
        let boxed = |ty: &TypeRef| match ty.primitive() {
            Some(kind) => boxed_type(db, kind).unwrap_or_else(|| ty.clone()),
            None => ty.clone(),
        };
        if matches!(t, TypeRef::Null) {
            return boxed(&f);
        }
        if matches!(f, TypeRef::Null) {
            return boxed(&t);
        }
        let (bt, bf) = (boxed(&t), boxed(&f));
        if is_assignable_from(db, &bt, &bf) {
            return bt;
        }
        if is_assignable_from(db, &bf, &bt) {
            return bf;
        }
        self.ctx
            .model
            .inferred_type(idx)
            .cloned()
            .unwrap_or_else(|| self.object_type())
    }

    /// Whether a value of static type `source` may be cast to `target`.
    pub(crate) fn is_castable(&self, source: &TypeRef, target: &TypeRef) -> bool {
        let db = self.db();
        if source.is_unresolved() || target.is_unresolved() || source == target {
            return true;
        }
        match (source.primitive(), target.primitive()) {
            (Some(s), Some(t)) => {
                (s.is_numeric() && t.is_numeric())
                    || (s == PrimitiveKind::Boolean && t == PrimitiveKind::Boolean)
            }
            // Boxing followed by a widening reference conversion.
            (Some(s), None) => {
                boxed_type(db, s).is_some_and(|boxed| is_assignable_from(db, target, &boxed))
            }
            // Unboxing, possibly after a narrowing reference conversion.
            (None, Some(t)) => {
                unboxed_kind(db, source).is_some_and(|k| k == t || k.widens_to(t))
                    || boxed_type(db, t).is_some_and(|boxed| is_assignable_from(db, source, &boxed))
            }
            (None, None) => {
                if matches!(source, TypeRef::Null) {
                    return true;
                }
                let is_open = |ty: &TypeRef| {
                    matches!(ty, TypeRef::TypeParam(_))
                        || ty
                            .class_id()
                            .and_then(|id| db.declaration(id))
                            .is_some_and(|d| d.is_interface())
                };
                match (source.element(), target.element()) {
                    (Some(s), Some(t)) => self.is_castable(s, t),
                    (Some(_), None) | (None, Some(_)) => {
                        is_assignable_from(db, target, source) || is_assignable_from(db, source, target)
                    }
                    (None, None) => is_compatible(db, source, target) || is_open(source) || is_open(target),
                }
            }
        }
    }

    fn cast_type(&mut self, idx: NodeIndex, ty: &TypeSyntax, expression: NodeIndex) -> TypeRef {
        let target = self.resolve_type_syntax(idx, ty);
        self.ctx.model.set_written_type(idx, target.clone());
        if !target.is_unresolved() {
            self.set_inferred_type(expression, target.clone());
        }
        let source = self.resolve_type(expression);
        if !self.is_castable(&source, &target) {
            let s = self.display_type(&source);
            let t = self.display_type(&target);
            self.display_error(idx, &diagnostic_messages::INVALID_CAST, &[&s, &t]);
        }
        target
    }

    /// Resolve call arguments. Lambdas get a placeholder: their target type
    /// comes from the selected parameter.
    pub(crate) fn resolve_arguments(&mut self, args: &NodeList) -> Vec<TypeRef> {
        args.iter()
            .map(|arg| {
                if self.is_lambda(arg) {
                    TypeRef::Unresolved
                } else {
                    self.resolve_type(arg)
                }
            })
            .collect()
    }

    /// Resolve lambda arguments against the parameters of the selected
    /// method (or without a target when nothing was selected).
    pub(crate) fn seed_lambda_arguments(&mut self, args: &NodeList, params: Option<&[TypeRef]>) {
        for (i, arg) in args.iter().enumerate() {
            if !self.is_lambda(arg) {
                continue;
            }
            if let Some(param) = params.and_then(|p| p.get(i)) {
                self.set_inferred_type(arg, param.clone());
            }
            self.resolve_type(arg);
        }
    }

    fn is_lambda(&self, idx: NodeIndex) -> bool {
        match self.ctx.arena.data(idx) {
            Some(NodeData::Lambda { .. }) => true,
            Some(NodeData::Paren { expression }) => self.is_lambda(*expression),
            _ => false,
        }
    }

    /// Hops from the innermost class frame to the instance enclosing an
    /// object of the non-static nested type `id`.
    pub(crate) fn outer_instance_hops(&self, id: strata_solver::TypeId) -> Option<u32> {
        let db = self.db();
        let decl = db.declaration(id)?;
        if decl.is_static {
            return None;
        }
        let enclosing = chain_root(db, decl.enclosing?);
        self.ctx
            .classes
            .iter()
            .rev()
            .position(|frame| chain_root(db, frame.id) == enclosing)
            .map(|hops| hops as u32)
    }

    fn new_type(&mut self, idx: NodeIndex, ty: &TypeSyntax, arguments: &NodeList) -> TypeRef {
        let db = self.db();
        let mut target = self.resolve_type_syntax(idx, ty);
        let Some(id) = target.class_id() else {
            self.resolve_arguments(arguments);
            self.seed_lambda_arguments(arguments, None);
            return target;
        };

        // `new Box<>()` takes its arguments from the expected type.
        let params = declared_type_params(db, id);
        if ty.args.is_empty() && !params.is_empty() {
            let expected = self.ctx.model.inferred_type(idx).cloned();
            if let Some(expected) = expected
                && let Some(expected_id) = expected.class_id()
            {
                let generic = TypeRef::parameterized(
                    id,
                    params.iter().cloned().map(TypeRef::TypeParam).collect(),
                );
                if let Some(viewed) = as_super(db, &generic, chain_root(db, expected_id)) {
                    let mut ctx = TypeContext::new();
                    ctx.infer(db, &params, &viewed, &expected);
                    let args = params
                        .iter()
                        .map(|p| ctx.get(&p.name).cloned().unwrap_or_else(|| self.object_type()))
                        .collect();
                    target = TypeRef::parameterized(id, args);
                }
            }
        }

        if layers(db, id).into_iter().any(|layer| db.declaration(layer).is_some_and(|d| d.is_abstract)) {
            let shown = self.display_type(&target);
            self.display_error(idx, &diagnostic_messages::ABSTRACT_INSTANTIATION, &[&shown]);
        }

        let arg_types = self.resolve_arguments(arguments);
        match find_constructor(db, &target, &arg_types) {
            MethodLookup::Found(m) => {
                let params = m.params.clone();
                let receiver = match self.outer_instance_hops(id) {
                    Some(outer) => Receiver::Implicit { outer },
                    None => Receiver::Static,
                };
                self.ctx.model.set_bindings(
                    idx,
                    vec![MemberBinding::Method {
                        target: m.into(),
                        receiver,
                    }],
                );
                self.seed_lambda_arguments(arguments, Some(&params));
            }
            MethodLookup::NotFound | MethodLookup::NotApplicable { .. } => {
                let shown = self.display_type(&target);
                let args = self.display_types(&arg_types);
                self.display_error(idx, &diagnostic_messages::NO_MATCHING_CONSTRUCTOR, &[&shown, &args]);
                self.seed_lambda_arguments(arguments, None);
            }
        }
        target
    }

    /// `new T[d0]...` has one array level per dimension expression; with an
    /// initializer and no dimensions it has one level.
    fn new_array_type(
        &mut self,
        idx: NodeIndex,
        element: &TypeSyntax,
        dimensions: &NodeList,
        initializer: NodeIndex,
    ) -> TypeRef {
        let element_ty = self.resolve_type_syntax(idx, element);
        for dim in dimensions.iter() {
            let dim_ty = self.resolve_type(dim);
            let is_index = unboxed_kind(self.db(), &dim_ty)
                .is_some_and(|k| k.is_integral() && k.widens_to(PrimitiveKind::Int));
            if !dim_ty.is_unresolved() && !is_index {
                self.display_type_error(dim, &TypeRef::INT, &dim_ty);
            }
        }
        let mut ty = element_ty.clone();
        for _ in 0..dimensions.len().max(1) {
            ty = TypeRef::array_of(ty);
        }
        if element_ty.is_unresolved() {
            ty = TypeRef::Unresolved;
        }
        self.ctx.model.set_written_type(idx, ty.clone());
        if initializer.is_some() {
            self.set_inferred_type(initializer, ty.clone());
            self.resolve_type(initializer);
        }
        ty
    }

    fn array_initializer_type(&mut self, idx: NodeIndex, elements: &NodeList) -> TypeRef {
        let expected = self
            .ctx
            .model
            .inferred_type(idx)
            .filter(|ty| ty.element().is_some())
            .cloned();
        let mut element_types = Vec::with_capacity(elements.len());
        for element in elements.iter() {
            element_types.push(self.resolve_type(element));
        }
        match expected {
            Some(ty) => ty,
            None => match element_types.first() {
                Some(first) if !first.is_unresolved() => TypeRef::array_of(first.clone()),
                _ => TypeRef::array_of(self.object_type()),
            },
        }
    }

    fn lambda_type(&mut self, idx: NodeIndex, params: &[String], body: NodeIndex) -> TypeRef {
        let Some(target) = self.ctx.model.inferred_type(idx).cloned() else {
            self.display_error(idx, &diagnostic_messages::LAMBDA_TARGET_UNKNOWN, &[]);
            return TypeRef::Unresolved;
        };
        if target.is_unresolved() {
            return TypeRef::Unresolved;
        }
        let Some(method) = functional_method(self.db(), &target) else {
            self.display_error(idx, &diagnostic_messages::LAMBDA_TARGET_UNKNOWN, &[]);
            return TypeRef::Unresolved;
        };
        if method.params.len() != params.len() {
            let expected = method.params.len().to_string();
            let actual = params.len().to_string();
            self.display_error(idx, &diagnostic_messages::WRONG_ARGUMENT_COUNT, &[&expected, &actual]);
        }
        self.ctx.model.set_frame_size(idx, params.len());
        self.ctx.scopes.push(false);
        for (i, name) in params.iter().enumerate() {
            let ty = method.params.get(i).cloned().unwrap_or(TypeRef::Unresolved);
            self.define_local(idx, name, ty);
        }
        let ret = method.return_type.clone();
        self.ctx.model.set_bindings(
            idx,
            vec![MemberBinding::Method {
                target: method.into(),
                receiver: Receiver::Value,
            }],
        );
        self.ctx.returns.push(ret.clone());
        let is_block = matches!(self.ctx.arena.data(body), Some(NodeData::Block { .. }));
        if is_block {
            self.start_node(body);
        } else {
            if !ret.is_void() {
                self.set_inferred_type(body, ret);
            }
            self.resolve_type(body);
        }
        self.ctx.returns.pop();
        self.ctx.scopes.pop();
        target
    }

    /// Temporaries are typed by their first `temp = value` assignment.
    fn sequence_type(&mut self, idx: NodeIndex, temps: &[String], expressions: &NodeList) -> TypeRef {
        self.ctx.model.set_frame_size(idx, temps.len());
        self.ctx.scopes.push(false);
        let mut last = TypeRef::VOID;
        for expr in expressions.iter() {
            if let Some(NodeData::Assignment {
                op: AssignOp::Assign,
                target,
                value,
            }) = self.ctx.arena.data(expr).cloned()
                && let Some(NodeData::Identifier { names, arguments: None }) =
                    self.ctx.arena.data(target).cloned()
                && let [name] = names.as_slice()
                && temps.contains(name)
                && self.ctx.scopes.lookup(name).is_none()
            {
                let value_ty = self.resolve_type(value);
                self.define_local(expr, name, value_ty);
            }
            last = self.resolve_type(expr);
        }
        self.ctx.scopes.pop();
        last
    }

    fn this_type(&mut self, idx: NodeIndex, qualifier: Option<&str>) -> TypeRef {
        let Some(frame) = self.current_class().cloned() else {
            let name = qualifier.unwrap_or("this");
            self.display_error(idx, &diagnostic_messages::NO_ENCLOSING_INSTANCE, &[name]);
            return TypeRef::Unresolved;
        };
        if frame.static_context {
            self.display_error(idx, &diagnostic_messages::STATIC_CONTEXT_THIS, &[]);
            return frame.this_type;
        }
        let Some(qualifier) = qualifier else {
            return frame.this_type;
        };
        let db = self.db();
        for (hops, class) in self.ctx.classes.iter().rev().enumerate() {
            let matches = db.type_name(class.id) == qualifier || db.qualified_type_name(class.id) == qualifier;
            if matches {
                let ty = class.this_type.clone();
                self.ctx.model.set_this_hops(idx, hops as u32);
                return ty;
            }
            // A static class has no enclosing instance.
            if db.declaration(class.id).is_none_or(|d| d.is_static) {
                break;
            }
        }
        self.display_error(idx, &diagnostic_messages::NO_ENCLOSING_INSTANCE, &[qualifier]);
        TypeRef::Unresolved
    }
}
