//! Expressions, rendered to strings.
//!
//! Member access follows the bindings recorded by the checker: implicit
//! receivers print as `this` (or `this.$outer` hops), static members through
//! the owning type, and compiled members through the native mapping.

use strata_ast::{BinaryOp, LiteralValue, NodeData, NodeIndex, NodeList, TypeSyntax};
use strata_checker::{MemberBinding, MethodTarget, PropertyAccessor, Receiver};
use strata_solver::{PrimitiveKind, TypeId, TypeOrigin, TypeRef, is_subtype_of, unboxed_kind};
use tracing::debug;

use super::runtime::{Helper, default_value, string_literal};
use super::JsPrinter;

const PRIMARY: u8 = 20;
const POSTFIX: u8 = 16;
const PREFIX: u8 = 15;
const CONDITIONAL: u8 = 3;
const ASSIGNMENT: u8 = 2;

fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 13,
        BinaryOp::Add | BinaryOp::Sub => 12,
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 11,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 10,
        BinaryOp::Eq | BinaryOp::Ne => 9,
        BinaryOp::BitAnd => 8,
        BinaryOp::BitXor => 7,
        BinaryOp::BitOr => 6,
        BinaryOp::And => 5,
        BinaryOp::Or => 4,
    }
}

fn binary_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "===",
        BinaryOp::Ne => "!==",
        op => op.symbol(),
    }
}

/// `this`, `outer` enclosing instances out.
fn this_path(outer: u32) -> String {
    let mut path = String::from("this");
    for _ in 0..outer {
        path.push_str(".$outer");
    }
    path
}

fn number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{value}")
    }
}

impl JsPrinter<'_> {
    pub(crate) fn expression(&mut self, idx: NodeIndex) -> String {
        if !self.depth.enter() {
            debug!(node = idx.0, "[printer] expression depth limit reached");
            return "undefined".to_string();
        }
        let text = self.expression_inner(idx);
        self.depth.leave();
        text
    }

    /// `idx` printed for a context binding at least as tightly as `min`.
    pub(crate) fn operand(&mut self, idx: NodeIndex, min: u8) -> String {
        let text = self.expression(idx);
        if self.precedence(idx) < min {
            format!("({text})")
        } else {
            text
        }
    }

    fn precedence(&self, idx: NodeIndex) -> u8 {
        match self.arena.data(idx) {
            Some(NodeData::Binary { op, .. }) => binary_precedence(*op),
            Some(NodeData::InstanceOf { .. }) => 10,
            Some(NodeData::Conditional { .. }) => CONDITIONAL,
            Some(NodeData::Assignment { .. }) => ASSIGNMENT,
            Some(NodeData::Unary { op, .. }) if op.is_postfix() => POSTFIX,
            Some(NodeData::Unary { .. }) => PREFIX,
            Some(NodeData::Cast { expression, .. }) => self.precedence(*expression),
            Some(NodeData::Literal { value }) => match value {
                LiteralValue::Int(v) if *v < 0 => PREFIX,
                LiteralValue::Long(v) if *v < 0 => PREFIX,
                LiteralValue::Float(v) if v.is_sign_negative() => PREFIX,
                LiteralValue::Double(v) if v.is_sign_negative() => PREFIX,
                _ => PRIMARY,
            },
            _ => PRIMARY,
        }
    }

    fn expression_inner(&mut self, idx: NodeIndex) -> String {
        let arena = self.arena;
        let Some(data) = arena.data(idx) else {
            return "undefined".to_string();
        };
        match data {
            NodeData::Literal { value } => literal(value),
            NodeData::Identifier { names, arguments } => self.identifier(idx, names, arguments.as_ref()),
            NodeData::Selector {
                expression,
                selectors,
            } => self.selector_chain(*expression, selectors),
            NodeData::This { .. } => this_path(self.model.this_hops(idx)),
            NodeData::Binary { op, left, right } => self.binary(idx, *op, *left, *right),
            NodeData::Unary { op, operand } => {
                if op.is_postfix() {
                    let operand = self.operand(*operand, POSTFIX);
                    format!("{operand}{}", op.symbol())
                } else {
                    let operand = self.operand(*operand, PREFIX);
                    let symbol = op.symbol();
                    // `- -x`, not `--x`.
                    if symbol.len() == 1 && operand.starts_with(symbol) {
                        format!("{symbol} {operand}")
                    } else {
                        format!("{symbol}{operand}")
                    }
                }
            }
            NodeData::Assignment { op, target, value } => {
                let target_text = self.expression(*target);
                let mut value_text = self.operand(*value, ASSIGNMENT);
                if op.binary_op() == Some(BinaryOp::Add) && self.is_string(*target) && self.is_char(*value) {
                    value_text = format!("String.fromCharCode({value_text})");
                }
                format!("{target_text} {} {value_text}", op.symbol())
            }
            NodeData::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                let condition = self.operand(*condition, CONDITIONAL + 1);
                let when_true = self.operand(*when_true, ASSIGNMENT);
                let when_false = self.operand(*when_false, CONDITIONAL);
                format!("{condition} ? {when_true} : {when_false}")
            }
            // Narrowing casts were lowered; what remains needs no conversion.
            NodeData::Cast { expression, .. } => self.expression(*expression),
            NodeData::InstanceOf { expression, ty } => {
                let value = self.operand(*expression, PRIMARY);
                let ty = self.written_or_named(idx, ty);
                self.type_test(&value, &ty)
            }
            NodeData::New { ty, arguments } => self.new_expression(idx, ty, arguments),
            NodeData::NewArray {
                element,
                dimensions,
                initializer,
            } => {
                if initializer.is_some() {
                    return self.expression(*initializer);
                }
                self.helpers.insert(Helper::NewArray);
                let dims = self.argument_list(dimensions.iter());
                format!("{}([{}], {})", Helper::NewArray.name(), dims.join(", "), default_value(element))
            }
            NodeData::ArrayInitializer { elements } => {
                let items = self.argument_list(elements.iter());
                format!("[{}]", items.join(", "))
            }
            NodeData::Lambda { params, body } => self.lambda(idx, params, *body),
            NodeData::Paren { expression } => format!("({})", self.expression(*expression)),
            NodeData::Sequence { temps, expressions } => {
                let items = self.argument_list(expressions.iter());
                format!("(({}) => ({}))()", temps.join(", "), items.join(", "))
            }
            other => {
                debug!(node = idx.0, kind = other.kind_name(), "[printer] not an expression");
                "undefined".to_string()
            }
        }
    }

    fn argument_list(&mut self, items: impl Iterator<Item = NodeIndex>) -> Vec<String> {
        items.map(|item| self.operand(item, ASSIGNMENT)).collect()
    }

    fn binary(&mut self, idx: NodeIndex, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> String {
        let precedence = binary_precedence(op);
        let mut left_text = self.operand(left, precedence);
        let mut right_text = self.operand(right, precedence + 1);
        if op == BinaryOp::Add && self.is_string(idx) {
            if self.is_char(left) {
                left_text = format!("String.fromCharCode({left_text})");
            }
            if self.is_char(right) {
                right_text = format!("String.fromCharCode({right_text})");
            }
        }
        let text = format!("{left_text} {} {right_text}", binary_symbol(op));
        let bitwise = matches!(op, BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor);
        if bitwise && self.model.type_of(idx).is_some_and(TypeRef::is_boolean) {
            return format!("Boolean({text})");
        }
        text
    }

    fn is_string(&self, idx: NodeIndex) -> bool {
        self.model
            .type_of(idx)
            .is_some_and(|ty| *ty == self.db.string_type())
    }

    fn is_char(&self, idx: NodeIndex) -> bool {
        self.model
            .type_of(idx)
            .and_then(|ty| unboxed_kind(self.db, ty))
            == Some(PrimitiveKind::Char)
    }

    /// `idx` printed where a string is expected.
    fn stringified(&mut self, idx: NodeIndex) -> String {
        let text = self.operand(idx, ASSIGNMENT);
        if self.is_char(idx) {
            format!("String.fromCharCode({text})")
        } else {
            text
        }
    }

    fn written_or_named(&self, idx: NodeIndex, ty: &TypeSyntax) -> TypeRef {
        if let Some(written) = self.model.written_type(idx) {
            return written.clone();
        }
        match self.db.find_type(&ty.name) {
            Some(id) if ty.dims == 0 => TypeRef::Class(id),
            Some(id) => (0..ty.dims).fold(TypeRef::Class(id), |acc, _| TypeRef::array_of(acc)),
            None => TypeRef::Unresolved,
        }
    }

    /// Runtime test that `value` is an instance of `ty`.
    pub(crate) fn type_test(&mut self, value: &str, ty: &TypeRef) -> String {
        if ty.element().is_some() {
            return format!("Array.isArray({value})");
        }
        let Some(id) = ty.class_id() else {
            return format!("({value} != null)");
        };
        let db = self.db;
        let Some(decl) = db.declaration(id) else {
            return format!("({value} != null)");
        };
        match decl.qualified_name.as_str() {
            "java.lang.Object" => return format!("({value} != null)"),
            "java.lang.String" => return format!("(typeof {value} === \"string\")"),
            "java.lang.Boolean" => return format!("(typeof {value} === \"boolean\")"),
            "java.util.List" | "java.util.ArrayList" => return format!("Array.isArray({value})"),
            name if PrimitiveKind::from_boxed_name(name.rsplit('.').next().unwrap_or(name)).is_some()
                || name == "java.lang.Number" =>
            {
                return format!("(typeof {value} === \"number\")");
            }
            _ => {}
        }
        let name = self.type_name(id);
        // Null dereferences surface as TypeError in the target.
        let null_pointer = db.well_known().null_pointer;
        if decl.origin == TypeOrigin::Compiled
            && null_pointer.is_some_and(|npe| is_subtype_of(db, npe, id))
        {
            if let Some(npe) = null_pointer {
                self.exceptions.insert(npe);
            }
            return format!("({value} instanceof {name} || {value} instanceof TypeError)");
        }
        format!("({value} instanceof {name})")
    }

    // ------------------------------------------------------------------
    // Member access
    // ------------------------------------------------------------------

    fn identifier(&mut self, idx: NodeIndex, names: &[String], arguments: Option<&NodeList>) -> String {
        let model = self.model;
        let bindings = model.bindings(idx);
        let last = names.len().saturating_sub(1);
        let mut out = String::new();
        for (i, name) in names.iter().enumerate() {
            let call_args = if i == last { arguments } else { None };
            out = match bindings.get(i) {
                Some(MemberBinding::Type(ty)) => match ty.class_id() {
                    Some(id) => self.type_name(id),
                    None => name.clone(),
                },
                Some(MemberBinding::Property { accessor, receiver }) => {
                    self.property(accessor, *receiver, out, name)
                }
                Some(MemberBinding::ArrayLength) => format!("{out}.length"),
                Some(MemberBinding::Method { target, receiver }) => {
                    let args: Vec<NodeIndex> = call_args.map(|list| list.iter().collect()).unwrap_or_default();
                    self.method_call(target, *receiver, out, &args)
                }
                Some(MemberBinding::Local { .. }) | None => {
                    let joined = if out.is_empty() {
                        name.clone()
                    } else {
                        format!("{out}.{name}")
                    };
                    match call_args {
                        Some(list) => {
                            let args = self.argument_list(list.iter());
                            format!("{joined}({})", args.join(", "))
                        }
                        None => joined,
                    }
                }
            };
        }
        out
    }

    fn receiver(&mut self, receiver: Receiver, owner: TypeId, is_static: bool, previous: String) -> String {
        match receiver {
            _ if is_static => self.type_name(owner),
            Receiver::Value => previous,
            Receiver::Implicit { outer } => this_path(outer),
            Receiver::Static => self.type_name(owner),
        }
    }

    fn property(&mut self, accessor: &PropertyAccessor, receiver: Receiver, previous: String, name: &str) -> String {
        match accessor {
            PropertyAccessor::Field {
                owner,
                name,
                is_static,
            } => {
                let base = self.receiver(receiver, *owner, *is_static, previous);
                format!("{base}.{name}")
            }
            PropertyAccessor::Computed {
                owner,
                getter,
                is_static,
                ..
            } => {
                let base = self.receiver(receiver, *owner, *is_static, previous);
                format!("{base}.{getter}()")
            }
            PropertyAccessor::Native { key } => match *key {
                "System.out" => "console".to_string(),
                _ if previous.is_empty() => name.to_string(),
                _ => format!("{previous}.{name}"),
            },
        }
    }

    fn selector_chain(&mut self, expression: NodeIndex, selectors: &NodeList) -> String {
        let arena = self.arena;
        let model = self.model;
        let mut out = self.operand(expression, PRIMARY);
        for selector in selectors.iter() {
            out = match arena.data(selector) {
                Some(NodeData::ArraySelector { index }) => {
                    let index = self.expression(*index);
                    format!("{out}[{index}]")
                }
                Some(NodeData::VariableSelector { name, arguments }) => match model.final_binding(selector) {
                    Some(MemberBinding::Property { accessor, .. }) => {
                        self.property(accessor, Receiver::Value, out, name)
                    }
                    Some(MemberBinding::ArrayLength) => format!("{out}.length"),
                    Some(MemberBinding::Method { target, .. }) => {
                        let args: Vec<NodeIndex> = arguments.as_ref().map(|list| list.iter().collect()).unwrap_or_default();
                        self.method_call(target, Receiver::Value, out, &args)
                    }
                    _ => match arguments {
                        Some(list) => {
                            let args = self.argument_list(list.iter());
                            format!("{out}.{name}({})", args.join(", "))
                        }
                        None => format!("{out}.{name}"),
                    },
                },
                _ => out,
            };
        }
        out
    }

    fn method_call(&mut self, target: &MethodTarget, receiver: Receiver, previous: String, args: &[NodeIndex]) -> String {
        let base = self.receiver(receiver, target.owner, target.method.is_static, previous);
        if let Some(key) = target.method.native
            && let Some(text) = self.native_call(key, &base, args)
        {
            return text;
        }
        let name = self.method_name(&target.method);
        let args = self.argument_list(args.iter().copied());
        format!("{base}.{name}({})", args.join(", "))
    }

    /// Compiled members whose target counterpart differs in shape.
    fn native_call(&mut self, key: &str, receiver: &str, args: &[NodeIndex]) -> Option<String> {
        if let Some(helper) = key.strip_prefix("StrataRuntime.").and_then(Helper::from_runtime) {
            self.helpers.insert(helper);
            let args = self.argument_list(args.iter().copied());
            return Some(format!("{}({})", helper.name(), args.join(", ")));
        }
        let first = args.first().copied();
        let arg = |printer: &mut Self, i: usize| -> String {
            args.get(i)
                .map(|&a| printer.operand(a, ASSIGNMENT))
                .unwrap_or_default()
        };
        let text = match key {
            "PrintStream.println" | "PrintStream.print" => {
                let value = first.map(|a| self.stringified(a)).unwrap_or_default();
                format!("console.log({value})")
            }
            "String.length" | "List.size" => format!("{receiver}.length"),
            "String.isEmpty" | "List.isEmpty" => format!("({receiver}.length === 0)"),
            "String.charAt" => format!("{receiver}.charCodeAt({})", arg(self, 0)),
            "String.contains" | "List.contains" => format!("{receiver}.includes({})", arg(self, 0)),
            "String.concat" | "StringBuilder.append" => {
                let value = first.map(|a| self.stringified(a)).unwrap_or_default();
                let method = key.rsplit('.').next().unwrap_or("concat");
                format!("{receiver}.{method}({value})")
            }
            "String.valueOf" => {
                let value = first.map(|a| self.stringified(a)).unwrap_or_default();
                format!("String({value})")
            }
            "Object.toString" | "Throwable.toString" | "StringBuilder.toString" => format!("String({receiver})"),
            "Object.equals" => format!("({receiver} === {})", arg(self, 0)),
            "Throwable.getMessage" => format!("{receiver}.message"),
            "Throwable.getCause" => format!("{receiver}.cause"),
            "List.add" => format!("({receiver}.push({}), true)", arg(self, 0)),
            "List.get" => format!("{receiver}[{}]", arg(self, 0)),
            "List.set" => format!("{receiver}.splice({}, 1, {})[0]", arg(self, 0), arg(self, 1)),
            "List.remove" => format!("{receiver}.splice({}, 1)[0]", arg(self, 0)),
            "List.clear" => format!("{receiver}.splice(0)"),
            "List.iterator" => {
                self.helpers.insert(Helper::Iterator);
                format!("{}({receiver})", Helper::Iterator.name())
            }
            "Number.intValue" | "Number.longValue" => format!("Math.trunc({receiver})"),
            "Number.doubleValue" | "Boolean.booleanValue" | "Character.charValue" => receiver.to_string(),
            "Boxed.valueOf" => format!("({})", arg(self, 0)),
            "Integer.parseInt" => format!("parseInt({}, 10)", arg(self, 0)),
            "Double.parseDouble" => format!("parseFloat({})", arg(self, 0)),
            "Character.isDigit" => format!("/[0-9]/.test(String.fromCharCode({}))", arg(self, 0)),
            "System.currentTimeMillis" => "Date.now()".to_string(),
            _ => return None,
        };
        Some(text)
    }

    fn new_expression(&mut self, idx: NodeIndex, ty: &TypeSyntax, arguments: &NodeList) -> String {
        let model = self.model;
        let db = self.db;
        let Some(MemberBinding::Method { target, receiver }) = model.final_binding(idx) else {
            let args = self.argument_list(arguments.iter());
            return format!("new {}({})", ty.simple_name(), args.join(", "));
        };
        let decl = db.declaration(target.owner);
        let mut args = self.argument_list(arguments.iter());
        if decl.is_some_and(|d| d.origin == TypeOrigin::Compiled) {
            match decl.map(|d| d.qualified_name.as_str()) {
                Some("java.util.ArrayList") => return "[]".to_string(),
                Some("java.lang.Object") => return "({})".to_string(),
                Some("java.lang.String") => {
                    return match args.first() {
                        Some(arg) => format!("String({arg})"),
                        None => "\"\"".to_string(),
                    };
                }
                _ => {}
            }
        } else if let Receiver::Implicit { outer } = receiver {
            args.insert(0, this_path(*outer));
        }
        let name = self.type_name(target.owner);
        format!("new {name}({})", args.join(", "))
    }

    /// `({ run: () => ... })`: an object implementing the functional
    /// interface's single method.
    fn lambda(&mut self, idx: NodeIndex, params: &[String], body: NodeIndex) -> String {
        let method = match self.model.final_binding(idx) {
            Some(MemberBinding::Method { target, .. }) => Some(target.method.name.clone()),
            _ => None,
        };
        let arena = self.arena;
        let body_text = match arena.data(body) {
            Some(NodeData::Block { statements }) => self.capture(|printer| {
                printer.write("{");
                printer.write_line();
                printer.increase_indent();
                printer.emit_statements(statements);
                printer.decrease_indent();
                printer.write_indent();
                printer.write("}");
            }),
            _ => self.operand(body, ASSIGNMENT),
        };
        let arrow = format!("({}) => {body_text}", params.join(", "));
        match method {
            Some(method) => format!("({{ {method}: {arrow} }})"),
            None => format!("({arrow})"),
        }
    }
}

fn literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Null => "null".to_string(),
        LiteralValue::Boolean(b) => b.to_string(),
        LiteralValue::Char(c) => (*c as u32).to_string(),
        LiteralValue::Int(v) => v.to_string(),
        LiteralValue::Long(v) => v.to_string(),
        LiteralValue::Float(v) if v.is_finite() => v.to_string(),
        LiteralValue::Float(v) => number(f64::from(*v)),
        LiteralValue::Double(v) => number(*v),
        LiteralValue::String(s) => string_literal(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_strict() {
        assert_eq!(binary_symbol(BinaryOp::Eq), "===");
        assert_eq!(binary_symbol(BinaryOp::Ne), "!==");
        assert_eq!(binary_symbol(BinaryOp::Add), "+");
    }

    #[test]
    fn outer_instances_hop_through_links() {
        assert_eq!(this_path(0), "this");
        assert_eq!(this_path(2), "this.$outer.$outer");
    }

    #[test]
    fn chars_print_as_code_units() {
        assert_eq!(literal(&LiteralValue::Char('A')), "65");
        assert_eq!(literal(&LiteralValue::Double(f64::INFINITY)), "Infinity");
        assert_eq!(literal(&LiteralValue::Double(2.5)), "2.5");
    }
}
