//! Reification of binding expressions.
//!
//! A binding expression is handed to the binding subsystem as a
//! [`BindingDescriptor`]: the helper the node maps to (`bind` for property
//! chains, `method` for calls, `arith` for arithmetic and so on), a detail
//! string (member path, operator, type) and the descriptors of its inputs.
//! The descriptor is static; [`eval_binding_args`] produces the values the
//! helper is initialised with at run time.

use indexmap::IndexSet;
use serde::Serialize;
use strata_ast::{LiteralValue, NodeArena, NodeData, NodeIndex, NodeList};
use strata_checker::{MemberBinding, PropertyAccessor, Receiver, SemanticModel};
use strata_interp::{ExecutionContext, Interpreter, RuntimeError, RuntimeResult, Value};
use strata_solver::TypeRef;
use tracing::trace;

/// Static description of one node of a binding expression.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingDescriptor {
    pub helper: &'static str,
    pub node: NodeIndex,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<BindingDescriptor>,
}

/// Binding helper an expression maps to; `None` for nodes that cannot be
/// bound (lambdas, statements, declarations).
pub fn binding_type_name(arena: &NodeArena, idx: NodeIndex) -> Option<&'static str> {
    let name = match arena.data(idx)? {
        NodeData::Literal { .. } | NodeData::This { .. } => "constant",
        NodeData::Identifier { arguments, .. } => match arguments {
            Some(_) => "method",
            None => "bind",
        },
        NodeData::Selector { selectors, .. } => {
            let last = selectors.iter().last().and_then(|s| arena.data(s));
            match last {
                Some(NodeData::VariableSelector {
                    arguments: Some(_), ..
                }) => "method",
                Some(NodeData::ArraySelector { .. }) => "arrayElement",
                _ => "bind",
            }
        }
        NodeData::Binary { op, .. } => {
            if op.yields_boolean() {
                "condition"
            } else {
                "arith"
            }
        }
        NodeData::Unary { .. } => "unary",
        NodeData::Assignment { .. } => "assign",
        NodeData::Conditional { .. } => "ternary",
        NodeData::Cast { .. } => "cast",
        NodeData::InstanceOf { .. } => "instanceOf",
        NodeData::New { .. } => "newBinding",
        NodeData::NewArray { .. } | NodeData::ArrayInitializer { .. } => "newArray",
        NodeData::Paren { expression } => return binding_type_name(arena, *expression),
        _ => return None,
    };
    Some(name)
}

/// Descriptor tree of the binding expression `idx`.
pub fn transform_binding_args(
    arena: &NodeArena,
    model: &SemanticModel,
    idx: NodeIndex,
) -> Option<BindingDescriptor> {
    let helper = binding_type_name(arena, idx)?;
    let children = |nodes: &[NodeIndex]| -> Option<Vec<BindingDescriptor>> {
        nodes
            .iter()
            .map(|&n| transform_binding_args(arena, model, n))
            .collect()
    };
    let list = |nodes: &NodeList| nodes.iter().collect::<Vec<_>>();

    let (detail, args) = match arena.data(idx)? {
        NodeData::Paren { expression } => return transform_binding_args(arena, model, *expression),
        NodeData::Literal { value } => (literal_text(value), Vec::new()),
        NodeData::This { .. } => (expression_text(arena, idx), Vec::new()),
        NodeData::Identifier { names, arguments } => match arguments {
            Some(arguments) => (names.join("."), children(&list(arguments))?),
            None => (names.join("."), segment_descriptors(model, idx, names)),
        },
        NodeData::Selector {
            expression,
            selectors,
        } => {
            let mut args = vec![transform_binding_args(arena, model, *expression)?];
            for selector in selectors.iter() {
                args.push(match arena.data(selector)? {
                    NodeData::VariableSelector { name, arguments } => BindingDescriptor {
                        helper: if arguments.is_some() { "method" } else { "property" },
                        node: selector,
                        detail: name.clone(),
                        args: match arguments {
                            Some(arguments) => children(&list(arguments))?,
                            None => Vec::new(),
                        },
                    },
                    NodeData::ArraySelector { index } => BindingDescriptor {
                        helper: "index",
                        node: selector,
                        detail: String::new(),
                        args: children(&[*index])?,
                    },
                    _ => return None,
                });
            }
            (expression_text(arena, idx), args)
        }
        NodeData::Binary { op, left, right } => (op.symbol().to_string(), children(&[*left, *right])?),
        NodeData::Unary { op, operand } => (op.symbol().to_string(), children(&[*operand])?),
        NodeData::Assignment { op, target, value } => {
            (op.symbol().to_string(), children(&[*target, *value])?)
        }
        NodeData::Conditional {
            condition,
            when_true,
            when_false,
        } => (String::new(), children(&[*condition, *when_true, *when_false])?),
        NodeData::Cast { ty, expression } => (ty.to_string(), children(&[*expression])?),
        NodeData::InstanceOf { expression, ty } => (ty.to_string(), children(&[*expression])?),
        NodeData::New { ty, arguments } => (ty.to_string(), children(&list(arguments))?),
        NodeData::NewArray {
            element,
            dimensions,
            initializer,
        } => {
            let mut nodes = list(dimensions);
            if initializer.is_some() {
                nodes.push(*initializer);
            }
            (element.to_string(), children(&nodes)?)
        }
        NodeData::ArrayInitializer { elements } => (String::new(), children(&list(elements))?),
        _ => return None,
    };
    Some(BindingDescriptor {
        helper,
        node: idx,
        detail,
        args,
    })
}

/// One descriptor per segment of a property chain.
fn segment_descriptors(model: &SemanticModel, idx: NodeIndex, names: &[String]) -> Vec<BindingDescriptor> {
    let bindings = model.bindings(idx);
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let helper = match bindings.get(i) {
                Some(MemberBinding::Local { .. }) => "local",
                Some(MemberBinding::Type(_)) => "type",
                Some(MemberBinding::Method { .. }) => "method",
                _ => "property",
            };
            BindingDescriptor {
                helper,
                node: idx,
                detail: name.clone(),
                args: Vec::new(),
            }
        })
        .collect()
}

/// Values the helper of `descriptor` is initialised with.
///
/// Property chains yield their root object followed by the member names;
/// selector chains yield the root value, then each member name, call
/// argument and array index in order. Every other helper yields the current
/// value of each input.
pub fn eval_binding_args(
    interp: &mut Interpreter<'_>,
    ctx: &mut ExecutionContext,
    descriptor: &BindingDescriptor,
) -> RuntimeResult<Vec<Value>> {
    let arena = interp.arena();
    trace!(node = %descriptor.node, helper = descriptor.helper, "eval_binding_args");
    match arena.data(descriptor.node) {
        Some(NodeData::Identifier { names, arguments }) => {
            identifier_inputs(interp, ctx, descriptor.node, names, arguments.as_ref())
        }
        Some(NodeData::Selector {
            expression,
            selectors,
        }) => {
            let mut values = vec![interp.evaluate(ctx, *expression)?];
            for selector in selectors.iter() {
                match arena.data(selector) {
                    Some(NodeData::VariableSelector { name, arguments }) => {
                        values.push(Value::string(name));
                        if let Some(arguments) = arguments {
                            for argument in arguments.iter() {
                                values.push(interp.evaluate(ctx, argument)?);
                            }
                        }
                    }
                    Some(NodeData::ArraySelector { index }) => values.push(interp.evaluate(ctx, *index)?),
                    _ => {}
                }
            }
            Ok(values)
        }
        _ if descriptor.args.is_empty() => Ok(vec![interp.evaluate(ctx, descriptor.node)?]),
        _ => descriptor
            .args
            .iter()
            .map(|arg| interp.evaluate(ctx, arg.node))
            .collect(),
    }
}

fn identifier_inputs(
    interp: &mut Interpreter<'_>,
    ctx: &mut ExecutionContext,
    idx: NodeIndex,
    names: &[String],
    arguments: Option<&NodeList>,
) -> RuntimeResult<Vec<Value>> {
    let bindings = interp.model().bindings(idx);
    let static_root = |owner| Value::Type(TypeRef::Class(owner));
    let (root, consumed) = match bindings.first() {
        Some(MemberBinding::Local { name }) => {
            let value = ctx
                .get_variable(name, false)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() })?;
            (value, 1)
        }
        Some(MemberBinding::Type(_)) => {
            let count = bindings
                .iter()
                .take_while(|b| matches!(b, MemberBinding::Type(_)))
                .count();
            let ty = match &bindings[count - 1] {
                MemberBinding::Type(ty) => ty.clone(),
                _ => TypeRef::Unresolved,
            };
            (Value::Type(ty), count)
        }
        Some(
            MemberBinding::Property {
                receiver: Receiver::Implicit { outer },
                ..
            }
            | MemberBinding::Method {
                receiver: Receiver::Implicit { outer },
                ..
            },
        ) => (ctx.this_at(*outer)?, 0),
        Some(MemberBinding::Property {
            accessor: PropertyAccessor::Field { owner, .. } | PropertyAccessor::Computed { owner, .. },
            receiver: Receiver::Static,
        }) => (static_root(*owner), 0),
        Some(MemberBinding::Method {
            target,
            receiver: Receiver::Static,
        }) => (static_root(target.owner), 0),
        _ => (Value::Null, 0),
    };

    let mut values = vec![root];
    let members = match arguments {
        Some(_) => names.len().saturating_sub(1),
        None => names.len(),
    };
    for name in names.iter().take(members).skip(consumed) {
        values.push(Value::string(name));
    }
    if let Some(arguments) = arguments {
        if let Some(method) = names.last() {
            values.push(Value::string(method));
        }
        for argument in arguments.iter() {
            values.push(interp.evaluate(ctx, argument)?);
        }
    }
    Ok(values)
}

/// Property paths, relative to `this`, the binding expression `idx`
/// listens on: `a.b.c` depends on `a`, `a.b` and `a.b.c`.
pub fn binding_dependencies(arena: &NodeArena, model: &SemanticModel, idx: NodeIndex) -> IndexSet<String> {
    let mut out = IndexSet::new();
    for node in arena.descendants(idx) {
        match arena.data(node) {
            Some(NodeData::Identifier { names, .. }) => {
                for (i, binding) in model.bindings(node).iter().enumerate().take(names.len()) {
                    if matches!(binding, MemberBinding::Property { .. } | MemberBinding::ArrayLength) {
                        out.insert(names[..=i].join("."));
                    }
                }
            }
            Some(NodeData::Selector {
                expression,
                selectors,
            }) => {
                let mut path = match arena.data(*expression) {
                    Some(NodeData::This { qualifier: None }) => None,
                    _ => Some(expression_text(arena, *expression)),
                };
                for selector in selectors.iter() {
                    let step = match arena.data(selector) {
                        Some(NodeData::VariableSelector {
                            name,
                            arguments: None,
                        }) => name.clone(),
                        Some(NodeData::VariableSelector { name, .. }) => format!("{name}()"),
                        _ => "[]".to_string(),
                    };
                    let next = match path {
                        Some(p) if step == "[]" => format!("{p}{step}"),
                        Some(p) => format!("{p}.{step}"),
                        None => step,
                    };
                    if matches!(
                        model.final_binding(selector),
                        Some(MemberBinding::Property { .. } | MemberBinding::ArrayLength)
                    ) {
                        out.insert(next.clone());
                    }
                    path = Some(next);
                }
            }
            _ => {}
        }
    }
    out
}

fn literal_text(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Null => "null".to_string(),
        LiteralValue::Boolean(b) => b.to_string(),
        LiteralValue::Char(c) => format!("'{c}'"),
        LiteralValue::Int(v) => v.to_string(),
        LiteralValue::Long(v) => format!("{v}L"),
        LiteralValue::Float(v) => format!("{v}f"),
        LiteralValue::Double(v) => format!("{v:?}"),
        LiteralValue::String(s) => format!("{s:?}"),
    }
}

fn joined(arena: &NodeArena, nodes: &NodeList) -> String {
    nodes
        .iter()
        .map(|n| expression_text(arena, n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source-like rendering of an expression, used in labels, receiver paths
/// and dependency paths.
pub fn expression_text(arena: &NodeArena, idx: NodeIndex) -> String {
    let Some(data) = arena.data(idx) else {
        return String::new();
    };
    match data {
        NodeData::Literal { value } => literal_text(value),
        NodeData::Identifier { names, arguments } => match arguments {
            Some(arguments) => format!("{}({})", names.join("."), joined(arena, arguments)),
            None => names.join("."),
        },
        NodeData::Selector {
            expression,
            selectors,
        } => {
            let mut text = expression_text(arena, *expression);
            for selector in selectors.iter() {
                match arena.data(selector) {
                    Some(NodeData::VariableSelector { name, arguments }) => {
                        text.push('.');
                        text.push_str(name);
                        if let Some(arguments) = arguments {
                            text.push_str(&format!("({})", joined(arena, arguments)));
                        }
                    }
                    Some(NodeData::ArraySelector { index }) => {
                        text.push_str(&format!("[{}]", expression_text(arena, *index)));
                    }
                    _ => {}
                }
            }
            text
        }
        NodeData::This { qualifier } => match qualifier {
            Some(q) => format!("{q}.this"),
            None => "this".to_string(),
        },
        NodeData::Paren { expression } => format!("({})", expression_text(arena, *expression)),
        NodeData::Binary { op, left, right } => format!(
            "{} {} {}",
            expression_text(arena, *left),
            op.symbol(),
            expression_text(arena, *right)
        ),
        NodeData::Unary { op, operand } => {
            let operand = expression_text(arena, *operand);
            if op.is_postfix() {
                format!("{operand}{}", op.symbol())
            } else {
                format!("{}{operand}", op.symbol())
            }
        }
        NodeData::Assignment { op, target, value } => format!(
            "{} {} {}",
            expression_text(arena, *target),
            op.symbol(),
            expression_text(arena, *value)
        ),
        NodeData::Conditional {
            condition,
            when_true,
            when_false,
        } => format!(
            "{} ? {} : {}",
            expression_text(arena, *condition),
            expression_text(arena, *when_true),
            expression_text(arena, *when_false)
        ),
        NodeData::Cast { ty, expression } => format!("({ty}) {}", expression_text(arena, *expression)),
        NodeData::InstanceOf { expression, ty } => {
            format!("{} instanceof {ty}", expression_text(arena, *expression))
        }
        NodeData::New { ty, arguments } => format!("new {ty}({})", joined(arena, arguments)),
        other => other.kind_name().to_string(),
    }
}
