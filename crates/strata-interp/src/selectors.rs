//! Identifier chains, selectors and assignable places.
//!
//! Every segment carries the binding the checker recorded for it; reading
//! a segment applies that binding to the value of the previous segment.

use strata_ast::{NodeData, NodeIndex, NodeList};
use strata_checker::{MemberBinding, MethodTarget, PropertyAccessor, Receiver};
use strata_solver::{TypeId, TypeRef, find_method};
use tracing::trace;

use crate::context::ExecutionContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::natives;
use crate::value::{ArrayRef, ObjectRef, Value};
use crate::Interpreter;

/// A storage location that an assignment or update writes to.
#[derive(Debug)]
pub(crate) enum LValue {
    Local(String),
    Field { object: ObjectRef, name: String },
    Static { owner: TypeId, name: String },
    Computed {
        receiver: Option<Value>,
        owner: TypeId,
        getter: String,
        setter: Option<String>,
    },
    Element { array: ArrayRef, index: i64 },
}

fn checked_index(array: &ArrayRef, index: i64) -> RuntimeResult<usize> {
    let length = array.borrow().items.len();
    match usize::try_from(index) {
        Ok(i) if i < length => Ok(i),
        _ => Err(RuntimeError::IndexOutOfBounds { index, length }),
    }
}

impl<'a> Interpreter<'a> {
    pub(crate) fn eval_identifier(
        &mut self,
        ctx: &mut ExecutionContext,
        idx: NodeIndex,
        names: &[String],
        arguments: Option<&NodeList>,
    ) -> RuntimeResult<Value> {
        let model = self.model;
        let bindings = model.bindings(idx);
        let members = if arguments.is_some() {
            names.len().saturating_sub(1)
        } else {
            names.len()
        };
        if bindings.len() < members {
            return Err(RuntimeError::Unresolved {
                node: idx,
                kind: "Identifier",
            });
        }
        let mut current = Value::Null;
        for (binding, name) in bindings.iter().zip(names).take(members) {
            current = self.read_member(ctx, &current, binding, name)?;
        }
        match arguments {
            None => Ok(current),
            Some(args) => {
                let binding = bindings.get(members).ok_or(RuntimeError::Unresolved {
                    node: idx,
                    kind: "Identifier",
                })?;
                self.call_binding(ctx, current, binding, args)
            }
        }
    }

    pub(crate) fn eval_selector_chain(
        &mut self,
        ctx: &mut ExecutionContext,
        expression: NodeIndex,
        selectors: &NodeList,
    ) -> RuntimeResult<Value> {
        let mut current = self.evaluate(ctx, expression)?;
        for selector in selectors.iter() {
            current = self.eval_selector(ctx, current, selector)?;
        }
        Ok(current)
    }

    fn eval_selector(&mut self, ctx: &mut ExecutionContext, current: Value, selector: NodeIndex) -> RuntimeResult<Value> {
        let arena = self.arena;
        match arena.data(selector) {
            Some(NodeData::VariableSelector { name, arguments }) => {
                let binding = self.final_binding(selector)?;
                match arguments {
                    Some(args) => self.call_binding(ctx, current, binding, args),
                    None => self.read_member(ctx, &current, binding, name),
                }
            }
            Some(NodeData::ArraySelector { index }) => {
                let index = self.evaluate(ctx, *index)?.as_i64().unwrap_or(0);
                match current {
                    Value::Array(array) => {
                        let slot = checked_index(&array, index)?;
                        Ok(array.borrow().items[slot].clone())
                    }
                    Value::Null => Err(RuntimeError::NullReference {
                        member: "[]".to_string(),
                    }),
                    other => Err(RuntimeError::Unsupported {
                        what: format!("indexing {other}"),
                    }),
                }
            }
            _ => Err(RuntimeError::Unresolved {
                node: selector,
                kind: arena.kind_name(selector),
            }),
        }
    }

    /// Receiver a member binding applies to; `None` for static members.
    fn receiver_value(&self, ctx: &ExecutionContext, current: &Value, receiver: Receiver) -> RuntimeResult<Option<Value>> {
        Ok(match receiver {
            Receiver::Implicit { outer } => Some(ctx.this_at(outer)?),
            Receiver::Static => None,
            Receiver::Value => Some(current.clone()),
        })
    }

    fn read_member(
        &mut self,
        ctx: &mut ExecutionContext,
        current: &Value,
        binding: &MemberBinding,
        name: &str,
    ) -> RuntimeResult<Value> {
        match binding {
            MemberBinding::Local { name } => ctx
                .get_variable(name, false)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() }),
            MemberBinding::Type(ty) => Ok(Value::Type(ty.clone())),
            MemberBinding::ArrayLength => match current {
                Value::Array(array) => Ok(Value::Int(array.borrow().items.len() as i32)),
                Value::Null => Err(RuntimeError::NullReference {
                    member: "length".to_string(),
                }),
                other => Err(RuntimeError::Unsupported {
                    what: format!("length of {other}"),
                }),
            },
            MemberBinding::Property { accessor, receiver } => {
                let target = self.receiver_value(ctx, current, *receiver)?;
                self.read_property(ctx, target, accessor)
            }
            MemberBinding::Method { .. } => Err(RuntimeError::Unsupported {
                what: format!("method '{name}' used as a value"),
            }),
        }
    }

    fn read_property(
        &mut self,
        ctx: &mut ExecutionContext,
        target: Option<Value>,
        accessor: &PropertyAccessor,
    ) -> RuntimeResult<Value> {
        match accessor {
            PropertyAccessor::Field {
                owner,
                name,
                is_static: true,
            } => self.static_get(ctx, *owner, name),
            PropertyAccessor::Field { name, .. } => match target {
                Some(Value::Object(obj)) => Ok(obj.borrow().fields.get(name).cloned().unwrap_or(Value::Null)),
                Some(Value::Null) | None => Err(RuntimeError::NullReference { member: name.clone() }),
                Some(other) => Err(RuntimeError::Unsupported {
                    what: format!("field '{name}' of {other}"),
                }),
            },
            PropertyAccessor::Computed {
                owner,
                getter,
                is_static,
                ..
            } => {
                let receiver = if *is_static { None } else { target };
                self.call_accessor(ctx, receiver, *owner, getter, Vec::new())
            }
            PropertyAccessor::Native { key } => natives::field(self, ctx, key),
        }
    }

    /// Call a getter or setter of a computed property by name.
    fn call_accessor(
        &mut self,
        ctx: &mut ExecutionContext,
        receiver: Option<Value>,
        owner: TypeId,
        name: &str,
        args: Vec<Value>,
    ) -> RuntimeResult<Value> {
        let db = self.db;
        if matches!(receiver, Some(Value::Null)) {
            return Err(RuntimeError::NullReference { member: name.to_string() });
        }
        let arg_types: Vec<TypeRef> = args.iter().map(|a| a.runtime_type(db)).collect();
        let Some(found) = find_method(db, &TypeRef::Class(owner), name, &arg_types).found() else {
            return Err(RuntimeError::Unsupported {
                what: format!("accessor '{name}' of '{}'", db.type_name(owner)),
            });
        };
        trace!(accessor = name, "computed property");
        self.invoke_method(ctx, receiver, &MethodTarget::from(found), args)
    }

    pub(crate) fn call_binding(
        &mut self,
        ctx: &mut ExecutionContext,
        current: Value,
        binding: &MemberBinding,
        args: &NodeList,
    ) -> RuntimeResult<Value> {
        let MemberBinding::Method { target, receiver } = binding else {
            return Err(RuntimeError::Unsupported {
                what: "call of a non-method member".to_string(),
            });
        };
        let receiver = self.receiver_value(ctx, &current, *receiver)?;
        let args = self.eval_args(ctx, args, &target.params)?;
        self.invoke_method(ctx, receiver, target, args)
    }

    pub(crate) fn resolve_lvalue(&mut self, ctx: &mut ExecutionContext, idx: NodeIndex) -> RuntimeResult<LValue> {
        let arena = self.arena;
        match arena.data(idx) {
            Some(NodeData::Paren { expression }) => self.resolve_lvalue(ctx, *expression),
            Some(NodeData::Identifier { names, arguments: None }) => {
                let model = self.model;
                let bindings = model.bindings(idx);
                let Some((last, prefix)) = bindings.split_last() else {
                    return Err(RuntimeError::Unresolved {
                        node: idx,
                        kind: "Identifier",
                    });
                };
                let mut current = Value::Null;
                for (binding, name) in prefix.iter().zip(names) {
                    current = self.read_member(ctx, &current, binding, name)?;
                }
                self.lvalue_for(ctx, current, last)
            }
            Some(NodeData::Selector {
                expression,
                selectors,
            }) => {
                let Some((&last, prefix)) = selectors.nodes.split_last() else {
                    return self.resolve_lvalue(ctx, *expression);
                };
                let mut current = self.evaluate(ctx, *expression)?;
                for &selector in prefix {
                    current = self.eval_selector(ctx, current, selector)?;
                }
                match arena.data(last) {
                    Some(NodeData::ArraySelector { index }) => {
                        let index = self.evaluate(ctx, *index)?.as_i64().unwrap_or(0);
                        match current {
                            Value::Array(array) => Ok(LValue::Element { array, index }),
                            _ => Err(RuntimeError::NullReference {
                                member: "[]".to_string(),
                            }),
                        }
                    }
                    Some(NodeData::VariableSelector { arguments: None, .. }) => {
                        let binding = self.final_binding(last)?;
                        self.lvalue_for(ctx, current, binding)
                    }
                    _ => Err(RuntimeError::Unsupported {
                        what: "assignment to a call result".to_string(),
                    }),
                }
            }
            _ => Err(RuntimeError::Unsupported {
                what: format!("assignment to {}", arena.kind_name(idx)),
            }),
        }
    }

    fn lvalue_for(&mut self, ctx: &mut ExecutionContext, current: Value, binding: &MemberBinding) -> RuntimeResult<LValue> {
        match binding {
            MemberBinding::Local { name } => Ok(LValue::Local(name.clone())),
            MemberBinding::Property { accessor, receiver } => {
                let target = self.receiver_value(ctx, &current, *receiver)?;
                match accessor {
                    PropertyAccessor::Field {
                        owner,
                        name,
                        is_static: true,
                    } => Ok(LValue::Static {
                        owner: *owner,
                        name: name.clone(),
                    }),
                    PropertyAccessor::Field { name, .. } => match target {
                        Some(Value::Object(object)) => Ok(LValue::Field {
                            object,
                            name: name.clone(),
                        }),
                        _ => Err(RuntimeError::NullReference { member: name.clone() }),
                    },
                    PropertyAccessor::Computed {
                        owner,
                        getter,
                        setter,
                        is_static,
                    } => Ok(LValue::Computed {
                        receiver: if *is_static { None } else { target },
                        owner: *owner,
                        getter: getter.clone(),
                        setter: setter.clone(),
                    }),
                    PropertyAccessor::Native { key } => Err(RuntimeError::Unsupported {
                        what: format!("assignment to '{key}'"),
                    }),
                }
            }
            _ => Err(RuntimeError::Unsupported {
                what: "assignment to a non-variable".to_string(),
            }),
        }
    }

    pub(crate) fn lvalue_get(&mut self, ctx: &mut ExecutionContext, place: &LValue) -> RuntimeResult<Value> {
        match place {
            LValue::Local(name) => ctx
                .get_variable(name, false)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() }),
            LValue::Field { object, name } => Ok(object.borrow().fields.get(name).cloned().unwrap_or(Value::Null)),
            LValue::Static { owner, name } => self.static_get(ctx, *owner, name),
            LValue::Computed {
                receiver,
                owner,
                getter,
                ..
            } => self.call_accessor(ctx, receiver.clone(), *owner, getter, Vec::new()),
            LValue::Element { array, index } => {
                let slot = checked_index(array, *index)?;
                Ok(array.borrow().items[slot].clone())
            }
        }
    }

    pub(crate) fn lvalue_set(&mut self, ctx: &mut ExecutionContext, place: &LValue, value: Value) -> RuntimeResult<()> {
        match place {
            LValue::Local(name) => ctx.set_variable(name, value),
            LValue::Field { object, name } => {
                object.borrow_mut().fields.insert(name.clone(), value);
                Ok(())
            }
            LValue::Static { owner, name } => self.static_set(ctx, *owner, name, value),
            LValue::Computed {
                receiver,
                owner,
                getter,
                setter,
            } => {
                let Some(setter) = setter else {
                    return Err(RuntimeError::Unsupported {
                        what: format!("assignment to read-only property '{getter}'"),
                    });
                };
                self.call_accessor(ctx, receiver.clone(), *owner, setter, vec![value])?;
                Ok(())
            }
            LValue::Element { array, index } => {
                let slot = checked_index(array, *index)?;
                let mut data = array.borrow_mut();
                let value = value.coerce(self.db, &data.element);
                data.items[slot] = value;
                Ok(())
            }
        }
    }
}
