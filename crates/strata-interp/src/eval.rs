//! Expression evaluation.

use std::rc::Rc;

use strata_ast::{AssignOp, BinaryOp, LiteralValue, NodeData, NodeIndex, NodeList, UnaryOp};
use strata_checker::{MemberBinding, Receiver};
use strata_solver::{PrimitiveKind, TypeRef, chain_root, erase, is_assignable_from, is_subtype_of};
use tracing::trace;

use crate::context::ExecutionContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::value::{Closure, Value};
use crate::Interpreter;

/// Unary numeric promotion.
fn promote_unary(kind: PrimitiveKind) -> PrimitiveKind {
    match kind {
        PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char => PrimitiveKind::Int,
        other => other,
    }
}

fn divide_by_zero() -> RuntimeError {
    RuntimeError::Arithmetic {
        message: "/ by zero".to_string(),
    }
}

fn not_applicable(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    if left.is_null() || right.is_null() {
        return RuntimeError::NullReference {
            member: op.symbol().to_string(),
        };
    }
    RuntimeError::Unsupported {
        what: format!("'{}' on {left} and {right}", op.symbol()),
    }
}

fn int_op(op: BinaryOp, a: i32, b: i32) -> RuntimeResult<i32> {
    Ok(match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div if b == 0 => return Err(divide_by_zero()),
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Rem if b == 0 => return Err(divide_by_zero()),
        BinaryOp::Rem => a.wrapping_rem(b),
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        other => {
            return Err(RuntimeError::Unsupported {
                what: format!("'{}' on int", other.symbol()),
            });
        }
    })
}

fn long_op(op: BinaryOp, a: i64, b: i64) -> RuntimeResult<i64> {
    Ok(match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div if b == 0 => return Err(divide_by_zero()),
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Rem if b == 0 => return Err(divide_by_zero()),
        BinaryOp::Rem => a.wrapping_rem(b),
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        other => {
            return Err(RuntimeError::Unsupported {
                what: format!("'{}' on long", other.symbol()),
            });
        }
    })
}

fn real_op(op: BinaryOp, a: f64, b: f64) -> RuntimeResult<f64> {
    Ok(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        other => {
            return Err(RuntimeError::Unsupported {
                what: format!("'{}' on floating-point operands", other.symbol()),
            });
        }
    })
}

/// Non-short-circuit binary operators on primitive values, with binary
/// numeric promotion taken from the operands' runtime kinds.
pub(crate) fn numeric_binary(op: BinaryOp, left: &Value, right: &Value) -> RuntimeResult<Value> {
    if let (Some(a), Some(b)) = (left.as_bool(), right.as_bool()) {
        return match op {
            BinaryOp::BitAnd | BinaryOp::And => Ok(Value::Boolean(a & b)),
            BinaryOp::BitOr | BinaryOp::Or => Ok(Value::Boolean(a | b)),
            BinaryOp::BitXor | BinaryOp::Ne => Ok(Value::Boolean(a ^ b)),
            BinaryOp::Eq => Ok(Value::Boolean(a == b)),
            _ => Err(not_applicable(op, left, right)),
        };
    }
    let (Some(lk), Some(rk)) = (left.kind(), right.kind()) else {
        return Err(not_applicable(op, left, right));
    };
    if !lk.is_numeric() || !rk.is_numeric() {
        return Err(not_applicable(op, left, right));
    }

    if op.is_shift() {
        let (Some(value), Some(distance)) = (left.as_i64(), right.as_i64()) else {
            return Err(not_applicable(op, left, right));
        };
        return Ok(if promote_unary(lk) == PrimitiveKind::Long {
            let s = (distance & 63) as u32;
            Value::Long(match op {
                BinaryOp::Shl => value.wrapping_shl(s),
                BinaryOp::Shr => value >> s,
                _ => ((value as u64) >> s) as i64,
            })
        } else {
            let v = value as i32;
            let s = (distance & 31) as u32;
            Value::Int(match op {
                BinaryOp::Shl => v.wrapping_shl(s),
                BinaryOp::Shr => v >> s,
                _ => ((v as u32) >> s) as i32,
            })
        });
    }

    let kind = PrimitiveKind::promote(lk, rk);
    let integral = matches!(kind, PrimitiveKind::Int | PrimitiveKind::Long);
    if op.is_relational() || op.is_equality() {
        let ordering = if integral {
            left.as_i64().zip(right.as_i64()).map(|(a, b)| a.partial_cmp(&b))
        } else {
            left.as_f64().zip(right.as_f64()).map(|(a, b)| a.partial_cmp(&b))
        };
        let Some(ordering) = ordering else {
            return Err(not_applicable(op, left, right));
        };
        use std::cmp::Ordering::*;
        let result = match op {
            BinaryOp::Lt => ordering == Some(Less),
            BinaryOp::Le => matches!(ordering, Some(Less | Equal)),
            BinaryOp::Gt => ordering == Some(Greater),
            BinaryOp::Ge => matches!(ordering, Some(Greater | Equal)),
            BinaryOp::Eq => ordering == Some(Equal),
            _ => ordering != Some(Equal),
        };
        return Ok(Value::Boolean(result));
    }

    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(not_applicable(op, left, right));
    };
    match kind {
        PrimitiveKind::Int => {
            let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) else {
                return Err(not_applicable(op, left, right));
            };
            int_op(op, a as i32, b as i32).map(Value::Int)
        }
        PrimitiveKind::Long => {
            let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) else {
                return Err(not_applicable(op, left, right));
            };
            long_op(op, a, b).map(Value::Long)
        }
        PrimitiveKind::Float => real_op(op, a, b).map(|v| Value::Float(v as f32)),
        _ => real_op(op, a, b).map(Value::Double),
    }
}

impl<'a> Interpreter<'a> {
    /// Evaluate an expression.
    pub fn evaluate(&mut self, ctx: &mut ExecutionContext, idx: NodeIndex) -> RuntimeResult<Value> {
        let arena = self.arena;
        let model = self.model;
        let Some(data) = arena.data(idx) else {
            return Err(RuntimeError::Unresolved {
                node: idx,
                kind: "missing",
            });
        };
        match data {
            NodeData::Literal { value } => Ok(match value {
                LiteralValue::Null => Value::Null,
                LiteralValue::Boolean(b) => Value::Boolean(*b),
                LiteralValue::Char(c) => {
                    let mut units = [0u16; 2];
                    Value::Char(c.encode_utf16(&mut units)[0])
                }
                LiteralValue::Int(v) => Value::Int(*v),
                LiteralValue::Long(v) => Value::Long(*v),
                LiteralValue::Float(v) => Value::Float(*v),
                LiteralValue::Double(v) => Value::Double(*v),
                LiteralValue::String(s) => Value::string(s),
            }),
            NodeData::Identifier { names, arguments } => {
                self.eval_identifier(ctx, idx, names, arguments.as_ref())
            }
            NodeData::Selector {
                expression,
                selectors,
            } => self.eval_selector_chain(ctx, *expression, selectors),
            NodeData::This { .. } => ctx.this_at(model.this_hops(idx)),
            NodeData::Binary { op, left, right } => self.eval_binary(ctx, *op, *left, *right),
            NodeData::Unary { op, operand } => self.eval_unary(ctx, *op, *operand),
            NodeData::Assignment { op, target, value } => {
                self.eval_assignment(ctx, *op, *target, *value)
            }
            NodeData::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                let branch = if self.condition(ctx, *condition)? {
                    *when_true
                } else {
                    *when_false
                };
                self.evaluate_as(ctx, branch, model.type_of(idx))
            }
            NodeData::Cast { expression, .. } => {
                let value = self.evaluate(ctx, *expression)?;
                self.cast(value, self.model.written_type(idx))
            }
            NodeData::InstanceOf { expression, .. } => {
                let value = self.evaluate(ctx, *expression)?;
                let target = self.model.written_type(idx).cloned().unwrap_or(TypeRef::Unresolved);
                Ok(Value::Boolean(self.is_instance(&value, &target)))
            }
            NodeData::New { arguments, .. } => self.eval_new(ctx, idx, arguments),
            NodeData::NewArray {
                dimensions,
                initializer,
                ..
            } => {
                if initializer.is_some() {
                    return self.evaluate(ctx, *initializer);
                }
                let ty = self.model.written_type(idx).cloned().unwrap_or(TypeRef::Unresolved);
                let mut sizes = Vec::with_capacity(dimensions.len());
                for dim in dimensions.iter() {
                    let size = self.evaluate(ctx, dim)?.as_i64().unwrap_or(0);
                    let size = usize::try_from(size).map_err(|_| RuntimeError::IllegalArgument {
                        message: format!("negative array size {size}"),
                    })?;
                    sizes.push(size);
                }
                Ok(new_array(&ty, &sizes))
            }
            NodeData::ArrayInitializer { elements } => {
                let ty = self.model.type_of(idx).cloned().unwrap_or(TypeRef::Unresolved);
                let element = ty.element().cloned().unwrap_or_else(|| self.db.object_type());
                let mut items = Vec::with_capacity(elements.len());
                for e in elements.iter() {
                    items.push(self.evaluate(ctx, e)?.coerce(self.db, &element));
                }
                Ok(Value::new_array(element, items))
            }
            NodeData::Lambda { .. } => {
                let interface = self.model.type_of(idx).cloned().unwrap_or(TypeRef::Unresolved);
                Ok(Value::Lambda(Rc::new(Closure {
                    node: idx,
                    interface,
                    captured: ctx.visible_variables(),
                    this: ctx.current_object().cloned().unwrap_or(Value::Null),
                })))
            }
            NodeData::Paren { expression } => self.evaluate(ctx, *expression),
            NodeData::Sequence { temps, expressions } => {
                let size = self.frame_size_of(idx);
                self.in_frame(ctx, size, false, |this, ctx| {
                    for temp in temps {
                        ctx.define_variable(temp, Value::Null)?;
                    }
                    let mut last = Value::Void;
                    for expr in expressions.iter() {
                        last = this.evaluate(ctx, expr)?;
                    }
                    Ok(last)
                })
            }
            other => Err(RuntimeError::Unsupported {
                what: format!("{} as an expression", other.kind_name()),
            }),
        }
    }

    /// Evaluate and convert to `expected` when it is known.
    pub(crate) fn evaluate_as(
        &mut self,
        ctx: &mut ExecutionContext,
        idx: NodeIndex,
        expected: Option<&TypeRef>,
    ) -> RuntimeResult<Value> {
        let value = self.evaluate(ctx, idx)?;
        Ok(match expected {
            Some(ty) => value.coerce(self.db, ty),
            None => value,
        })
    }

    /// Evaluate against the type the checker expected at this position.
    pub(crate) fn evaluate_inferred(&mut self, ctx: &mut ExecutionContext, idx: NodeIndex) -> RuntimeResult<Value> {
        let model = self.model;
        self.evaluate_as(ctx, idx, model.inferred_type(idx))
    }

    pub(crate) fn condition(&mut self, ctx: &mut ExecutionContext, idx: NodeIndex) -> RuntimeResult<bool> {
        match self.evaluate(ctx, idx)? {
            Value::Boolean(b) => Ok(b),
            Value::Null => Err(RuntimeError::NullReference {
                member: "condition".to_string(),
            }),
            other => Err(RuntimeError::InvalidCast {
                from: other.runtime_type(self.db).display(self.db),
                to: "boolean".to_string(),
            }),
        }
    }

    /// Evaluate call arguments, converting each to its parameter type.
    pub(crate) fn eval_args(
        &mut self,
        ctx: &mut ExecutionContext,
        args: &NodeList,
        params: &[TypeRef],
    ) -> RuntimeResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            values.push(self.evaluate_as(ctx, arg, params.get(i))?);
        }
        Ok(values)
    }

    /// `value instanceof ty`; `null` is an instance of nothing.
    pub(crate) fn is_instance(&self, value: &Value, ty: &TypeRef) -> bool {
        let db = self.db;
        if value.is_null() {
            return false;
        }
        match ty {
            TypeRef::Primitive(kind) => value.kind() == Some(*kind),
            TypeRef::TypeParam(_) | TypeRef::Unresolved => true,
            TypeRef::Null => false,
            TypeRef::Array(_) => {
                matches!(value, Value::Array(_)) && is_assignable_from(db, &erase(db, ty), &value.runtime_type(db))
            }
            TypeRef::Class(id) | TypeRef::Parameterized(id, _) => match value.runtime_type(db).class_id() {
                Some(runtime) => is_subtype_of(db, runtime, *id),
                // Arrays are only `Object`s.
                None => db
                    .well_known()
                    .object
                    .is_some_and(|object| chain_root(db, object) == chain_root(db, *id)),
            },
        }
    }

    fn cast(&self, value: Value, target: Option<&TypeRef>) -> RuntimeResult<Value> {
        let db = self.db;
        let Some(target) = target else {
            return Ok(value);
        };
        if let Some(kind) = target.primitive() {
            if value.is_null() {
                return Err(RuntimeError::NullReference {
                    member: format!("({})", kind.name()),
                });
            }
            return value.convert(kind).ok_or_else(|| RuntimeError::InvalidCast {
                from: value.runtime_type(db).display(db),
                to: kind.name().to_string(),
            });
        }
        if value.is_null() || self.is_instance(&value, target) {
            return Ok(value);
        }
        Err(RuntimeError::InvalidCast {
            from: value.runtime_type(db).display(db),
            to: target.display(db),
        })
    }

    fn is_string_typed(&self, idx: NodeIndex) -> bool {
        let string = self.db.string_type();
        self.model.type_of(idx) == Some(&string)
    }

    fn eval_binary(
        &mut self,
        ctx: &mut ExecutionContext,
        op: BinaryOp,
        left: NodeIndex,
        right: NodeIndex,
    ) -> RuntimeResult<Value> {
        match op {
            BinaryOp::And => {
                let result = self.condition(ctx, left)? && self.condition(ctx, right)?;
                return Ok(Value::Boolean(result));
            }
            BinaryOp::Or => {
                let result = self.condition(ctx, left)? || self.condition(ctx, right)?;
                return Ok(Value::Boolean(result));
            }
            _ => {}
        }
        let l = self.evaluate(ctx, left)?;
        let r = self.evaluate(ctx, right)?;
        let concat = op == BinaryOp::Add
            && (matches!(l, Value::Str(_))
                || matches!(r, Value::Str(_))
                || self.is_string_typed(left)
                || self.is_string_typed(right));
        if concat {
            let mut text = self.to_display_string(ctx, &l)?;
            text.push_str(&self.to_display_string(ctx, &r)?);
            return Ok(Value::string(&text));
        }
        match op {
            BinaryOp::Eq => Ok(Value::Boolean(l.same(&r))),
            BinaryOp::Ne => Ok(Value::Boolean(!l.same(&r))),
            _ => numeric_binary(op, &l, &r),
        }
    }

    fn eval_unary(&mut self, ctx: &mut ExecutionContext, op: UnaryOp, operand: NodeIndex) -> RuntimeResult<Value> {
        if let Some(delta) = op.update_delta() {
            let place = self.resolve_lvalue(ctx, operand)?;
            let old = self.lvalue_get(ctx, &place)?;
            let Some(kind) = old.kind() else {
                return Err(RuntimeError::NullReference {
                    member: op.symbol().to_string(),
                });
            };
            let updated = numeric_binary(BinaryOp::Add, &old, &Value::Int(delta))?;
            let updated = updated.convert(kind).unwrap_or(updated);
            self.lvalue_set(ctx, &place, updated.clone())?;
            trace!(op = op.symbol(), "update");
            return Ok(if op.is_postfix() { old } else { updated });
        }
        let value = self.evaluate(ctx, operand)?;
        let unsupported = |value: &Value| {
            if value.is_null() {
                RuntimeError::NullReference {
                    member: op.symbol().to_string(),
                }
            } else {
                RuntimeError::Unsupported {
                    what: format!("'{}' on {value}", op.symbol()),
                }
            }
        };
        match op {
            UnaryOp::Not => value.as_bool().map(|b| Value::Boolean(!b)).ok_or_else(|| unsupported(&value)),
            UnaryOp::Plus => value
                .kind()
                .and_then(|k| value.convert(promote_unary(k)))
                .ok_or_else(|| unsupported(&value)),
            UnaryOp::Minus => match value.kind().map(promote_unary) {
                Some(PrimitiveKind::Int) => Ok(Value::Int((value.as_i64().unwrap_or(0) as i32).wrapping_neg())),
                Some(PrimitiveKind::Long) => Ok(Value::Long(value.as_i64().unwrap_or(0).wrapping_neg())),
                Some(PrimitiveKind::Float) => Ok(Value::Float(-(value.as_f64().unwrap_or(0.0) as f32))),
                Some(PrimitiveKind::Double) => Ok(Value::Double(-value.as_f64().unwrap_or(0.0))),
                _ => Err(unsupported(&value)),
            },
            UnaryOp::BitNot => match value.kind().map(promote_unary) {
                Some(PrimitiveKind::Int) => Ok(Value::Int(!(value.as_i64().unwrap_or(0) as i32))),
                Some(PrimitiveKind::Long) => Ok(Value::Long(!value.as_i64().unwrap_or(0))),
                _ => Err(unsupported(&value)),
            },
            _ => Err(unsupported(&value)),
        }
    }

    fn eval_assignment(
        &mut self,
        ctx: &mut ExecutionContext,
        op: AssignOp,
        target: NodeIndex,
        value: NodeIndex,
    ) -> RuntimeResult<Value> {
        let target_ty = self.model.type_of(target).cloned().unwrap_or(TypeRef::Unresolved);
        let place = self.resolve_lvalue(ctx, target)?;
        let result = match op.binary_op() {
            None => self.evaluate(ctx, value)?,
            Some(binary) => {
                let old = self.lvalue_get(ctx, &place)?;
                let rhs = self.evaluate(ctx, value)?;
                let string = self.db.string_type();
                if binary == BinaryOp::Add && (matches!(old, Value::Str(_)) || target_ty == string) {
                    let mut text = self.to_display_string(ctx, &old)?;
                    text.push_str(&self.to_display_string(ctx, &rhs)?);
                    Value::string(&text)
                } else {
                    numeric_binary(binary, &old, &rhs)?
                }
            }
        };
        let result = result.coerce(self.db, &target_ty);
        self.lvalue_set(ctx, &place, result.clone())?;
        Ok(result)
    }

    fn eval_new(&mut self, ctx: &mut ExecutionContext, idx: NodeIndex, arguments: &NodeList) -> RuntimeResult<Value> {
        let model = self.model;
        let Some(MemberBinding::Method { target, receiver }) = model.final_binding(idx) else {
            return Err(RuntimeError::Unresolved {
                node: idx,
                kind: "New",
            });
        };
        let ty = model.type_of(idx).cloned().unwrap_or(TypeRef::Unresolved);
        let args = self.eval_args(ctx, arguments, &target.params)?;
        let outer = match receiver {
            Receiver::Implicit { outer } => Some(ctx.this_at(*outer)?),
            _ => None,
        };
        self.instantiate(ctx, &ty, Some(target), args, outer)
    }
}

/// Array of type `ty` with one level per entry of `sizes`; the innermost
/// level holds default values.
fn new_array(ty: &TypeRef, sizes: &[usize]) -> Value {
    let element = ty.element().cloned().unwrap_or(TypeRef::Unresolved);
    let Some((&size, rest)) = sizes.split_first() else {
        return Value::Null;
    };
    let items = if rest.is_empty() {
        vec![Value::default_for(&element); size]
    } else {
        (0..size).map(|_| new_array(&element, rest)).collect()
    };
    Value::new_array(element, items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_wraps_and_rejects_division_by_zero() {
        let max = Value::Int(i32::MAX);
        assert!(matches!(
            numeric_binary(BinaryOp::Add, &max, &Value::Int(1)),
            Ok(Value::Int(i32::MIN))
        ));
        assert!(matches!(
            numeric_binary(BinaryOp::Div, &Value::Int(7), &Value::Int(0)),
            Err(RuntimeError::Arithmetic { .. })
        ));
        assert!(matches!(
            numeric_binary(BinaryOp::Div, &Value::Int(-7), &Value::Int(2)),
            Ok(Value::Int(-3))
        ));
        assert!(matches!(
            numeric_binary(BinaryOp::Rem, &Value::Long(-7), &Value::Long(2)),
            Ok(Value::Long(-1))
        ));
    }

    #[test]
    fn operands_promote_to_the_wider_kind() {
        assert!(matches!(
            numeric_binary(BinaryOp::Mul, &Value::Int(3), &Value::Double(0.5)),
            Ok(Value::Double(v)) if v == 1.5
        ));
        assert!(matches!(
            numeric_binary(BinaryOp::Add, &Value::Char(97), &Value::Int(1)),
            Ok(Value::Int(98))
        ));
        assert!(matches!(
            numeric_binary(BinaryOp::Lt, &Value::Long(2), &Value::Int(3)),
            Ok(Value::Boolean(true))
        ));
        assert!(matches!(
            numeric_binary(BinaryOp::Div, &Value::Double(1.0), &Value::Int(0)),
            Ok(Value::Double(v)) if v.is_infinite()
        ));
    }

    #[test]
    fn shifts_mask_their_distance() {
        assert!(matches!(
            numeric_binary(BinaryOp::Shl, &Value::Int(1), &Value::Int(33)),
            Ok(Value::Int(2))
        ));
        assert!(matches!(
            numeric_binary(BinaryOp::UShr, &Value::Int(-1), &Value::Int(28)),
            Ok(Value::Int(15))
        ));
        assert!(matches!(
            numeric_binary(BinaryOp::Shr, &Value::Long(-8), &Value::Int(1)),
            Ok(Value::Long(-4))
        ));
    }

    #[test]
    fn boolean_operators_and_null_operands() {
        assert!(matches!(
            numeric_binary(BinaryOp::BitXor, &Value::Boolean(true), &Value::Boolean(true)),
            Ok(Value::Boolean(false))
        ));
        assert!(matches!(
            numeric_binary(BinaryOp::Add, &Value::Null, &Value::Int(1)),
            Err(RuntimeError::NullReference { .. })
        ));
    }

    #[test]
    fn multi_dimensional_arrays_nest_default_values() {
        let ty = TypeRef::array_of(TypeRef::array_of(TypeRef::INT));
        let Value::Array(outer) = new_array(&ty, &[2, 3]) else {
            panic!("array expected");
        };
        let outer = outer.borrow();
        assert_eq!(outer.items.len(), 2);
        let Value::Array(inner) = &outer.items[1] else {
            panic!("nested array expected");
        };
        assert_eq!(inner.borrow().items.len(), 3);
        assert!(matches!(inner.borrow().items[0], Value::Int(0)));
    }
}
