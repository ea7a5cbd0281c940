//! Native implementations of the builtin types.
//!
//! Keys match the `native` names the builtin declarations carry. Arguments
//! arrive already converted to the selected overload's parameter types.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;

use crate::context::ExecutionContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::value::{NativeState, Object, ObjectRef, Value};
use crate::Interpreter;

fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&Value::Null)
}

fn int_arg(args: &[Value], i: usize) -> i64 {
    arg(args, i).as_i64().unwrap_or(0)
}

fn receiver(this: Option<Value>, key: &str) -> RuntimeResult<Value> {
    match this {
        Some(Value::Null) | None => Err(RuntimeError::NullReference { member: key.to_string() }),
        Some(value) => Ok(value),
    }
}

fn string_receiver(this: Option<Value>, key: &str) -> RuntimeResult<Rc<str>> {
    match receiver(this, key)? {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::Unsupported {
            what: format!("'{key}' on {other}"),
        }),
    }
}

fn object_receiver(this: Option<Value>, key: &str) -> RuntimeResult<ObjectRef> {
    match receiver(this, key)? {
        Value::Object(object) => Ok(object),
        other => Err(RuntimeError::Unsupported {
            what: format!("'{key}' on {other}"),
        }),
    }
}

fn string_arg(args: &[Value], i: usize, key: &str) -> RuntimeResult<Rc<str>> {
    match arg(args, i) {
        Value::Str(s) => Ok(s.clone()),
        Value::Null => Err(RuntimeError::NullReference { member: key.to_string() }),
        other => Ok(Rc::from(other.to_string())),
    }
}

fn bounds(index: i64, length: usize) -> RuntimeResult<usize> {
    match usize::try_from(index) {
        Ok(i) if i < length => Ok(i),
        _ => Err(RuntimeError::IndexOutOfBounds { index, length }),
    }
}

/// `String.hashCode` of the source language.
fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

fn divide_by_zero() -> RuntimeError {
    RuntimeError::Arithmetic {
        message: "/ by zero".to_string(),
    }
}

/// Run the list operation `key` on the backing vector of `list`.
fn list_call(list: &ObjectRef, key: &str, args: &[Value]) -> RuntimeResult<Value> {
    let mut object = list.borrow_mut();
    let NativeState::List(items) = &mut object.native else {
        return Err(RuntimeError::Unsupported {
            what: format!("'{key}' on a non-list object"),
        });
    };
    Ok(match key {
        "List.add" => {
            items.push(arg(args, 0).clone());
            Value::Boolean(true)
        }
        "List.get" => items[bounds(int_arg(args, 0), items.len())?].clone(),
        "List.set" => {
            let slot = bounds(int_arg(args, 0), items.len())?;
            std::mem::replace(&mut items[slot], arg(args, 1).clone())
        }
        "List.remove" => {
            let slot = bounds(int_arg(args, 0), items.len())?;
            items.remove(slot)
        }
        "List.size" => Value::Int(items.len() as i32),
        "List.isEmpty" => Value::Boolean(items.is_empty()),
        "List.contains" => Value::Boolean(items.iter().any(|item| item.same(arg(args, 0)))),
        "List.clear" => {
            items.clear();
            Value::Void
        }
        other => {
            return Err(RuntimeError::UnknownNative { key: other.to_string() });
        }
    })
}

fn string_call(s: &str, key: &str, args: &[Value]) -> RuntimeResult<Value> {
    let units: Vec<u16> = s.encode_utf16().collect();
    Ok(match key {
        "String.length" => Value::Int(units.len() as i32),
        "String.isEmpty" => Value::Boolean(units.is_empty()),
        "String.charAt" => Value::Char(units[bounds(int_arg(args, 0), units.len())?]),
        "String.substring" => {
            let begin = int_arg(args, 0);
            let end = if args.len() > 1 { int_arg(args, 1) } else { units.len() as i64 };
            if begin < 0 || end > units.len() as i64 || begin > end {
                return Err(RuntimeError::IndexOutOfBounds {
                    index: if begin < 0 { begin } else { end },
                    length: units.len(),
                });
            }
            Value::string(&String::from_utf16_lossy(&units[begin as usize..end as usize]))
        }
        "String.indexOf" => {
            let needle = string_arg(args, 0, key)?;
            Value::Int(
                s.find(needle.as_ref())
                    .map_or(-1, |byte| s[..byte].encode_utf16().count() as i32),
            )
        }
        "String.contains" => Value::Boolean(s.contains(string_arg(args, 0, key)?.as_ref())),
        "String.startsWith" => Value::Boolean(s.starts_with(string_arg(args, 0, key)?.as_ref())),
        "String.concat" => Value::string(&format!("{s}{}", string_arg(args, 0, key)?)),
        "String.toUpperCase" => Value::string(&s.to_uppercase()),
        "String.toLowerCase" => Value::string(&s.to_lowercase()),
        "String.trim" => Value::string(s.trim_matches(|c: char| c <= ' ')),
        other => return Err(RuntimeError::UnknownNative { key: other.to_string() }),
    })
}

fn math_call(key: &str, args: &[Value]) -> RuntimeResult<Value> {
    let a = arg(args, 0);
    let b = arg(args, 1);
    let real = |v: &Value| v.as_f64().unwrap_or(0.0);
    Ok(match (key, a) {
        ("Math.abs", Value::Int(v)) => Value::Int(v.wrapping_abs()),
        ("Math.abs", Value::Long(v)) => Value::Long(v.wrapping_abs()),
        ("Math.abs", v) => Value::Double(real(v).abs()),
        ("Math.max", Value::Int(x)) => Value::Int(*x.max(&(b.as_i64().unwrap_or(0) as i32))),
        ("Math.max", Value::Long(x)) => Value::Long(*x.max(&b.as_i64().unwrap_or(0))),
        ("Math.max", v) => Value::Double(real(v).max(real(b))),
        ("Math.min", Value::Int(x)) => Value::Int(*x.min(&(b.as_i64().unwrap_or(0) as i32))),
        ("Math.min", Value::Long(x)) => Value::Long(*x.min(&b.as_i64().unwrap_or(0))),
        ("Math.min", v) => Value::Double(real(v).min(real(b))),
        ("Math.sqrt", v) => Value::Double(real(v).sqrt()),
        ("Math.floor", v) => Value::Double(real(v).floor()),
        ("Math.ceil", v) => Value::Double(real(v).ceil()),
        ("Math.pow", v) => Value::Double(real(v).powf(real(b))),
        (other, _) => return Err(RuntimeError::UnknownNative { key: other.to_string() }),
    })
}

/// Lowering helpers: numeric semantics spelled out as calls.
fn runtime_call(key: &str, args: &[Value]) -> RuntimeResult<Value> {
    use strata_solver::PrimitiveKind as K;
    let a = arg(args, 0);
    let convert = |kind: K| {
        a.convert(kind).ok_or_else(|| RuntimeError::InvalidCast {
            from: a.to_string(),
            to: kind.name().to_string(),
        })
    };
    match key {
        "StrataRuntime.trunc" | "StrataRuntime.toInt" => convert(K::Int),
        "StrataRuntime.truncLong" => convert(K::Long),
        "StrataRuntime.toShort" => convert(K::Short),
        "StrataRuntime.toByte" => convert(K::Byte),
        "StrataRuntime.toChar" => convert(K::Char),
        "StrataRuntime.idiv" => {
            let (x, y) = (int_arg(args, 0) as i32, int_arg(args, 1) as i32);
            if y == 0 {
                return Err(divide_by_zero());
            }
            Ok(Value::Int(x.wrapping_div(y)))
        }
        "StrataRuntime.ldiv" => {
            let (x, y) = (int_arg(args, 0), int_arg(args, 1));
            if y == 0 {
                return Err(divide_by_zero());
            }
            Ok(Value::Long(x.wrapping_div(y)))
        }
        other => Err(RuntimeError::UnknownNative { key: other.to_string() }),
    }
}

/// Plain object of a builtin class, outside the constructor protocol.
fn native_object(interp: &mut Interpreter<'_>, type_name: &str, native: NativeState) -> RuntimeResult<Value> {
    let Some(class) = interp.db.find_type(type_name) else {
        return Err(RuntimeError::Unsupported {
            what: format!("builtin '{type_name}' is not registered"),
        });
    };
    Ok(Value::Object(Rc::new(RefCell::new(Object {
        id: interp.next_id(),
        class,
        fields: IndexMap::new(),
        outer: None,
        native,
    }))))
}

/// Invoke the native method `key`.
pub(crate) fn call(
    interp: &mut Interpreter<'_>,
    ctx: &mut ExecutionContext,
    key: &str,
    this: Option<Value>,
    args: Vec<Value>,
) -> RuntimeResult<Value> {
    let db = interp.db;
    let (group, _) = key.split_once('.').unwrap_or((key, ""));
    match group {
        "String" if key == "String.valueOf" => {
            let text = interp.to_display_string(ctx, arg(&args, 0))?;
            Ok(Value::string(&text))
        }
        "String" => {
            let s = string_receiver(this, key)?;
            string_call(&s, key, &args)
        }
        "List" => {
            let list = object_receiver(this, key)?;
            if key == "List.iterator" {
                return native_object(
                    interp,
                    "java.util.ArrayListIterator",
                    NativeState::ListIterator { list, index: 0 },
                );
            }
            list_call(&list, key, &args)
        }
        "Iterator" => {
            let iterator = object_receiver(this, key)?;
            let mut state = iterator.borrow_mut();
            let NativeState::ListIterator { list, index } = &mut state.native else {
                return Err(RuntimeError::Unsupported {
                    what: format!("'{key}' on a non-iterator object"),
                });
            };
            let (item, length) = match &list.borrow().native {
                NativeState::List(items) => (items.get(*index).cloned(), items.len()),
                _ => (None, 0),
            };
            if key == "Iterator.hasNext" {
                return Ok(Value::Boolean(*index < length));
            }
            let item = item.ok_or(RuntimeError::IndexOutOfBounds {
                index: *index as i64,
                length,
            })?;
            *index += 1;
            Ok(item)
        }
        "Math" => math_call(key, &args),
        "StrataRuntime" => runtime_call(key, &args),
        _ => match key {
            "Object.toString" => {
                let value = receiver(this, key)?;
                Ok(match &value {
                    Value::Object(object) => {
                        let object = object.borrow();
                        Value::string(&format!("{}@{:x}", db.type_name(object.class), object.id))
                    }
                    other => Value::string(&other.to_string()),
                })
            }
            "Object.equals" => Ok(Value::Boolean(receiver(this, key)?.same(arg(&args, 0)))),
            "Object.hashCode" => Ok(Value::Int(match receiver(this, key)? {
                Value::Object(object) => object.borrow().id as i32,
                Value::Str(s) => string_hash(&s),
                Value::Boolean(b) => {
                    if b {
                        1231
                    } else {
                        1237
                    }
                }
                other => other.as_i64().map_or(0, |v| (v ^ (v >> 32)) as i32),
            })),
            "Number.intValue" => receiver(this, key).map(|v| v.convert(strata_solver::PrimitiveKind::Int).unwrap_or(v)),
            "Number.longValue" => {
                receiver(this, key).map(|v| v.convert(strata_solver::PrimitiveKind::Long).unwrap_or(v))
            }
            "Number.doubleValue" => {
                receiver(this, key).map(|v| v.convert(strata_solver::PrimitiveKind::Double).unwrap_or(v))
            }
            "Boolean.booleanValue" | "Character.charValue" => receiver(this, key),
            "Boxed.valueOf" => Ok(arg(&args, 0).clone()),
            "Character.isDigit" => Ok(Value::Boolean(
                arg(&args, 0)
                    .as_i64()
                    .and_then(|c| char::from_u32(c as u32))
                    .is_some_and(|c| c.is_ascii_digit()),
            )),
            "Integer.parseInt" => {
                let text = string_arg(&args, 0, key)?;
                text.parse::<i32>().map(Value::Int).map_err(|_| RuntimeError::IllegalArgument {
                    message: format!("For input string: \"{text}\""),
                })
            }
            "Double.parseDouble" => {
                let text = string_arg(&args, 0, key)?;
                text.trim()
                    .parse::<f64>()
                    .map(Value::Double)
                    .map_err(|_| RuntimeError::IllegalArgument {
                        message: format!("For input string: \"{text}\""),
                    })
            }
            "Throwable.getMessage" => Ok(field_of(&object_receiver(this, key)?, "message")),
            "Throwable.getCause" => Ok(field_of(&object_receiver(this, key)?, "cause")),
            "Throwable.toString" => {
                let value = receiver(this, key)?;
                Ok(Value::string(&interp.describe_exception(&value)))
            }
            "StringBuilder.append" => {
                let builder = object_receiver(this, key)?;
                let text = interp.to_display_string(ctx, arg(&args, 0))?;
                if let NativeState::Builder(buffer) = &mut builder.borrow_mut().native {
                    buffer.push_str(&text);
                }
                Ok(Value::Object(builder))
            }
            "StringBuilder.length" | "StringBuilder.toString" => {
                let builder = object_receiver(this, key)?;
                let object = builder.borrow();
                let NativeState::Builder(buffer) = &object.native else {
                    return Err(RuntimeError::Unsupported {
                        what: format!("'{key}' on a non-builder object"),
                    });
                };
                Ok(if key == "StringBuilder.length" {
                    Value::Int(buffer.encode_utf16().count() as i32)
                } else {
                    Value::string(buffer)
                })
            }
            "PrintStream.println" | "PrintStream.print" => {
                let mut text = match args.first() {
                    Some(value) => interp.to_display_string(ctx, value)?,
                    None => String::new(),
                };
                if key == "PrintStream.println" {
                    text.push('\n');
                }
                ctx.print(&text);
                Ok(Value::Void)
            }
            "System.currentTimeMillis" => Ok(Value::Long(
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_or(0, |d| d.as_millis() as i64),
            )),
            other => Err(RuntimeError::UnknownNative { key: other.to_string() }),
        },
    }
}

fn field_of(object: &ObjectRef, name: &str) -> Value {
    object.borrow().fields.get(name).cloned().unwrap_or(Value::Null)
}

/// Read the native static field `key`.
pub(crate) fn field(interp: &mut Interpreter<'_>, _ctx: &mut ExecutionContext, key: &str) -> RuntimeResult<Value> {
    Ok(match key {
        "Integer.MAX_VALUE" => Value::Int(i32::MAX),
        "Integer.MIN_VALUE" => Value::Int(i32::MIN),
        "Long.MAX_VALUE" => Value::Long(i64::MAX),
        "Long.MIN_VALUE" => Value::Long(i64::MIN),
        "System.out" => {
            if let Some(out) = &interp.system_out {
                return Ok(out.clone());
            }
            let out = native_object(interp, "java.io.PrintStream", NativeState::None)?;
            interp.system_out = Some(out.clone());
            out
        }
        other => return Err(RuntimeError::UnknownNative { key: other.to_string() }),
    })
}

/// Run the native constructor `key` on a freshly allocated `this`.
pub(crate) fn construct(
    _interp: &mut Interpreter<'_>,
    _ctx: &mut ExecutionContext,
    key: &str,
    this: &Value,
    args: Vec<Value>,
) -> RuntimeResult<()> {
    let Value::Object(object) = this else {
        return Ok(());
    };
    let mut object = object.borrow_mut();
    match key {
        "Object.<init>" | "String.<init>" => {}
        "Throwable.<init>" => {
            object.fields.insert("message".to_string(), arg(&args, 0).clone());
            object.fields.insert("cause".to_string(), arg(&args, 1).clone());
        }
        "ArrayList.<init>" => object.native = NativeState::List(Vec::new()),
        "StringBuilder.<init>" => {
            let initial = arg(&args, 0).as_str().unwrap_or_default().to_string();
            object.native = NativeState::Builder(initial);
        }
        other => return Err(RuntimeError::UnknownNative { key: other.to_string() }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_operations_count_utf16_units() {
        assert!(matches!(string_call("héllo", "String.length", &[]), Ok(Value::Int(5))));
        assert!(matches!(
            string_call("hello", "String.substring", &[Value::Int(1), Value::Int(3)]),
            Ok(Value::Str(s)) if &*s == "el"
        ));
        assert!(matches!(
            string_call("hello", "String.charAt", &[Value::Int(9)]),
            Err(RuntimeError::IndexOutOfBounds { index: 9, length: 5 })
        ));
        assert!(matches!(
            string_call("a-b", "String.indexOf", &[Value::string("b")]),
            Ok(Value::Int(2))
        ));
        assert!(matches!(
            string_call("  x \n", "String.trim", &[]),
            Ok(Value::Str(s)) if &*s == "x"
        ));
    }

    #[test]
    fn string_hash_matches_the_source_language() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("a"), 97);
        assert_eq!(string_hash("hello"), 99_162_322);
    }

    #[test]
    fn runtime_helpers_truncate_and_check_division() {
        assert!(matches!(
            runtime_call("StrataRuntime.trunc", &[Value::Double(-2.7)]),
            Ok(Value::Int(-2))
        ));
        assert!(matches!(
            runtime_call("StrataRuntime.toByte", &[Value::Int(200)]),
            Ok(Value::Byte(-56))
        ));
        assert!(matches!(
            runtime_call("StrataRuntime.idiv", &[Value::Int(7), Value::Int(-2)]),
            Ok(Value::Int(-3))
        ));
        assert!(matches!(
            runtime_call("StrataRuntime.ldiv", &[Value::Long(1), Value::Long(0)]),
            Err(RuntimeError::Arithmetic { .. })
        ));
    }

    #[test]
    fn math_overloads_follow_the_argument_kind() {
        assert!(matches!(math_call("Math.abs", &[Value::Int(-4)]), Ok(Value::Int(4))));
        assert!(matches!(
            math_call("Math.max", &[Value::Long(3), Value::Long(9)]),
            Ok(Value::Long(9))
        ));
        assert!(matches!(
            math_call("Math.pow", &[Value::Double(2.0), Value::Double(10.0)]),
            Ok(Value::Double(v)) if v == 1024.0
        ));
    }

    #[test]
    fn list_operations_check_bounds() {
        let list = Rc::new(RefCell::new(Object {
            id: 1,
            class: strata_solver::TypeId(0),
            fields: IndexMap::new(),
            outer: None,
            native: NativeState::List(Vec::new()),
        }));
        list_call(&list, "List.add", &[Value::Int(4)]).expect("add");
        list_call(&list, "List.add", &[Value::Int(5)]).expect("add");
        assert!(matches!(list_call(&list, "List.size", &[]), Ok(Value::Int(2))));
        assert!(matches!(
            list_call(&list, "List.set", &[Value::Int(0), Value::Int(7)]),
            Ok(Value::Int(4))
        ));
        assert!(matches!(
            list_call(&list, "List.get", &[Value::Int(2)]),
            Err(RuntimeError::IndexOutOfBounds { index: 2, length: 2 })
        ));
        assert!(matches!(
            list_call(&list, "List.contains", &[Value::Int(7)]),
            Ok(Value::Boolean(true))
        ));
    }
}
