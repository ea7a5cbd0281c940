//! Runtime values.
//!
//! Boxed primitives are not distinguished from primitives: an `Integer`
//! variable holds a [`Value::Int`]. Objects, arrays and lambdas are shared
//! by reference.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use strata_ast::NodeIndex;
use strata_solver::{PrimitiveKind, TypeDatabase, TypeId, TypeRef, boxed_type, unboxed_kind};

pub type ObjectRef = Rc<RefCell<Object>>;
pub type ArrayRef = Rc<RefCell<ArrayData>>;

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    /// Result of a `void` call.
    Void,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Rc<str>),
    Object(ObjectRef),
    Array(ArrayRef),
    Lambda(Rc<Closure>),
    /// A type named by an identifier chain (`Math` in `Math.max(a, b)`).
    Type(TypeRef),
}

/// Instance of a compiled or dynamic class.
#[derive(Debug)]
pub struct Object {
    /// Allocation number, used for identity hashes and default `toString`.
    pub id: u32,
    pub class: TypeId,
    pub fields: IndexMap<String, Value>,
    /// Enclosing instance of an inner-class object.
    pub outer: Option<Value>,
    pub native: NativeState,
}

/// Backing storage of builtin classes.
#[derive(Debug, Default)]
pub enum NativeState {
    #[default]
    None,
    List(Vec<Value>),
    Builder(String),
    ListIterator { list: ObjectRef, index: usize },
}

#[derive(Debug)]
pub struct ArrayData {
    pub element: TypeRef,
    pub items: Vec<Value>,
}

/// A lambda together with the locals and `this` it captured.
#[derive(Debug)]
pub struct Closure {
    pub node: NodeIndex,
    /// Functional interface the lambda was created for.
    pub interface: TypeRef,
    pub captured: Vec<(String, Value)>,
    pub this: Value,
}

impl Value {
    pub fn string(text: &str) -> Value {
        Value::Str(Rc::from(text))
    }

    pub fn new_array(element: TypeRef, items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(ArrayData { element, items })))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Zero value of a field or array element of type `ty`.
    pub fn default_for(ty: &TypeRef) -> Value {
        match ty.primitive() {
            Some(PrimitiveKind::Boolean) => Value::Boolean(false),
            Some(PrimitiveKind::Byte) => Value::Byte(0),
            Some(PrimitiveKind::Short) => Value::Short(0),
            Some(PrimitiveKind::Char) => Value::Char(0),
            Some(PrimitiveKind::Int) => Value::Int(0),
            Some(PrimitiveKind::Long) => Value::Long(0),
            Some(PrimitiveKind::Float) => Value::Float(0.0),
            Some(PrimitiveKind::Double) => Value::Double(0.0),
            Some(PrimitiveKind::Void) | None => Value::Null,
        }
    }

    /// Primitive kind of a primitive value.
    pub fn kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Value::Boolean(_) => PrimitiveKind::Boolean,
            Value::Byte(_) => PrimitiveKind::Byte,
            Value::Short(_) => PrimitiveKind::Short,
            Value::Char(_) => PrimitiveKind::Char,
            Value::Int(_) => PrimitiveKind::Int,
            Value::Long(_) => PrimitiveKind::Long,
            Value::Float(_) => PrimitiveKind::Float,
            Value::Double(_) => PrimitiveKind::Double,
            _ => return None,
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral value, including `char`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Char(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Numeric conversion with the source language's casting rules:
    /// integral narrowing wraps, floating to integral truncates toward zero
    /// and saturates, NaN becomes zero.
    pub fn convert(&self, kind: PrimitiveKind) -> Option<Value> {
        if kind == PrimitiveKind::Boolean {
            return self.as_bool().map(Value::Boolean);
        }
        let integral = self.as_i64();
        let real = self.as_f64()?;
        Some(match kind {
            PrimitiveKind::Byte => Value::Byte(integral.map_or(real as i32 as i8, |v| v as i8)),
            PrimitiveKind::Short => Value::Short(integral.map_or(real as i32 as i16, |v| v as i16)),
            PrimitiveKind::Char => Value::Char(integral.map_or(real as i32 as u16, |v| v as u16)),
            PrimitiveKind::Int => Value::Int(integral.map_or(real as i32, |v| v as i32)),
            PrimitiveKind::Long => Value::Long(integral.unwrap_or(real as i64)),
            PrimitiveKind::Float => Value::Float(real as f32),
            PrimitiveKind::Double => Value::Double(real),
            PrimitiveKind::Boolean | PrimitiveKind::Void => return None,
        })
    }

    /// Convert for storage in a slot of static type `target`: primitives
    /// (and their wrappers) widen or narrow, references pass through.
    pub fn coerce(self, db: &dyn TypeDatabase, target: &TypeRef) -> Value {
        if self.kind().is_none() {
            return self;
        }
        match unboxed_kind(db, target) {
            Some(kind) if kind != PrimitiveKind::Void => self.convert(kind).unwrap_or(self),
            _ => self,
        }
    }

    /// `==` on values: primitives compare numerically, strings by content,
    /// everything else by identity.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a == b,
            (a, b) => match (a.as_i64(), b.as_i64()) {
                (Some(x), Some(y)) => x == y,
                _ => match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                },
            },
        }
    }

    /// Type of the value at run time. Parameterized classes report their
    /// raw type.
    pub fn runtime_type(&self, db: &dyn TypeDatabase) -> TypeRef {
        match self {
            Value::Null => TypeRef::Null,
            Value::Void => TypeRef::VOID,
            Value::Str(_) => db.string_type(),
            Value::Object(obj) => TypeRef::Class(obj.borrow().class),
            Value::Array(array) => TypeRef::array_of(array.borrow().element.clone()),
            Value::Lambda(closure) => closure.interface.clone(),
            Value::Type(_) => db.object_type(),
            primitive => primitive
                .kind()
                .and_then(|kind| boxed_type(db, kind))
                .unwrap_or(TypeRef::Unresolved),
        }
    }
}

/// Render a `double` the way the source language prints it.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e7 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for Value {
    /// Primitive and string rendering; objects show their allocation number
    /// (the interpreter renders them through `toString`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Void => f.write_str("void"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Char(c) => match char::from_u32(u32::from(*c)) {
                Some(ch) => write!(f, "{ch}"),
                None => f.write_str("\u{fffd}"),
            },
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => f.write_str(&format_double(f64::from(*v))),
            Value::Double(v) => f.write_str(&format_double(*v)),
            Value::Str(s) => f.write_str(s),
            Value::Object(obj) => write!(f, "Object@{}", obj.borrow().id),
            Value::Array(array) => write!(f, "[array of {}]", array.borrow().items.len()),
            Value::Lambda(closure) => write!(f, "Lambda@{}", closure.node.0),
            Value::Type(_) => f.write_str("<type>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_conversions_wrap_and_truncate() {
        assert!(matches!(Value::Int(300).convert(PrimitiveKind::Byte), Some(Value::Byte(44))));
        assert!(matches!(Value::Double(-3.9).convert(PrimitiveKind::Int), Some(Value::Int(-3))));
        assert!(matches!(Value::Double(f64::NAN).convert(PrimitiveKind::Long), Some(Value::Long(0))));
        assert!(matches!(
            Value::Double(1e20).convert(PrimitiveKind::Int),
            Some(Value::Int(i32::MAX))
        ));
        assert!(matches!(Value::Char(65).convert(PrimitiveKind::Int), Some(Value::Int(65))));
        assert!(Value::string("x").convert(PrimitiveKind::Int).is_none());
    }

    #[test]
    fn equality_is_numeric_for_primitives_and_by_identity_for_objects() {
        assert!(Value::Int(2).same(&Value::Long(2)));
        assert!(Value::Char(97).same(&Value::Int(97)));
        assert!(Value::Double(1.5).same(&Value::Float(1.5)));
        assert!(Value::string("a").same(&Value::string("a")));
        let a = Value::new_array(TypeRef::INT, vec![]);
        let b = Value::new_array(TypeRef::INT, vec![]);
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
        assert!(!Value::Null.same(&Value::Int(0)));
    }

    #[test]
    fn doubles_print_with_a_fraction() {
        assert_eq!(format_double(1.0), "1.0");
        assert_eq!(format_double(0.25), "0.25");
        assert_eq!(Value::Double(-2.0).to_string(), "-2.0");
        assert_eq!(Value::Char(u16::from(b'z')).to_string(), "z");
    }
}
