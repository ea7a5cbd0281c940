//! Support code the printed program depends on.
//!
//! Helpers are emitted once, before the program, and only when referenced.

use strata_ast::TypeSyntax;

/// Function or class the printed program calls into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Helper {
    Trunc,
    TruncLong,
    ToInt,
    ToShort,
    ToByte,
    ToChar,
    Idiv,
    Ldiv,
    NewArray,
    Iterator,
    StringBuilder,
}

impl Helper {
    /// Helper behind a `StrataRuntime` method.
    pub(crate) fn from_runtime(name: &str) -> Option<Helper> {
        Some(match name {
            "trunc" => Helper::Trunc,
            "truncLong" => Helper::TruncLong,
            "toInt" => Helper::ToInt,
            "toShort" => Helper::ToShort,
            "toByte" => Helper::ToByte,
            "toChar" => Helper::ToChar,
            "idiv" => Helper::Idiv,
            "ldiv" => Helper::Ldiv,
            _ => return None,
        })
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Helper::Trunc => "__trunc",
            Helper::TruncLong => "__truncLong",
            Helper::ToInt => "__toInt",
            Helper::ToShort => "__toShort",
            Helper::ToByte => "__toByte",
            Helper::ToChar => "__toChar",
            Helper::Idiv => "__idiv",
            Helper::Ldiv => "__ldiv",
            Helper::NewArray => "__newArray",
            Helper::Iterator => "__iterator",
            Helper::StringBuilder => "StringBuilder",
        }
    }

    /// Exception class the helper throws.
    pub(crate) fn throws(self) -> Option<&'static str> {
        match self {
            Helper::Idiv | Helper::Ldiv => Some("java.lang.ArithmeticException"),
            _ => None,
        }
    }

    pub(crate) fn source(self) -> &'static str {
        match self {
            Helper::Trunc => {
                "function __trunc(x) {\n    if (Number.isNaN(x)) return 0;\n    return Math.max(-2147483648, Math.min(2147483647, Math.trunc(x)));\n}\n"
            }
            Helper::TruncLong => {
                "function __truncLong(x) {\n    if (Number.isNaN(x)) return 0;\n    return Math.trunc(x);\n}\n"
            }
            Helper::ToInt => "function __toInt(x) {\n    return x | 0;\n}\n",
            Helper::ToShort => "function __toShort(x) {\n    return (x << 16) >> 16;\n}\n",
            Helper::ToByte => "function __toByte(x) {\n    return (x << 24) >> 24;\n}\n",
            Helper::ToChar => "function __toChar(x) {\n    return x & 0xFFFF;\n}\n",
            Helper::Idiv => {
                "function __idiv(a, b) {\n    if (b === 0) throw new ArithmeticException(\"/ by zero\");\n    return (a / b) | 0;\n}\n"
            }
            Helper::Ldiv => {
                "function __ldiv(a, b) {\n    if (b === 0) throw new ArithmeticException(\"/ by zero\");\n    return Math.trunc(a / b);\n}\n"
            }
            Helper::NewArray => {
                "function __newArray(dims, fill) {\n    if (dims.length === 0) return fill;\n    const [n, ...rest] = dims;\n    return Array.from({ length: n }, () => __newArray(rest, fill));\n}\n"
            }
            Helper::Iterator => {
                "function __iterator(items) {\n    let i = 0;\n    return { hasNext: () => i < items.length, next: () => items[i++] };\n}\n"
            }
            Helper::StringBuilder => {
                "class StringBuilder {\n    constructor(text = \"\") {\n        this.text = String(text);\n    }\n    append(x) {\n        this.text += x;\n        return this;\n    }\n    length() {\n        return this.text.length;\n    }\n    toString() {\n        return this.text;\n    }\n}\n"
            }
        }
    }
}

/// Root of the exception classes; the rest extend it.
pub(crate) const THROWABLE_SOURCE: &str = "class Throwable extends Error {\n    constructor(message = null, cause = null) {\n        super(message ?? \"\");\n        this.name = new.target.name;\n        this.message = message;\n        this.cause = cause;\n    }\n}\n";

/// JavaScript global standing in for a compiled type.
pub(crate) fn global_name(qualified: &str) -> Option<&'static str> {
    Some(match qualified {
        "java.lang.Object" => "Object",
        "java.lang.String" => "String",
        "java.lang.Math" => "Math",
        "java.util.List" | "java.util.ArrayList" | "java.util.Collection" => "Array",
        "java.lang.Integer" | "java.lang.Long" | "java.lang.Short" | "java.lang.Byte"
        | "java.lang.Double" | "java.lang.Float" | "java.lang.Number" | "java.lang.Character" => "Number",
        "java.lang.Boolean" => "Boolean",
        _ => return None,
    })
}

/// Zero value of a declared type.
pub(crate) fn default_value(ty: &TypeSyntax) -> &'static str {
    if ty.is_array() {
        return "null";
    }
    match ty.name.as_str() {
        "boolean" => "false",
        "byte" | "short" | "char" | "int" | "long" | "float" | "double" => "0",
        _ => "null",
    }
}

/// Escaped string literal.
pub(crate) fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\x7F' => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
