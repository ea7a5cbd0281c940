//! Diagnostic message data.
//!
//! Codes are grouped by range: 1xxx structural/definition errors, 2xxx type
//! errors, 3xxx data-binding errors.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    pub const UNRESOLVED_IDENTIFIER: u32 = 1001;
    pub const UNRESOLVED_TYPE: u32 = 1002;
    pub const NO_SUCH_MEMBER: u32 = 1003;
    pub const NO_MATCHING_METHOD: u32 = 1004;
    pub const WRONG_ARGUMENT_COUNT: u32 = 1005;
    pub const DUPLICATE_DEFINITION: u32 = 1006;
    pub const NO_MATCHING_CONSTRUCTOR: u32 = 1007;
    pub const ABSTRACT_INSTANTIATION: u32 = 1008;
    pub const DUPLICATE_TYPE: u32 = 1009;
    pub const TYPE_MISMATCH: u32 = 2001;
    pub const CONDITION_NOT_BOOLEAN: u32 = 2002;
    pub const INVALID_CAST: u32 = 2003;
    pub const OPERATOR_NOT_APPLICABLE: u32 = 2004;
    pub const NOT_ITERABLE: u32 = 2005;
    pub const NOT_AN_LVALUE: u32 = 2006;
    pub const LAMBDA_TARGET_UNKNOWN: u32 = 2007;
    pub const MISSING_RETURN_VALUE: u32 = 2008;
    pub const JUMP_OUTSIDE_LOOP: u32 = 2009;
    pub const UNDEFINED_LABEL: u32 = 2010;
    pub const NO_ENCLOSING_INSTANCE: u32 = 2011;
    pub const STATIC_CONTEXT_THIS: u32 = 2012;
    pub const BINDING_CYCLE: u32 = 3001;
    pub const BINDING_CONTEXT_MISMATCH: u32 = 3002;
}

pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage};

    pub const UNRESOLVED_IDENTIFIER: DiagnosticMessage = DiagnosticMessage {
        code: 1001,
        category: DiagnosticCategory::Error,
        message: "Cannot find symbol '{0}'.",
    };
    pub const UNRESOLVED_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: 1002,
        category: DiagnosticCategory::Error,
        message: "Cannot find type '{0}'.",
    };
    pub const NO_SUCH_MEMBER: DiagnosticMessage = DiagnosticMessage {
        code: 1003,
        category: DiagnosticCategory::Error,
        message: "No member '{0}' in type '{1}'.",
    };
    pub const NO_MATCHING_METHOD: DiagnosticMessage = DiagnosticMessage {
        code: 1004,
        category: DiagnosticCategory::Error,
        message: "No method '{0}' in type '{1}' is applicable to arguments ({2}).",
    };
    pub const WRONG_ARGUMENT_COUNT: DiagnosticMessage = DiagnosticMessage {
        code: 1005,
        category: DiagnosticCategory::Error,
        message: "Expected {0} arguments but got {1}.",
    };
    pub const DUPLICATE_DEFINITION: DiagnosticMessage = DiagnosticMessage {
        code: 1006,
        category: DiagnosticCategory::Error,
        message: "Variable '{0}' is already defined in this scope.",
    };
    pub const NO_MATCHING_CONSTRUCTOR: DiagnosticMessage = DiagnosticMessage {
        code: 1007,
        category: DiagnosticCategory::Error,
        message: "No constructor of '{0}' is applicable to arguments ({1}).",
    };
    pub const ABSTRACT_INSTANTIATION: DiagnosticMessage = DiagnosticMessage {
        code: 1008,
        category: DiagnosticCategory::Error,
        message: "Cannot instantiate abstract type '{0}'.",
    };
    pub const DUPLICATE_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: 1009,
        category: DiagnosticCategory::Error,
        message: "Type '{0}' is already defined.",
    };
    pub const TYPE_MISMATCH: DiagnosticMessage = DiagnosticMessage {
        code: 2001,
        category: DiagnosticCategory::Error,
        message: "Type '{0}' is not assignable to type '{1}'.",
    };
    pub const CONDITION_NOT_BOOLEAN: DiagnosticMessage = DiagnosticMessage {
        code: 2002,
        category: DiagnosticCategory::Error,
        message: "Condition must be boolean but was '{0}'.",
    };
    pub const INVALID_CAST: DiagnosticMessage = DiagnosticMessage {
        code: 2003,
        category: DiagnosticCategory::Error,
        message: "Cannot cast from '{0}' to '{1}'.",
    };
    pub const OPERATOR_NOT_APPLICABLE: DiagnosticMessage = DiagnosticMessage {
        code: 2004,
        category: DiagnosticCategory::Error,
        message: "Operator '{0}' cannot be applied to '{1}' and '{2}'.",
    };
    pub const NOT_ITERABLE: DiagnosticMessage = DiagnosticMessage {
        code: 2005,
        category: DiagnosticCategory::Error,
        message: "For-each requires an array or Iterable but found '{0}'.",
    };
    pub const NOT_AN_LVALUE: DiagnosticMessage = DiagnosticMessage {
        code: 2006,
        category: DiagnosticCategory::Error,
        message: "Invalid assignment target.",
    };
    pub const LAMBDA_TARGET_UNKNOWN: DiagnosticMessage = DiagnosticMessage {
        code: 2007,
        category: DiagnosticCategory::Error,
        message: "Cannot infer a functional interface for this lambda expression.",
    };
    pub const MISSING_RETURN_VALUE: DiagnosticMessage = DiagnosticMessage {
        code: 2008,
        category: DiagnosticCategory::Error,
        message: "Method '{0}' must return a value of type '{1}'.",
    };
    pub const JUMP_OUTSIDE_LOOP: DiagnosticMessage = DiagnosticMessage {
        code: 2009,
        category: DiagnosticCategory::Error,
        message: "'{0}' outside of loop or switch.",
    };
    pub const UNDEFINED_LABEL: DiagnosticMessage = DiagnosticMessage {
        code: 2010,
        category: DiagnosticCategory::Error,
        message: "Undefined label '{0}'.",
    };
    pub const NO_ENCLOSING_INSTANCE: DiagnosticMessage = DiagnosticMessage {
        code: 2011,
        category: DiagnosticCategory::Error,
        message: "No enclosing instance of type '{0}' is in scope.",
    };
    pub const STATIC_CONTEXT_THIS: DiagnosticMessage = DiagnosticMessage {
        code: 2012,
        category: DiagnosticCategory::Error,
        message: "'this' cannot be referenced from a static context.",
    };
    pub const BINDING_CYCLE: DiagnosticMessage = DiagnosticMessage {
        code: 3001,
        category: DiagnosticCategory::Error,
        message: "Binding cycle detected: {0}.",
    };
    pub const BINDING_CONTEXT_MISMATCH: DiagnosticMessage = DiagnosticMessage {
        code: 3002,
        category: DiagnosticCategory::Warning,
        message: "Possible binding cycle through '{0}' reached under a different receiver path.",
    };
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    diagnostic_messages::UNRESOLVED_IDENTIFIER,
    diagnostic_messages::UNRESOLVED_TYPE,
    diagnostic_messages::NO_SUCH_MEMBER,
    diagnostic_messages::NO_MATCHING_METHOD,
    diagnostic_messages::WRONG_ARGUMENT_COUNT,
    diagnostic_messages::DUPLICATE_DEFINITION,
    diagnostic_messages::NO_MATCHING_CONSTRUCTOR,
    diagnostic_messages::ABSTRACT_INSTANTIATION,
    diagnostic_messages::DUPLICATE_TYPE,
    diagnostic_messages::TYPE_MISMATCH,
    diagnostic_messages::CONDITION_NOT_BOOLEAN,
    diagnostic_messages::INVALID_CAST,
    diagnostic_messages::OPERATOR_NOT_APPLICABLE,
    diagnostic_messages::NOT_ITERABLE,
    diagnostic_messages::NOT_AN_LVALUE,
    diagnostic_messages::LAMBDA_TARGET_UNKNOWN,
    diagnostic_messages::MISSING_RETURN_VALUE,
    diagnostic_messages::JUMP_OUTSIDE_LOOP,
    diagnostic_messages::UNDEFINED_LABEL,
    diagnostic_messages::NO_ENCLOSING_INSTANCE,
    diagnostic_messages::STATIC_CONTEXT_THIS,
    diagnostic_messages::BINDING_CYCLE,
    diagnostic_messages::BINDING_CONTEXT_MISMATCH,
];
