//! Evaluation errors.

use strata_ast::NodeIndex;
use thiserror::Error;

use crate::value::Value;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A value thrown by the interpreted program (or materialised from one
    /// of the catchable variants below).
    #[error("uncaught exception: {description}")]
    Thrown { value: Value, description: String },

    #[error("null dereference accessing '{member}'")]
    NullReference { member: String },

    #[error("cannot cast '{from}' to '{to}'")]
    InvalidCast { from: String, to: String },

    #[error("{message}")]
    Arithmetic { message: String },

    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("illegal argument: {message}")]
    IllegalArgument { message: String },

    /// Failure inside a native method, carried so the original error can be
    /// delivered to an interpreted `catch`.
    #[error("invocation of '{method}' failed: {source}")]
    InvocationTarget {
        method: String,
        #[source]
        source: Box<RuntimeError>,
    },

    #[error("variable '{name}' is already defined in this scope")]
    DuplicateDefinition { name: String },

    #[error("variable '{name}' is not defined")]
    UndefinedVariable { name: String },

    #[error("no frame to define variable '{name}' in")]
    NoFrame { name: String },

    #[error("no enclosing instance of '{wanted}' (visible: {visible})")]
    NoEnclosingInstance { wanted: String, visible: String },

    #[error("node {node} ({kind}) was not resolved before evaluation")]
    Unresolved { node: NodeIndex, kind: &'static str },

    #[error("maximum call depth {depth} exceeded")]
    CallDepthExceeded { depth: u32 },

    #[error("abstract method '{method}' has no implementation")]
    AbstractMethod { method: String },

    #[error("no native implementation for '{key}'")]
    UnknownNative { key: String },

    #[error("cannot evaluate {what}")]
    Unsupported { what: String },
}

impl RuntimeError {
    /// Strip invocation-target carriers.
    pub fn into_root_cause(self) -> RuntimeError {
        match self {
            RuntimeError::InvocationTarget { source, .. } => source.into_root_cause(),
            other => other,
        }
    }

    /// Whether an interpreted `catch` clause may observe this error.
    pub fn is_catchable(&self) -> bool {
        match self {
            RuntimeError::Thrown { .. }
            | RuntimeError::NullReference { .. }
            | RuntimeError::InvalidCast { .. }
            | RuntimeError::Arithmetic { .. }
            | RuntimeError::IndexOutOfBounds { .. }
            | RuntimeError::IllegalArgument { .. } => true,
            RuntimeError::InvocationTarget { source, .. } => source.is_catchable(),
            _ => false,
        }
    }

    /// Message carried by the materialised exception object.
    pub(crate) fn exception_message(&self) -> String {
        match self {
            RuntimeError::Arithmetic { message } | RuntimeError::IllegalArgument { message } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
