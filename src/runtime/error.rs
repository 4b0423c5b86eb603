use thiserror::Error;

/// Errors raised by value operations, independent of any source location.
/// The evaluator attaches the offending token when one of these escapes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// The left operand's type lacks the capability altogether.
    #[error("Type '{type_name}' does not support '{operation}'")]
    UnsupportedOperation {
        type_name: &'static str,
        operation: &'static str,
    },
    /// The capability exists on the left operand but the operand types
    /// disagree.
    #[error("Cannot apply '{operation}' to '{left}' and '{right}'")]
    IncompatibleOperands {
        operation: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Integer overflow in '{operation}'")]
    IntegerOverflow { operation: &'static str },
    #[error("Index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("Index must be a number, got '{type_name}'")]
    InvalidIndex { type_name: &'static str },
    #[error("Key {key} is not present")]
    MissingKey { key: String },
    #[error("Type '{type_name}' cannot be used as a dict key")]
    UnhashableKey { type_name: &'static str },
    #[error("Slice step cannot be zero")]
    ZeroStep,
    #[error("Shift amount {amount} is outside 0..64")]
    ShiftOutOfRange { amount: i64 },
    #[error("{name}() expects {expected} arguments, got {got}")]
    FunctionArity {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{name}(): {message}")]
    InvalidArgument {
        name: &'static str,
        message: String,
    },
}
