use thiserror::Error;

use crate::signature::ParamKind;

/// Errors raised by registration, dispatch and evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// No function of that name is registered.
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// Name as written in the expression.
        name: String,
    },

    /// A required parameter was not supplied.
    #[error("{function}: missing argument {position} ({expected})")]
    MissingArgument {
        /// Function being called.
        function: String,
        /// 1-based parameter position.
        position: usize,
        /// What the signature wanted there.
        expected: ParamKind,
    },

    /// A supplied argument has the wrong kind.
    #[error("{function}: argument {position} must be a {expected}")]
    ArgumentType {
        /// Function being called.
        function: String,
        /// 1-based parameter position.
        position: usize,
        /// What the signature wanted there.
        expected: ParamKind,
    },

    /// A handler table entry has a malformed parameter string.
    #[error("invalid signature '{signature}' for '{name}': {reason}")]
    InvalidSignature {
        /// Function name from the table.
        name: String,
        /// Offending parameter string.
        signature: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The expression text could not be parsed.
    #[error("syntax error in '{expr}': {message}")]
    Syntax {
        /// Full expression text.
        expr: String,
        /// Description of the problem.
        message: String,
    },
}
