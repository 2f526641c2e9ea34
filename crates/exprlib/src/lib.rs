//! Functions callable from ribbon expressions.
//!
//! - [`registry`]: name lookup and signature-checked dispatch
//! - [`builtins`]: the standard library (`mid`, `pad`, `time`, `disk`, ...)
//! - [`eval`]: evaluation of stored expression strings
//! - [`context`]: widget, pointer and host state handed to functions
#![warn(unsafe_op_in_unsafe_fn)]

pub mod builtins;
pub mod context;
pub mod disk;
mod error;
pub mod eval;
pub mod registry;
pub mod signature;
mod value;

pub use context::{
    BasicHost, CallContext, ConfigPaths, Direction, Geometry, Host, Insets, PointerEvent, Widget,
    WindowInfo,
};
pub use error::Error;
pub use eval::{CallCache, DEFAULT_CACHE_CAPACITY, Evaluator, MAX_NESTING};
pub use registry::{ExprFn, FunctionRegistry, Handler, Params, install, registry};
pub use signature::{Flags, ParamKind, Signature};
pub use value::{Value, parse_leading_number};
