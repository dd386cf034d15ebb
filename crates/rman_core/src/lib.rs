//! Core vocabulary of the RMan interface.
//!
//! Tokens, errors, the request catalogue, declarations and parameter binding.
//! Every other crate of the workspace builds on these types.

pub mod basis;
pub mod declaration;
pub mod errors;
pub mod interner;
pub mod parameter;
pub mod request;
pub mod tokens;
pub mod types;

pub use basis::Basis;
pub use declaration::{Declaration, DeclarationDictionary};
pub use errors::{ErrorCode, Result, RiError, Severity};
pub use interner::Token;
pub use parameter::{GeometryCounts, ParamBuffer, ParamValues, Parameter, ParameterList};
pub use request::{Request, RequestClass};
pub use types::{
    ArchiveHandle, BasicType, Bound, ContextHandle, DataType, HandleCounter, LightHandle, Matrix,
    ObjectHandle, StorageClass, matrix_from_rows, matrix_to_rows,
};
