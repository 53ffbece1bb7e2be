//! Runtime type system: a registry of declared data types and the
//! [`Variable`] value tree built from it.

pub mod convert;
mod error;
mod registry;
mod variable;

pub use error::{SchemaError, ValueError};
pub use registry::TypeRegistry;
pub use variable::{ArrayVar, ObjectVar, Scalar, Variable};
