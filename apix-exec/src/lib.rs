#![forbid(unsafe_code)]

//! Request pipeline of the apix gateway.
//!
//! A loaded document compiles into [`ApiCode`]: per endpoint a [`ParamBinder`]
//! that turns raw request values into a typed [`Variable`] tree, and a
//! [`ForwardChain`] that the [`ForwardEngine`] runs against backend services.

pub mod binder;
pub mod compile;
pub mod config;
pub mod forward;
pub mod gateway;
pub mod types;

pub use crate::binder::{JsonParamReader, ParamBinder, ParamReader};
pub use crate::compile::{ApiCode, CompileError, CompiledEndpoint};
pub use crate::config::{ConfigError, GatewayConfig};
pub use crate::forward::{
    CompiledForward, CompiledTarget, ForwardChain, ForwardEngine, ForwardError, ForwardResult,
    Forwarder, ServiceForwarder,
};
pub use crate::gateway::{BufferedResponse, EndpointInfo, Gateway, GatewayError, ResponseWriter};
pub use crate::types::{SchemaError, TypeRegistry, ValueError, Variable};
