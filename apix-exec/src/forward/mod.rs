//! Forward chains: compiled nodes, the per-request engine that runs them and
//! the transports that deliver each node's call.

mod chain;
mod engine;
mod error;
mod forwarder;
mod result;

pub use chain::{CompiledForward, CompiledTarget, ForwardChain};
pub use engine::ForwardEngine;
pub use error::ForwardError;
pub use forwarder::{Forwarder, ServiceForwarder};
pub use result::ForwardResult;
