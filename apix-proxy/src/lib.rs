//! Framed full-duplex IPC between the apix gateway and backend processes.
//!
//! A [`ServiceProxy`] owns one reader and one writer task over a byte stream
//! and multiplexes concurrent calls by correlation id. [`ProxyRegistry`] maps
//! service names to proxies and [`Launcher`] starts backend executables.

#![forbid(unsafe_code)]

pub mod backend;
pub mod call;
pub mod config;
pub mod error;
pub mod frame;
pub mod launcher;
mod pending;
pub mod registry;
pub mod service;

pub use backend::{register_services, serve_stdio, stdio_proxy, ServiceCallAdapter, ServiceHandler};
pub use call::{Registration, ServiceCall};
pub use config::ProxyConfig;
pub use error::ProxyError;
pub use frame::{read_frame, write_frame, FrameError, IpcMessage, MessageKind};
pub use launcher::{LaunchedProxy, Launcher};
pub use registry::ProxyRegistry;
pub use service::{CallHandler, PendingCall, ServiceProxy, ServiceProxyBuilder};
