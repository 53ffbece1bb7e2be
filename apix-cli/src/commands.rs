use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse and validate an api document.
    Validate {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the endpoints, parameters and forward graphs of a document.
    Plan {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Compile a document and list the routes it serves.
    Endpoints {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run one request through a document, launching backends as needed.
    Invoke {
        path: PathBuf,
        #[arg(long, default_value = "GET")]
        method: String,
        #[arg(long)]
        url: String,
        /// JSON or YAML file keyed by parameter group (body, path, header, queries).
        #[arg(long)]
        params: Option<PathBuf>,
        #[command(flatten)]
        gateway: GatewayArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Launch one backend executable and call a service on it.
    Call {
        #[arg(long)]
        proxy: PathBuf,
        #[arg(long)]
        service: String,
        #[arg(long, default_value = "")]
        method: String,
        /// Call parameters as a JSON string.
        #[arg(long)]
        params: Option<String>,
        #[command(flatten)]
        gateway: GatewayArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}
