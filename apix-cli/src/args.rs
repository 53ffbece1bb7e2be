use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// Runtime settings. Flags override values read from `--config`.
#[derive(Debug, Args, Clone)]
pub struct GatewayArgs {
    /// YAML or JSON gateway config file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory scanned for backend executables.
    #[arg(long)]
    pub proxy_dir: Option<PathBuf>,
    #[arg(long)]
    pub proxy_suffix: Option<String>,
    /// Deadline for backend calls in milliseconds, 0 waits forever.
    #[arg(long)]
    pub call_timeout_ms: Option<u64>,
    #[arg(long)]
    pub http_timeout_ms: Option<u64>,
    /// How long to wait for backends to register their services.
    #[arg(long, default_value_t = 5000)]
    pub register_timeout_ms: u64,
}
