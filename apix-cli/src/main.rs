use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "apix", version, about = "apix API gateway runtime")]
struct Cli {
    /// Log filter, e.g. `debug` or `apix_proxy=trace`. Overrides RUST_LOG.
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    // launched backends are killed with their handles
    drop(rt);
    std::process::exit(exit_code);
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(l) => EnvFilter::try_new(l).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Validate { path, output } => cmd::validate::validate_cmd(&path, output).await,
        Command::Plan { path, output } => cmd::plan::plan_cmd(&path, output).await,
        Command::Endpoints { path, output } => {
            cmd::endpoints::endpoints_cmd(&path, output).await
        }
        Command::Invoke {
            path,
            method,
            url,
            params,
            gateway,
            output,
        } => {
            cmd::invoke::invoke_cmd(&path, &method, &url, params.as_deref(), gateway, output)
                .await
        }
        Command::Call {
            proxy,
            service,
            method,
            params,
            gateway,
            output,
        } => {
            cmd::call::call_cmd(
                &proxy,
                &service,
                &method,
                params.as_deref(),
                gateway,
                output,
            )
            .await
        }
    }
}
