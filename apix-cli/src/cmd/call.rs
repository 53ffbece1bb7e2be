use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use apix_proxy::{Launcher, ProxyRegistry};
use serde::Serialize;

use crate::exit_codes;
use crate::output::{body_value, print_error, print_result, OutputFormat};
use crate::{GatewayArgs, OutputArgs};

#[derive(Serialize)]
struct CallResult<'a> {
    service: &'a str,
    method: &'a str,
    reply: serde_json::Value,
}

pub async fn call_cmd(
    proxy: &Path,
    service: &str,
    method: &str,
    params: Option<&str>,
    args: GatewayArgs,
    output: OutputArgs,
) -> i32 {
    let Some(config) = super::config::load_gateway_config(&args, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let params = params.unwrap_or("{}");
    if let Err(e) = serde_json::from_str::<serde_json::Value>(params) {
        print_error(output.format, output.quiet, &format!("--params is not valid JSON: {e}"));
        return exit_codes::RUNTIME_ERROR;
    }

    let registry = Arc::new(ProxyRegistry::new());
    let launcher = Launcher::new(config.proxy.clone(), Arc::clone(&registry));
    let launched = match launcher.launch(proxy) {
        Ok(l) => l,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let wait = Duration::from_millis(args.register_timeout_ms);
    if let Err(e) = launcher.wait_for_services(&[service.to_string()], wait).await {
        print_error(output.format, output.quiet, &e.to_string());
        launched.proxy.shutdown();
        return exit_codes::RUNTIME_ERROR;
    }

    let reply = registry
        .call_service(service, method, params.as_bytes().to_vec())
        .await;
    launched.proxy.shutdown();

    match reply {
        Ok(body) => {
            let result = CallResult {
                service,
                method,
                reply: body_value(&body),
            };
            if output.format == OutputFormat::Text && !output.quiet {
                if let Ok(pretty) = serde_json::to_string_pretty(&result.reply) {
                    println!("{pretty}");
                }
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_codes::RUN_FAILED
        }
    }
}
