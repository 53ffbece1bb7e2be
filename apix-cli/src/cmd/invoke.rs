use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use apix_core::types::HttpMethod;
use apix_exec::{BufferedResponse, CompiledTarget, Gateway, JsonParamReader, ServiceForwarder};
use apix_proxy::{LaunchedProxy, Launcher, ProxyRegistry};
use serde::Serialize;
use tracing::info;

use crate::exit_codes;
use crate::output::{body_value, print_error, print_result, OutputFormat};
use crate::{GatewayArgs, OutputArgs};

#[derive(Serialize)]
struct InvokeResult {
    status: u16,
    content_type: String,
    body: serde_json::Value,
}

pub async fn invoke_cmd(
    path: &Path,
    method: &str,
    url: &str,
    params_path: Option<&Path>,
    args: GatewayArgs,
    output: OutputArgs,
) -> i32 {
    let Some(config) = super::config::load_gateway_config(&args, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let Some(content) = super::config::read_document(path, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let method: HttpMethod = match method.parse() {
        Ok(m) => m,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };
    let Some(params) = super::config::load_params(params_path, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let reader = match JsonParamReader::from_json(params) {
        Ok(r) => r,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let registry = Arc::new(ProxyRegistry::new());
    let forwarder = match ServiceForwarder::new(Arc::clone(&registry), config.http_timeout()) {
        Ok(f) => f,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("cannot build http client: {e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    };
    let gateway = Gateway::new(Arc::new(forwarder));
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "api".to_string());
    if let Err(e) = gateway.add_api_doc(&name, &content) {
        print_error(output.format, output.quiet, &e.to_string());
        return exit_codes::VALIDATION_FAILED;
    }

    let services = required_services(&gateway, method, url);
    let launched = if services.is_empty() {
        Vec::new()
    } else {
        let launcher = Launcher::new(config.proxy.clone(), Arc::clone(&registry));
        let launched = match launcher.launch_all() {
            Ok(l) => l,
            Err(e) => {
                print_error(output.format, output.quiet, &e.to_string());
                return exit_codes::RUNTIME_ERROR;
            }
        };
        let wait = Duration::from_millis(args.register_timeout_ms);
        if let Err(e) = launcher.wait_for_services(&services, wait).await {
            print_error(output.format, output.quiet, &e.to_string());
            shutdown(&launched);
            return exit_codes::RUNTIME_ERROR;
        }
        info!(backends = launched.len(), services = ?services, "backends ready");
        launched
    };

    let mut resp = BufferedResponse::new();
    let status = gateway.handle(method, url, &reader, &mut resp).await;
    shutdown(&launched);

    let result = InvokeResult {
        status,
        content_type: resp.content_type.clone(),
        body: body_value(&resp.body),
    };
    if output.format == OutputFormat::Text && !output.quiet {
        println!("status: {status}");
        if !result.body.is_null() {
            if let Ok(pretty) = serde_json::to_string_pretty(&result.body) {
                println!("{pretty}");
            }
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    if resp.is_success() {
        exit_codes::SUCCESS
    } else {
        exit_codes::RUN_FAILED
    }
}

/// Services the matched endpoint reaches through backend proxies.
fn required_services(gateway: &Gateway, method: HttpMethod, url: &str) -> Vec<String> {
    let Some((code, idx)) = gateway.find(method, url) else {
        return Vec::new();
    };
    let Some(endpoint) = code.endpoints.get(idx) else {
        return Vec::new();
    };
    let mut services: Vec<String> = endpoint
        .chain
        .nodes()
        .iter()
        .filter(|n| !matches!(n.target, CompiledTarget::Http { .. }))
        .map(|n| n.service.clone())
        .collect();
    services.sort();
    services.dedup();
    services
}

fn shutdown(launched: &[LaunchedProxy]) {
    for l in launched {
        l.proxy.shutdown();
    }
}
