use std::path::Path;

use apix_exec::GatewayConfig;

use crate::output::print_error;
use crate::{GatewayArgs, OutputArgs};

pub fn read_document(path: &Path, output: &OutputArgs) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(v) => Some(v),
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read {}: {e}", path.display()),
            );
            None
        }
    }
}

/// Config file values with command line overrides applied.
pub fn load_gateway_config(args: &GatewayArgs, output: &OutputArgs) -> Option<GatewayConfig> {
    let mut config = match &args.config {
        Some(path) => match GatewayConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                print_error(output.format, output.quiet, &e.to_string());
                return None;
            }
        },
        None => GatewayConfig::default(),
    };
    if let Some(dir) = &args.proxy_dir {
        config.proxy.proxy_dir = dir.clone();
    }
    if let Some(suffix) = &args.proxy_suffix {
        config.proxy.proxy_suffix = suffix.clone();
    }
    if let Some(ms) = args.call_timeout_ms {
        config.proxy.call_timeout_ms = ms;
    }
    if let Some(ms) = args.http_timeout_ms {
        config.http_timeout_ms = ms;
    }
    Some(config)
}

pub fn load_params(path: Option<&Path>, output: &OutputArgs) -> Option<serde_json::Value> {
    let Some(path) = path else {
        return Some(serde_json::json!({}));
    };
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to read params: {e}"));
            return None;
        }
    };
    if let Ok(v) = serde_json::from_str(&content) {
        return Some(v);
    }
    if let Ok(v) = serde_yaml::from_str(&content) {
        return Some(v);
    }
    print_error(output.format, output.quiet, "params file is neither valid JSON nor YAML");
    None
}
