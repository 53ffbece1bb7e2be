use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Dot,
}

pub fn print_result<T: Serialize>(format: OutputFormat, quiet: bool, result: &T) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(result) {
                println!("{json}");
            }
        }
        // DOT only exists for plans
        OutputFormat::Text | OutputFormat::Dot => {
            if let Ok(json) = serde_json::to_string_pretty(result) {
                println!("{json}");
            }
        }
    }
}

pub fn print_error(format: OutputFormat, quiet: bool, message: &str) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Json => {
            let err = serde_json::json!({"error": message});
            eprintln!("{}", serde_json::to_string(&err).unwrap_or_default());
        }
        OutputFormat::Text | OutputFormat::Dot => eprintln!("error: {message}"),
    }
}

/// Reply bodies are shown as JSON when they decode, as text otherwise.
pub fn body_value(body: &[u8]) -> serde_json::Value {
    if body.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(body).into_owned()))
}
