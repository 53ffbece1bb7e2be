use std::path::Path;

use apix_core::{lint_document, parse_document_str, DocumentFormat, Validate};
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    format: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

pub async fn validate_cmd(path: &Path, output: OutputArgs) -> i32 {
    let Some(content) = super::config::read_document(path, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };

    let parsed = match parse_document_str(&content, DocumentFormat::Auto) {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let warnings: Vec<String> = lint_document(&parsed.document)
        .iter()
        .map(ToString::to_string)
        .collect();

    match parsed.document.validate() {
        Ok(()) => {
            let result = ValidateResult {
                valid: true,
                format: format!("{:?}", parsed.format),
                errors: vec![],
                warnings: warnings.clone(),
            };
            if output.format == OutputFormat::Text && !output.quiet {
                println!("ok: valid api document ({:?})", parsed.format);
                for w in &warnings {
                    println!("warning: {w}");
                }
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::SUCCESS
        }
        Err(err) => {
            let errors = err.lines();
            let result = ValidateResult {
                valid: false,
                format: format!("{:?}", parsed.format),
                errors: errors.clone(),
                warnings,
            };
            if output.format == OutputFormat::Text && !output.quiet {
                eprintln!("error: validation failed");
                for e in &errors {
                    eprintln!("- {e}");
                }
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::VALIDATION_FAILED
        }
    }
}
