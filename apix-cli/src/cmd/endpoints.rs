use std::path::Path;

use apix_exec::ApiCode;
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

#[derive(Serialize)]
struct EndpointRow {
    method: String,
    url: String,
    params: usize,
    forwards: Vec<String>,
}

pub async fn endpoints_cmd(path: &Path, output: OutputArgs) -> i32 {
    let Some(content) = super::config::read_document(path, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };

    let code = match ApiCode::parse(&content) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let rows: Vec<EndpointRow> = code
        .endpoints
        .iter()
        .map(|ep| EndpointRow {
            method: ep.method.to_string(),
            url: ep.url.clone(),
            params: ep.binder.groups().iter().map(|(_, g)| g.len()).sum(),
            forwards: ep.chain.nodes().iter().map(|n| n.name.clone()).collect(),
        })
        .collect();

    if output.format == OutputFormat::Text && !output.quiet {
        for row in &rows {
            println!("{:<7} {}  [{}]", row.method, row.url, row.forwards.join(", "));
        }
    } else {
        print_result(output.format, output.quiet, &rows);
    }
    exit_codes::SUCCESS
}
