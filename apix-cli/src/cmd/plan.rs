use std::path::Path;

use apix_core::planner::format_mapping;
use apix_core::{plan_from_str, DocumentFormat, PlanningOutcome};

use crate::exit_codes;
use crate::output::{print_error, OutputFormat};
use crate::OutputArgs;

pub async fn plan_cmd(path: &Path, output: OutputArgs) -> i32 {
    let Some(content) = super::config::read_document(path, &output) else {
        return exit_codes::RUNTIME_ERROR;
    };

    let outcome = match plan_from_str(&content, DocumentFormat::Auto) {
        Ok(o) => o,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };

    match output.format {
        OutputFormat::Json => print_json(&outcome, output.quiet),
        OutputFormat::Text => print_text(&outcome, output.quiet),
        OutputFormat::Dot => print_dot(&outcome, output.quiet),
    }
}

fn outcome_code(outcome: &PlanningOutcome) -> i32 {
    if outcome.validation.is_valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_FAILED
    }
}

fn print_json(outcome: &PlanningOutcome, quiet: bool) -> i32 {
    if quiet {
        return outcome_code(outcome);
    }
    match serde_json::to_string_pretty(outcome) {
        Ok(s) => {
            println!("{s}");
            outcome_code(outcome)
        }
        Err(e) => {
            eprintln!("error: failed to serialize plan as JSON: {e}");
            exit_codes::RUNTIME_ERROR
        }
    }
}

fn print_text(outcome: &PlanningOutcome, quiet: bool) -> i32 {
    if quiet {
        return outcome_code(outcome);
    }

    if outcome.validation.is_valid {
        println!("validation: valid");
    } else {
        println!("validation: invalid");
        println!("errors: {}", outcome.validation.errors.len());
        for e in &outcome.validation.errors {
            println!("- {e}");
        }
        return exit_codes::VALIDATION_FAILED;
    }
    for w in &outcome.validation.warnings {
        println!("warning: {w}");
    }

    let Some(plan) = &outcome.plan else {
        return exit_codes::VALIDATION_FAILED;
    };
    println!(
        "version: {}  endpoints: {}  forwards: {}",
        plan.summary.version, plan.summary.endpoint_count, plan.summary.forward_count
    );

    for ep in &plan.endpoints {
        println!("\n{}", ep.label());
        for p in &ep.params {
            let required = if p.required { " (required)" } else { "" };
            println!("  param {}.{}: {}{required}", p.source, p.name, p.r#type);
        }
        for (idx, level) in ep.graph.levels.iter().enumerate() {
            if !level.is_empty() {
                println!("  level {idx}: {}", level.join(", "));
            }
        }
        for f in &ep.forwards {
            let target = format!("{:?}", f.target).to_lowercase();
            println!("  - forward: {} ({target} -> {})", f.name, f.service);
            if !f.depends_on.is_empty() {
                println!("    deps: {}", f.depends_on.join(", "));
            }
            for line in format_mapping(&f.mapping) {
                println!("    {line}");
            }
            if !f.test.is_empty() {
                println!("    test: {}", f.test.join(" && "));
                println!("    onfail: {}", f.on_fail);
            }
        }
    }

    exit_codes::SUCCESS
}

fn print_dot(outcome: &PlanningOutcome, quiet: bool) -> i32 {
    if quiet {
        return outcome_code(outcome);
    }

    if !outcome.validation.is_valid {
        eprintln!("error: cannot generate DOT graph for invalid document");
        return exit_codes::VALIDATION_FAILED;
    }

    let Some(plan) = &outcome.plan else {
        eprintln!("error: no plan available");
        return exit_codes::VALIDATION_FAILED;
    };

    for ep in &plan.endpoints {
        println!("{}", ep.graph.to_dot(&ep.label()));
    }
    exit_codes::SUCCESS
}
