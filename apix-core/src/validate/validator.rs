use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ValidationError, Violation};
use crate::types::{ApiDocument, BUILTIN_TYPES};

use super::rules;

pub(crate) static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid"));
pub(crate) static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-5][0-9][0-9]$").expect("valid"));

pub struct Validator {
    violations: Vec<Violation>,
    known_types: HashSet<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
            known_types: BUILTIN_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }

    pub fn validate_document(&mut self, doc: &ApiDocument) {
        self.known_types
            .extend(doc.types.iter().filter(|t| !t.name.is_empty()).map(|t| t.name.clone()));
        rules::document::validate_document(self, doc);
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    pub(crate) fn is_known_type(&self, name: &str) -> bool {
        self.known_types.contains(name)
    }
}
