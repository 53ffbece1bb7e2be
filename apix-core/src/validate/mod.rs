mod rules;
mod validator;

use crate::error::{ValidationError, Violation};
use crate::types::ApiDocument;
use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for ApiDocument {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_document(self)
    }
}

/// Checks every schema rule and reports all violations at once.
pub fn validate_document(doc: &ApiDocument) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_document(doc);
    v.finish()
}

/// Non-fatal authoring hazards. The document still installs.
pub fn lint_document(doc: &ApiDocument) -> Vec<Violation> {
    rules::lint::lint_document(doc)
}
