use serde::de::DeserializeOwned;

use crate::error::ParseError;
use crate::types::ApiDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: ApiDocument,
    pub format: DocumentFormat,
}

pub fn parse_document_str(input: &str, format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let (document, format) = parse_str::<ApiDocument>(input, format)?;
    Ok(ParsedDocument { document, format })
}

/// Parses any serde type from JSON or YAML text. Returns the format that succeeded.
pub fn parse_str<T: DeserializeOwned>(
    input: &str,
    format: DocumentFormat,
) -> Result<(T, DocumentFormat), ParseError> {
    match format {
        DocumentFormat::Json => Ok((serde_json::from_str(input)?, DocumentFormat::Json)),
        DocumentFormat::Yaml => Ok((serde_yaml::from_str(input)?, DocumentFormat::Yaml)),
        DocumentFormat::Auto => parse_auto(input),
    }
}

fn parse_auto<T: DeserializeOwned>(input: &str) -> Result<(T, DocumentFormat), ParseError> {
    // JSON documents always open with a brace or bracket.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str(input) {
            Ok(v) => Ok((v, DocumentFormat::Json)),
            Err(json_err) => serde_yaml::from_str(input)
                .map(|v| (v, DocumentFormat::Yaml))
                .map_err(|_| ParseError::Json(json_err)),
        };
    }

    match serde_yaml::from_str(input) {
        Ok(v) => Ok((v, DocumentFormat::Yaml)),
        Err(yaml_err) => serde_json::from_str(input)
            .map(|v| (v, DocumentFormat::Json))
            .map_err(|_| ParseError::Yaml(yaml_err)),
    }
}
