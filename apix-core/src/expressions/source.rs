//! Source expressions map one outbound field of a forward node to request
//! parameters or to fields of an earlier node's decoded result.
//!
//! Grammar: `ref ( "|" ref )* [ "|" format ]`, where a `ref` is `field` or
//! `node.field`. With a single part there is no format and the referenced
//! value is used as is. With several parts the last one is a printf-style
//! format receiving the referenced values positionally.

use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldRef {
    Param { field: String },
    Node { node: String, field: String },
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Param { field } => f.write_str(field),
            Self::Node { node, field } => write!(f, "{node}.{field}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FormatSegment {
    Literal(String),
    Placeholder(char),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FormatString {
    pub raw: String,
    #[serde(skip)]
    pub segments: Vec<FormatSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceExpr {
    pub refs: Vec<FieldRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatString>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceExprError {
    #[error("source expression is empty")]
    Empty,
    #[error("field reference #{0} is empty")]
    EmptyReference(usize),
    #[error("invalid field reference '{0}' (expected `field` or `node.field`)")]
    InvalidReference(String),
    #[error("unsupported format verb '%{0}'")]
    UnsupportedVerb(char),
    #[error("format string ends with a lone '%'")]
    TrailingPercent,
    #[error("format has {placeholders} placeholders but {refs} field references")]
    ArityMismatch { placeholders: usize, refs: usize },
}

pub fn parse_source_expr(input: &str) -> Result<SourceExpr, SourceExprError> {
    if input.trim().is_empty() {
        return Err(SourceExprError::Empty);
    }

    let parts: Vec<&str> = input.split('|').collect();
    let (ref_parts, format) = match parts.split_last() {
        Some((last, rest)) if !rest.is_empty() => (rest, Some(parse_format(last)?)),
        _ => (parts.as_slice(), None),
    };

    let refs = ref_parts
        .iter()
        .enumerate()
        .map(|(idx, part)| parse_field_ref(idx, part))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(fmt) = &format {
        let placeholders = fmt.placeholder_count();
        if placeholders != refs.len() {
            return Err(SourceExprError::ArityMismatch {
                placeholders,
                refs: refs.len(),
            });
        }
    }

    Ok(SourceExpr { refs, format })
}

fn parse_field_ref(idx: usize, part: &str) -> Result<FieldRef, SourceExprError> {
    let part = part.trim();
    if part.is_empty() {
        return Err(SourceExprError::EmptyReference(idx));
    }
    match part.split_once('.') {
        None => Ok(FieldRef::Param {
            field: part.to_string(),
        }),
        Some((node, field)) if !node.is_empty() && !field.is_empty() && !field.contains('.') => {
            Ok(FieldRef::Node {
                node: node.to_string(),
                field: field.to_string(),
            })
        }
        Some(_) => Err(SourceExprError::InvalidReference(part.to_string())),
    }
}

fn parse_format(input: &str) -> Result<FormatString, SourceExprError> {
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            buf.push(ch);
            continue;
        }
        match chars.next() {
            None => return Err(SourceExprError::TrailingPercent),
            Some('%') => buf.push('%'),
            Some(verb @ ('s' | 'v' | 'd' | 'f')) => {
                if !buf.is_empty() {
                    segments.push(FormatSegment::Literal(std::mem::take(&mut buf)));
                }
                segments.push(FormatSegment::Placeholder(verb));
            }
            Some(other) => return Err(SourceExprError::UnsupportedVerb(other)),
        }
    }

    if !buf.is_empty() {
        segments.push(FormatSegment::Literal(buf));
    }

    Ok(FormatString {
        raw: input.to_string(),
        segments,
    })
}

impl FormatString {
    pub fn placeholder_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, FormatSegment::Placeholder(_)))
            .count()
    }

    /// Substitutes `values` into the placeholders in order. Missing values
    /// render as empty text.
    pub fn render(&self, values: &[JsonValue]) -> String {
        let mut out = String::new();
        let mut args = values.iter();
        for seg in &self.segments {
            match seg {
                FormatSegment::Literal(lit) => out.push_str(lit),
                FormatSegment::Placeholder(verb) => {
                    if let Some(v) = args.next() {
                        out.push_str(&render_value(*verb, v));
                    }
                }
            }
        }
        out
    }
}

fn render_value(verb: char, value: &JsonValue) -> String {
    match (verb, value) {
        (_, JsonValue::String(s)) => s.clone(),
        ('d', JsonValue::Number(n)) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(|f| (f.trunc() as i64).to_string()).unwrap_or_default(),
        },
        ('f', JsonValue::Number(n)) => n.as_f64().map(|f| format!("{f:.6}")).unwrap_or_default(),
        (_, other) => other.to_string(),
    }
}

impl SourceExpr {
    /// Combines the values resolved for `refs` (same order) into the outbound value.
    pub fn combine(&self, mut values: Vec<JsonValue>) -> JsonValue {
        match &self.format {
            Some(fmt) => JsonValue::String(fmt.render(&values)),
            None => values.pop().unwrap_or(JsonValue::Null),
        }
    }

    pub fn node_refs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.refs.iter().filter_map(|r| match r {
            FieldRef::Node { node, field } => Some((node.as_str(), field.as_str())),
            FieldRef::Param { .. } => None,
        })
    }

    pub fn param_refs(&self) -> impl Iterator<Item = &str> {
        self.refs.iter().filter_map(|r| match r {
            FieldRef::Param { field } => Some(field.as_str()),
            FieldRef::Node { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_reference_has_no_format() {
        let expr = parse_source_expr("token").unwrap();
        assert_eq!(
            expr.refs,
            vec![FieldRef::Param {
                field: "token".to_string()
            }]
        );
        assert!(expr.format.is_none());
        assert_eq!(expr.combine(vec![json!(12)]), json!(12));
    }

    #[test]
    fn trailing_part_is_the_format() {
        let expr = parse_source_expr("token|pl.%s").unwrap();
        assert_eq!(expr.refs.len(), 1);
        assert_eq!(expr.combine(vec![json!("abc")]), json!("pl.abc"));
    }

    #[test]
    fn node_references_split_on_first_dot() {
        let expr = parse_source_expr("user.id|name|%s-%s").unwrap();
        assert_eq!(
            expr.refs[0],
            FieldRef::Node {
                node: "user".to_string(),
                field: "id".to_string()
            }
        );
        assert_eq!(expr.node_refs().collect::<Vec<_>>(), vec![("user", "id")]);
        assert_eq!(expr.param_refs().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(
            expr.combine(vec![json!(7), json!("bob")]),
            json!("7-bob")
        );
    }

    #[test]
    fn format_verbs_render_numbers() {
        let expr = parse_source_expr("a|b|%d/%f 100%%").unwrap();
        assert_eq!(
            expr.combine(vec![json!(3), json!(1.5)]),
            json!("3/1.500000 100%")
        );
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        assert_eq!(
            parse_source_expr("a|b|%s").unwrap_err(),
            SourceExprError::ArityMismatch {
                placeholders: 1,
                refs: 2
            }
        );
    }

    #[test]
    fn malformed_references_are_rejected() {
        assert!(matches!(
            parse_source_expr("a.b.c"),
            Err(SourceExprError::InvalidReference(_))
        ));
        assert!(matches!(
            parse_source_expr(".b"),
            Err(SourceExprError::InvalidReference(_))
        ));
        assert_eq!(parse_source_expr("  "), Err(SourceExprError::Empty));
        assert_eq!(
            parse_source_expr("a|%x"),
            Err(SourceExprError::UnsupportedVerb('x'))
        );
    }
}
