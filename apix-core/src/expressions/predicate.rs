use std::cmp::Ordering;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(Self::Eq),
            "$neq" | "$ne" => Some(Self::Neq),
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }

    fn is_ordering(&self) -> bool {
        !matches!(self, Self::Eq | Self::Neq)
    }

    fn holds(&self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord.is_eq(),
            Self::Neq => ord.is_ne(),
            Self::Gt => ord.is_gt(),
            Self::Gte => ord.is_ge(),
            Self::Lt => ord.is_lt(),
            Self::Lte => ord.is_le(),
        }
    }
}

/// A scalar operand. Comparisons are only defined between literals of the same kind.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Literal {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    /// `None` for null, arrays, objects and integers outside the i64 range.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::String(s) => Some(Self::String(s.clone())),
            JsonValue::Bool(b) => Some(Self::Bool(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else if n.is_u64() {
                    None
                } else {
                    n.as_f64().map(Self::Float)
                }
            }
            JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    /// Same-kind ordering. A kind mismatch (including int vs float) has no ordering.
    pub fn compare(&self, other: &Literal) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Clause {
    pub field: String,
    pub op: CompareOp,
    pub literal: Literal,
}

impl Clause {
    fn holds(&self, body: &serde_json::Map<String, JsonValue>) -> bool {
        let Some(actual) = body.get(&self.field).and_then(Literal::from_json) else {
            return false;
        };
        // booleans only support equality
        if self.op.is_ordering() && matches!(actual, Literal::Bool(_)) {
            return false;
        }
        actual
            .compare(&self.literal)
            .map(|ord| self.op.holds(ord))
            .unwrap_or(false)
    }
}

impl std::fmt::Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.op.symbol(), self.literal)
    }
}

/// A conjunction of comparisons over top-level fields of a decoded JSON object.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Predicate {
    pub clauses: Vec<Clause>,
}

impl Predicate {
    /// False when the body is not an object or any clause fails.
    pub fn evaluate(&self, body: &JsonValue) -> bool {
        let Some(obj) = body.as_object() else {
            return false;
        };
        self.clauses.iter().all(|c| c.holds(obj))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredicateError {
    #[error("unknown comparison operator '{0}'")]
    UnknownOperator(String),
    #[error("operator '{0}' expects a map of field to literal")]
    ExpectedFieldMap(String),
    #[error("literal for field '{0}' must be a string, number or boolean")]
    NonScalarLiteral(String),
}

/// Parses a `test` map: `field: literal` means equality, `$op: {field: literal}`
/// applies the named comparison.
pub fn parse_predicate(test: &IndexMap<String, JsonValue>) -> Result<Predicate, PredicateError> {
    let mut clauses = Vec::new();
    for (key, value) in test {
        if !key.starts_with('$') {
            clauses.push(make_clause(key, CompareOp::Eq, value)?);
            continue;
        }

        let op = CompareOp::from_key(key)
            .ok_or_else(|| PredicateError::UnknownOperator(key.clone()))?;
        let fields = value
            .as_object()
            .ok_or_else(|| PredicateError::ExpectedFieldMap(key.clone()))?;
        for (field, literal) in fields {
            clauses.push(make_clause(field, op, literal)?);
        }
    }
    Ok(Predicate { clauses })
}

fn make_clause(field: &str, op: CompareOp, value: &JsonValue) -> Result<Clause, PredicateError> {
    let literal =
        Literal::from_json(value).ok_or_else(|| PredicateError::NonScalarLiteral(field.to_string()))?;
    Ok(Clause {
        field: field.to_string(),
        op,
        literal,
    })
}
