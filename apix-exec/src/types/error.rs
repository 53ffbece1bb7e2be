/// Request-time failures while building or validating a [`Variable`](super::Variable).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("required field '{field}' is missing")]
    RequiredFieldMissing { field: String },
    #[error("required value is empty")]
    RequiredValueEmpty,
    #[error("length must be exactly {expected}, got {actual}")]
    LengthConstraintViolated { expected: usize, actual: usize },
    #[error("length {actual} is below the minimum of {min}")]
    MinLength { min: usize, actual: usize },
    #[error("length {actual} exceeds the maximum of {max}")]
    MaxLength { max: usize, actual: usize },
    #[error("cannot convert {found} to {expected}")]
    TypeConversionFailed { expected: String, found: String },
    #[error("expected an array, found {found}")]
    InvalidArrayShape { found: String },
    #[error("nested arrays are not supported ({ty})")]
    NestedArrayUnsupported { ty: String },
    #[error("a nil variable cannot hold a value")]
    NilCannotSetValue,
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("{path}: {source}")]
    InField {
        path: String,
        #[source]
        source: Box<ValueError>,
    },
}

impl ValueError {
    /// Prefixes the error with one more path segment: a member name or `[idx]`.
    pub fn in_field(self, segment: &str) -> Self {
        match self {
            Self::InField { path, source } => {
                let path = if path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                Self::InField { path, source }
            }
            other => Self::InField {
                path: segment.to_string(),
                source: Box::new(other),
            },
        }
    }

    pub fn in_index(self, idx: usize) -> Self {
        self.in_field(&format!("[{idx}]"))
    }

    /// The error without its path wrapper.
    pub fn root_cause(&self) -> &ValueError {
        match self {
            Self::InField { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Self::InField { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Load-time failures while building the [`TypeRegistry`](super::TypeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("type name is missing")]
    MissingTypeName,
    #[error("duplicate type name '{0}'")]
    DuplicateTypeName(String),
    #[error("type '{0}' redefines a builtin type")]
    BuiltinRedefined(String),
    #[error("type '{type_name}' has a member with an empty name")]
    MissingMemberName { type_name: String },
}
