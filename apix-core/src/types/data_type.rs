use indexmap::IndexMap;

/// Scalar type names every document can reference without declaring them.
pub const BUILTIN_TYPES: [&str; 4] = ["integer", "float", "boolean", "string"];

/// A member's declared type: a type name, or `[T]` for an array of `T`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    Named(String),
    List(Vec<TypeExpr>),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn array_of(name: impl Into<String>) -> Self {
        Self::List(vec![Self::Named(name.into())])
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// The wrapped element type of `[T]`. `None` for names and for malformed
    /// lists that do not hold exactly one entry.
    pub fn element(&self) -> Option<&TypeExpr> {
        match self {
            Self::List(items) if items.len() == 1 => items.first(),
            _ => None,
        }
    }

    /// The innermost type name, looking through any number of array wrappers.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name.as_str()),
            Self::List(_) => self.element().and_then(TypeExpr::base_name),
        }
    }

    pub fn is_nested_array(&self) -> bool {
        self.element().is_some_and(TypeExpr::is_array)
    }
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemberAttr {
    #[serde(rename = "type")]
    pub ty: TypeExpr,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Exact element/character count. Only meaningful for strings and arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "minLength")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "maxLength")]
    pub max_length: Option<usize>,
}

impl MemberAttr {
    pub fn new(ty: TypeExpr) -> Self {
        Self {
            ty,
            required: false,
            description: None,
            length: None,
            min_length: None,
            max_length: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn has_length_constraints(&self) -> bool {
        self.length.is_some() || self.min_length.is_some() || self.max_length.is_some()
    }
}

/// A named composite shape. Members keep their declaration order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DataType {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub members: IndexMap<String, MemberAttr>,
}
