use std::sync::Arc;

use apix_core::types::{DataType, MemberAttr, TypeExpr, BUILTIN_TYPES};
use indexmap::IndexMap;

use super::variable::{ArrayVar, ObjectVar, Scalar, Variable};
use super::{SchemaError, ValueError};

/// Named data types of one loaded document. Immutable once built; a reload
/// builds a new registry.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, Arc<DataType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_types<'a, I>(types: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a DataType>,
    {
        let mut registry = Self::new();
        for dt in types {
            registry.register(dt.clone())?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, dt: DataType) -> Result<(), SchemaError> {
        if dt.name.trim().is_empty() {
            return Err(SchemaError::MissingTypeName);
        }
        if BUILTIN_TYPES.contains(&dt.name.as_str()) {
            return Err(SchemaError::BuiltinRedefined(dt.name));
        }
        if self.types.contains_key(&dt.name) {
            return Err(SchemaError::DuplicateTypeName(dt.name));
        }
        if dt.members.keys().any(|k| k.trim().is_empty()) {
            return Err(SchemaError::MissingMemberName { type_name: dt.name });
        }
        self.types.insert(dt.name.clone(), Arc::new(dt));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<DataType>> {
        self.types.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// An empty variable for `type_name`, or for an array of it when `is_array`.
    pub fn create(&self, type_name: &str, is_array: bool) -> Result<Variable, ValueError> {
        let ty = if is_array {
            TypeExpr::array_of(type_name)
        } else {
            TypeExpr::named(type_name)
        };
        self.new_variable(&MemberAttr::new(ty))
    }

    /// An empty variable shaped by `attr`.
    pub fn new_variable(&self, attr: &MemberAttr) -> Result<Variable, ValueError> {
        match &attr.ty {
            TypeExpr::Named(name) => self.new_named(name, attr),
            TypeExpr::List(_) => {
                if attr.ty.is_nested_array() {
                    return Err(ValueError::NestedArrayUnsupported {
                        ty: attr.ty.to_string(),
                    });
                }
                let element = attr.ty.element().ok_or_else(|| ValueError::UnknownType(attr.ty.to_string()))?;
                let element = MemberAttr::new(element.clone());
                // fail on unknown element types before any value arrives
                self.new_variable(&element)?;
                Ok(Variable::Array(ArrayVar {
                    attr: attr.clone(),
                    element,
                    items: Vec::new(),
                }))
            }
        }
    }

    fn new_named(&self, name: &str, attr: &MemberAttr) -> Result<Variable, ValueError> {
        let attr = attr.clone();
        Ok(match name {
            "integer" => Variable::Int(Scalar::new(attr, 0)),
            "float" => Variable::Float(Scalar::new(attr, 0.0)),
            "boolean" => Variable::Bool(Scalar::new(attr, false)),
            "string" => Variable::String(Scalar::new(attr, String::new())),
            other => {
                let data_type = self
                    .get(other)
                    .cloned()
                    .ok_or_else(|| ValueError::UnknownType(other.to_string()))?;
                Variable::Object(ObjectVar {
                    attr,
                    data_type,
                    members: IndexMap::new(),
                })
            }
        })
    }
}
