use std::sync::Arc;

use apix_core::types::{DataType, MemberAttr};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde_json::Value as JsonValue;

use super::convert::{kind_name, to_bool, to_float, to_int, to_string};
use super::{TypeRegistry, ValueError};

#[derive(Debug, Clone, PartialEq)]
pub struct Scalar<T> {
    pub attr: MemberAttr,
    pub value: T,
}

impl<T> Scalar<T> {
    pub fn new(attr: MemberAttr, value: T) -> Self {
        Self { attr, value }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayVar {
    pub attr: MemberAttr,
    /// Shape every element is built from.
    pub element: MemberAttr,
    pub items: Vec<Variable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectVar {
    pub attr: MemberAttr,
    pub data_type: Arc<DataType>,
    /// Present members only. Absent optional members are left out.
    pub members: IndexMap<String, Variable>,
}

/// A typed runtime value built from a schema and raw request data.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    Int(Scalar<i64>),
    Float(Scalar<f64>),
    Bool(Scalar<bool>),
    String(Scalar<String>),
    Array(ArrayVar),
    Object(ObjectVar),
    /// Read-only placeholder for endpoints without parameters.
    Nil,
}

impl Variable {
    pub fn attr(&self) -> Option<&MemberAttr> {
        match self {
            Self::Int(s) => Some(&s.attr),
            Self::Float(s) => Some(&s.attr),
            Self::Bool(s) => Some(&s.attr),
            Self::String(s) => Some(&s.attr),
            Self::Array(a) => Some(&a.attr),
            Self::Object(o) => Some(&o.attr),
            Self::Nil => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Fills the variable from `raw`. Composite variants build their children
    /// through `registry`.
    pub fn set_value(&mut self, registry: &TypeRegistry, raw: &JsonValue) -> Result<(), ValueError> {
        match self {
            Self::Int(s) => s.value = to_int(raw)?,
            Self::Float(s) => s.value = to_float(raw)?,
            Self::Bool(s) => s.value = to_bool(raw)?,
            Self::String(s) => s.value = to_string(raw)?,
            Self::Array(a) => a.set_value(registry, raw)?,
            Self::Object(o) => o.set_value(registry, raw)?,
            Self::Nil => return Err(ValueError::NilCannotSetValue),
        }
        Ok(())
    }

    /// Checks declared constraints. Objects stop at the first failing member,
    /// in declaration order.
    pub fn validate(&self) -> Result<(), ValueError> {
        match self {
            // numeric and boolean members carry no constraints
            Self::Int(_) | Self::Float(_) | Self::Bool(_) | Self::Nil => Ok(()),
            Self::String(s) => check_length(&s.attr, s.value.chars().count()),
            Self::Array(a) => {
                check_length(&a.attr, a.items.len())?;
                for (idx, item) in a.items.iter().enumerate() {
                    item.validate().map_err(|e| e.in_index(idx))?;
                }
                Ok(())
            }
            Self::Object(o) => {
                for name in o.data_type.members.keys() {
                    if let Some(child) = o.members.get(name) {
                        child.validate().map_err(|e| e.in_field(name))?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Generic JSON tree of the value, used as outbound call parameters.
    pub fn to_value(&self) -> JsonValue {
        match self {
            Self::Int(s) => JsonValue::from(s.value),
            Self::Float(s) => serde_json::Number::from_f64(s.value)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Bool(s) => JsonValue::Bool(s.value),
            Self::String(s) => JsonValue::String(s.value.clone()),
            Self::Array(a) => JsonValue::Array(a.items.iter().map(Variable::to_value).collect()),
            Self::Object(o) => JsonValue::Object(
                o.members
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
            Self::Nil => JsonValue::Null,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ArrayVar {
    fn set_value(&mut self, registry: &TypeRegistry, raw: &JsonValue) -> Result<(), ValueError> {
        let JsonValue::Array(raw_items) = raw else {
            return Err(ValueError::InvalidArrayShape {
                found: kind_name(raw).to_string(),
            });
        };
        let mut items = Vec::with_capacity(raw_items.len());
        for (idx, raw_item) in raw_items.iter().enumerate() {
            let mut item = registry
                .new_variable(&self.element)
                .map_err(|e| e.in_index(idx))?;
            item.set_value(registry, raw_item)
                .map_err(|e| e.in_index(idx))?;
            items.push(item);
        }
        self.items = items;
        Ok(())
    }
}

impl ObjectVar {
    fn set_value(&mut self, registry: &TypeRegistry, raw: &JsonValue) -> Result<(), ValueError> {
        let JsonValue::Object(fields) = raw else {
            return Err(ValueError::TypeConversionFailed {
                expected: self.data_type.name.clone(),
                found: kind_name(raw).to_string(),
            });
        };
        let mut members = IndexMap::with_capacity(self.data_type.members.len());
        for (name, attr) in &self.data_type.members {
            match fields.get(name).filter(|v| !v.is_null()) {
                None if attr.required => {
                    return Err(ValueError::RequiredFieldMissing {
                        field: name.clone(),
                    })
                }
                None => {}
                Some(raw_child) => {
                    let mut child = registry
                        .new_variable(attr)
                        .map_err(|e| e.in_field(name))?;
                    child
                        .set_value(registry, raw_child)
                        .map_err(|e| e.in_field(name))?;
                    members.insert(name.clone(), child);
                }
            }
        }
        self.members = members;
        Ok(())
    }
}

fn check_length(attr: &MemberAttr, len: usize) -> Result<(), ValueError> {
    if attr.required && len == 0 {
        return Err(ValueError::RequiredValueEmpty);
    }
    if let Some(expected) = attr.length {
        if len != expected {
            return Err(ValueError::LengthConstraintViolated {
                expected,
                actual: len,
            });
        }
    }
    if let Some(min) = attr.min_length {
        if len < min {
            return Err(ValueError::MinLength { min, actual: len });
        }
    }
    if let Some(max) = attr.max_length {
        if len > max {
            return Err(ValueError::MaxLength { max, actual: len });
        }
    }
    Ok(())
}

impl serde::Serialize for Variable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(s) => serializer.serialize_i64(s.value),
            Self::Float(s) if s.value.is_finite() => serializer.serialize_f64(s.value),
            Self::Float(_) | Self::Nil => serializer.serialize_unit(),
            Self::Bool(s) => serializer.serialize_bool(s.value),
            Self::String(s) => serializer.serialize_str(&s.value),
            Self::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.items.len()))?;
                for item in &a.items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(o) => {
                let mut map = serializer.serialize_map(Some(o.members.len()))?;
                for (k, v) in &o.members {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apix_core::types::TypeExpr;
    use serde_json::json;

    fn registry() -> TypeRegistry {
        let doc: apix_core::ApiDocument = serde_yaml::from_str(
            r#"
version: 1.0.0
baseUrl: /
types:
  - name: Item
    members:
      sku: {type: string, required: true}
      qty: {type: integer}
  - name: Order
    members:
      id: {type: integer, required: true}
      note: {type: string, maxLength: 4}
      items: {type: [Item], minLength: 1}
apis: []
"#,
        )
        .unwrap();
        TypeRegistry::from_types(&doc.types).unwrap()
    }

    fn string_var(attr: MemberAttr) -> Variable {
        TypeRegistry::new().new_variable(&attr).unwrap()
    }

    #[test]
    fn string_min_length_is_enforced() {
        let reg = TypeRegistry::new();
        let attr = MemberAttr::new(TypeExpr::named("string"))
            .required()
            .with_min_length(6);
        let mut v = string_var(attr);

        v.set_value(&reg, &json!("")).unwrap();
        assert_eq!(v.validate(), Err(ValueError::RequiredValueEmpty));
        v.set_value(&reg, &json!("short")).unwrap();
        assert_eq!(
            v.validate(),
            Err(ValueError::MinLength { min: 6, actual: 5 })
        );
        v.set_value(&reg, &json!("longenough")).unwrap();
        assert!(v.validate().is_ok());
    }

    #[test]
    fn numbers_serialize_as_literals() {
        let reg = TypeRegistry::new();
        let mut i = reg.create("integer", false).unwrap();
        i.set_value(&reg, &json!(42)).unwrap();
        assert_eq!(i.to_json().unwrap(), "42");

        let mut f = reg.create("float", false).unwrap();
        f.set_value(&reg, &json!(3.5)).unwrap();
        let back: f64 = serde_json::from_str(&f.to_json().unwrap()).unwrap();
        assert_eq!(back, 3.5);
    }

    #[test]
    fn strings_are_escaped() {
        let reg = TypeRegistry::new();
        let mut s = reg.create("string", false).unwrap();
        s.set_value(&reg, &json!("say \"hi\"\\\n")).unwrap();
        assert_eq!(s.to_json().unwrap(), r#""say \"hi\"\\\n""#);
    }

    #[test]
    fn objects_are_sparse_and_ordered() {
        let reg = registry();
        let mut order = reg.create("Order", false).unwrap();
        order
            .set_value(&reg, &json!({"items": [{"sku": "a"}], "id": "9"}))
            .unwrap();
        assert!(order.validate().is_ok());
        assert_eq!(
            order.to_json().unwrap(),
            r#"{"id":9,"items":[{"sku":"a"}]}"#
        );
        assert_eq!(
            order.to_value(),
            json!({"items": [{"sku": "a"}], "id": 9})
        );
    }

    #[test]
    fn missing_required_member_fails_on_set() {
        let reg = registry();
        let mut order = reg.create("Order", false).unwrap();
        let err = order
            .set_value(&reg, &json!({"id": 1, "items": [{"qty": 2}]}))
            .unwrap_err();
        assert_eq!(err.path(), Some("items[0]"));
        assert_eq!(
            err.root_cause(),
            &ValueError::RequiredFieldMissing {
                field: "sku".to_string()
            }
        );
    }

    #[test]
    fn array_length_and_element_conversion() {
        let reg = TypeRegistry::new();
        let attr = MemberAttr::new(TypeExpr::array_of("integer")).with_length(3);
        let mut arr = reg.new_variable(&attr).unwrap();

        arr.set_value(&reg, &json!([1, 2])).unwrap();
        assert_eq!(
            arr.validate(),
            Err(ValueError::LengthConstraintViolated {
                expected: 3,
                actual: 2
            })
        );

        let err = arr.set_value(&reg, &json!([1, "x", 3])).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ValueError::TypeConversionFailed { .. }
        ));
        assert_eq!(err.path(), Some("[1]"));

        assert!(matches!(
            arr.set_value(&reg, &json!({"a": 1})),
            Err(ValueError::InvalidArrayShape { .. })
        ));
    }

    #[test]
    fn validation_reports_first_member_in_declared_order() {
        let reg = registry();
        let mut order = reg.create("Order", false).unwrap();
        order
            .set_value(&reg, &json!({"items": [], "note": "too long", "id": 1}))
            .unwrap();
        let err = order.validate().unwrap_err();
        assert_eq!(err.path(), Some("note"));
    }

    #[test]
    fn nil_is_read_only() {
        let reg = TypeRegistry::new();
        let mut nil = Variable::Nil;
        assert!(nil.validate().is_ok());
        assert_eq!(nil.to_json().unwrap(), "null");
        assert_eq!(
            nil.set_value(&reg, &json!(1)),
            Err(ValueError::NilCannotSetValue)
        );
    }

    #[test]
    fn object_rejects_scalar_input() {
        let reg = registry();
        let mut order = reg.create("Order", false).unwrap();
        assert!(matches!(
            order.set_value(&reg, &json!(5)),
            Err(ValueError::TypeConversionFailed { .. })
        ));
    }
}
