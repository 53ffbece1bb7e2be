use std::sync::Arc;

use apix_core::types::{DataType, MemberAttr, ParamGroups, ParamSource, TypeExpr};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::types::{ObjectVar, TypeRegistry, ValueError, Variable};

/// Source of raw request values, supplied by the HTTP layer.
pub trait ParamReader: Send + Sync {
    fn get(&self, name: &str, source: ParamSource) -> Option<JsonValue>;
}

/// A [`ParamReader`] over one JSON object per parameter group.
#[derive(Debug, Clone, Default)]
pub struct JsonParamReader {
    groups: IndexMap<ParamSource, serde_json::Map<String, JsonValue>>,
}

impl JsonParamReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, source: ParamSource, values: serde_json::Map<String, JsonValue>) -> Self {
        self.groups.insert(source, values);
        self
    }

    pub fn set(&mut self, source: ParamSource, name: impl Into<String>, value: JsonValue) {
        self.groups.entry(source).or_default().insert(name.into(), value);
    }

    /// Reads `{"body": {..}, "path": {..}, "header": {..}, "queries": {..}}`.
    /// Keys that are not group names are rejected.
    pub fn from_json(value: JsonValue) -> Result<Self, String> {
        let JsonValue::Object(groups) = value else {
            return Err("parameters must be a JSON object keyed by group".to_string());
        };
        let mut reader = Self::new();
        for (key, values) in groups {
            let source: ParamSource = serde_json::from_value(JsonValue::String(key.clone()))
                .map_err(|_| format!("unknown parameter group '{key}'"))?;
            let JsonValue::Object(values) = values else {
                return Err(format!("parameter group '{key}' must be an object"));
            };
            reader.groups.insert(source, values);
        }
        Ok(reader)
    }
}

impl ParamReader for JsonParamReader {
    fn get(&self, name: &str, source: ParamSource) -> Option<JsonValue> {
        let group = self.groups.get(&source)?;
        match source {
            ParamSource::Header => group
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone()),
            _ => group.get(name).cloned(),
        }
    }
}

/// Binds the declared parameter groups of one endpoint into a single root
/// object variable.
#[derive(Debug, Clone)]
pub struct ParamBinder {
    registry: Arc<TypeRegistry>,
    groups: Vec<(ParamSource, IndexMap<String, MemberAttr>)>,
    root: Arc<DataType>,
}

impl ParamBinder {
    pub fn new(registry: Arc<TypeRegistry>, params: &ParamGroups) -> Self {
        let groups: Vec<_> = params
            .iter()
            .map(|(source, members)| (*source, members.clone()))
            .collect();
        let mut root = IndexMap::new();
        for (_, members) in &groups {
            for (name, attr) in members {
                root.insert(name.clone(), attr.clone());
            }
        }
        Self {
            registry,
            groups,
            root: Arc::new(DataType {
                name: "params".to_string(),
                description: None,
                members: root,
            }),
        }
    }

    pub fn groups(&self) -> &[(ParamSource, IndexMap<String, MemberAttr>)] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|(_, m)| m.is_empty())
    }

    /// Reads and validates every declared member. Without declared members the
    /// result is [`Variable::Nil`]. A name declared in several groups takes the
    /// value of the last group.
    pub fn read_params(&self, reader: &dyn ParamReader) -> Result<Variable, ValueError> {
        if self.is_empty() {
            return Ok(Variable::Nil);
        }
        let mut members = IndexMap::new();
        for (source, group) in &self.groups {
            for (name, attr) in group {
                let raw = reader.get(name, *source).filter(|v| !v.is_null());
                let Some(raw) = raw else {
                    if attr.required {
                        return Err(ValueError::RequiredFieldMissing {
                            field: name.clone(),
                        });
                    }
                    debug!(param = %name, %source, "optional parameter absent");
                    members.shift_remove(name);
                    continue;
                };
                let mut var = self
                    .registry
                    .new_variable(attr)
                    .map_err(|e| e.in_field(name))?;
                var.set_value(&self.registry, &raw)
                    .and_then(|_| var.validate())
                    .map_err(|e| e.in_field(name))?;
                members.insert(name.clone(), var);
            }
        }
        Ok(Variable::Object(ObjectVar {
            attr: MemberAttr::new(TypeExpr::named(self.root.name.clone())).required(),
            data_type: Arc::clone(&self.root),
            members,
        }))
    }
}
