use indexmap::IndexMap;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFail {
    #[default]
    Continue,
    Reject,
}

impl std::fmt::Display for OnFail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => f.write_str("continue"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GrpcTarget {
    #[serde(default)]
    pub method: String,

    #[serde(default, rename = "paramMapper")]
    pub param_mapper: IndexMap<String, String>,
}

fn default_redis_value_type() -> String {
    "string".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RedisTarget {
    #[serde(default)]
    pub key: String,

    /// `string` reads a plain value, `hash` reads every field of a hash.
    #[serde(rename = "type", default = "default_redis_value_type")]
    pub value_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HttpTarget {
    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, rename = "paramMapper")]
    pub param_mapper: IndexMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Grpc,
    Redis,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardTarget<'a> {
    Grpc(&'a GrpcTarget),
    Redis(&'a RedisTarget),
    Http(&'a HttpTarget),
}

impl ForwardTarget<'_> {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Grpc(_) => TargetKind::Grpc,
            Self::Redis(_) => TargetKind::Redis,
            Self::Http(_) => TargetKind::Http,
        }
    }
}

/// One node of an endpoint's forward chain.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ApiForward {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub service: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<GrpcTarget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis: Option<RedisTarget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpTarget>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<IndexMap<String, JsonValue>>,

    #[serde(default, rename = "onfail", alias = "onFail")]
    pub on_fail: OnFail,
}

impl ApiForward {
    /// All declared targets. A well-formed node has exactly one.
    pub fn targets(&self) -> Vec<ForwardTarget<'_>> {
        let mut out = Vec::with_capacity(1);
        if let Some(t) = &self.grpc {
            out.push(ForwardTarget::Grpc(t));
        }
        if let Some(t) = &self.redis {
            out.push(ForwardTarget::Redis(t));
        }
        if let Some(t) = &self.http {
            out.push(ForwardTarget::Http(t));
        }
        out
    }

    pub fn target(&self) -> Option<ForwardTarget<'_>> {
        self.targets().into_iter().next()
    }

    /// Outbound `destField -> sourceExpression` pairs in declaration order.
    pub fn mapping(&self) -> Vec<(&str, &str)> {
        match self.target() {
            Some(ForwardTarget::Grpc(t)) => t
                .param_mapper
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            Some(ForwardTarget::Redis(t)) => vec![("key", t.key.as_str())],
            Some(ForwardTarget::Http(t)) => t
                .param_mapper
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            None => Vec::new(),
        }
    }
}
