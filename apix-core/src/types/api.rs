use std::str::FromStr;

use indexmap::IndexMap;

use crate::types::{ApiForward, MemberAttr};

/// Where a parameter group is read from on the incoming request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ParamSource {
    Body,
    Path,
    Header,
    #[serde(alias = "query")]
    Queries,
}

impl ParamSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Path => "path",
            Self::Header => "header",
            Self::Queries => "queries",
        }
    }
}

impl std::fmt::Display for ParamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ParamGroups = IndexMap<ParamSource, IndexMap<String, MemberAttr>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            "options" => Ok(Self::Options),
            "head" => Ok(Self::Head),
            "patch" => Ok(Self::Patch),
            "trace" => Ok(Self::Trace),
            other => Err(format!("invalid method '{other}'")),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ApiEntry {
    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub params: ParamGroups,

    #[serde(default)]
    pub forwards: Vec<ApiForward>,

    #[serde(default)]
    pub returns: IndexMap<String, ApiReturn>,
}

impl ApiEntry {
    /// The declared method, `GET` when omitted.
    pub fn http_method(&self) -> Result<HttpMethod, String> {
        match &self.method {
            None => Ok(HttpMethod::Get),
            Some(m) => m.parse(),
        }
    }

    /// Every declared parameter member name, in group then member order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .values()
            .flat_map(|members| members.keys().map(String::as_str))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    Json,
    File,
    NoContent,
}

impl FromStr for ReturnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "file" => Ok(Self::File),
            "nocontent" => Ok(Self::NoContent),
            other => Err(format!("unsupported return type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ReturnData {
    TypeName(String),
    Members(IndexMap<String, MemberAttr>),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ApiReturn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub return_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ReturnData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApiReturn {
    /// The declared return type, `json` when omitted.
    pub fn kind(&self) -> Result<ReturnType, String> {
        match &self.return_type {
            None => Ok(ReturnType::Json),
            Some(t) => t.parse(),
        }
    }
}
