use crate::types::{ApiEntry, DataType};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ApiDocument {
    #[serde(default)]
    pub version: String,

    #[serde(default, rename = "baseUrl")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub types: Vec<DataType>,

    #[serde(default)]
    pub apis: Vec<ApiEntry>,
}

/// Joins a base url and an endpoint path with exactly one `/` between them.
pub fn url_join(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return if base.is_empty() { "/".to_string() } else { base.to_string() };
    }
    if base.is_empty() {
        return format!("/{path}");
    }
    let base = if base.starts_with('/') || base.contains("://") {
        base.to_string()
    } else {
        format!("/{base}")
    };
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::url_join;

    #[test]
    fn joins_with_single_slash() {
        assert_eq!(url_join("/api/", "/user"), "/api/user");
        assert_eq!(url_join("/api", "user"), "/api/user");
        assert_eq!(url_join("api", "user/info"), "/api/user/info");
    }

    #[test]
    fn handles_empty_sides() {
        assert_eq!(url_join("", "/user"), "/user");
        assert_eq!(url_join("/api/", ""), "/api");
        assert_eq!(url_join("", ""), "/");
    }
}
