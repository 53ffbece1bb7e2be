use crate::error::ProxyError;

/// Body of a cross-service `call` frame: `service \0 method \0 params`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCall {
    pub service: String,
    pub method: String,
    pub params: Vec<u8>,
}

impl ServiceCall {
    pub fn new(service: impl Into<String>, method: impl Into<String>, params: Vec<u8>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
            params,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProxyError> {
        if self.service.contains('\0') || self.method.contains('\0') {
            return Err(ProxyError::MalformedCall(
                "service and method names must not contain NUL".to_string(),
            ));
        }
        let mut out =
            Vec::with_capacity(self.service.len() + self.method.len() + self.params.len() + 2);
        out.extend_from_slice(self.service.as_bytes());
        out.push(0);
        out.extend_from_slice(self.method.as_bytes());
        out.push(0);
        out.extend_from_slice(&self.params);
        Ok(out)
    }

    /// `params` takes the remainder, so it may itself contain NUL bytes.
    pub fn decode(body: &[u8]) -> Result<Self, ProxyError> {
        let mut parts = body.splitn(3, |b| *b == 0);
        let (Some(service), Some(method), Some(params)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ProxyError::MalformedCall(
                "expected service\\0method\\0params".to_string(),
            ));
        };
        let utf8 = |bytes: &[u8], what: &str| {
            String::from_utf8(bytes.to_vec())
                .map_err(|_| ProxyError::MalformedCall(format!("{what} is not valid UTF-8")))
        };
        Ok(Self {
            service: utf8(service, "service")?,
            method: utf8(method, "method")?,
            params: params.to_vec(),
        })
    }

    pub fn params_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProxyError> {
        serde_json::from_slice(&self.params).map_err(|e| ProxyError::MalformedCall(e.to_string()))
    }
}

/// Sent by a backend to announce the services it owns.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Registration {
    #[serde(rename = "serviceNames")]
    pub service_names: Vec<String>,
}

impl Registration {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            service_names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProxyError> {
        serde_json::to_vec(self).map_err(|e| ProxyError::Registration(e.to_string()))
    }

    pub fn decode(body: &[u8]) -> Result<Self, ProxyError> {
        let reg: Self =
            serde_json::from_slice(body).map_err(|e| ProxyError::Registration(e.to_string()))?;
        if reg.service_names.iter().any(|n| n.trim().is_empty()) {
            return Err(ProxyError::Registration(
                "service names must not be empty".to_string(),
            ));
        }
        Ok(reg)
    }
}
