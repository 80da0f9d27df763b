//! Request descriptions for stream sources

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// HTTP method used to open a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    #[default]
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

impl std::str::FromStr for Method {
    type Err = crate::error::SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(crate::error::SlotError::config(format!(
                "Unsupported method '{}', expected GET or POST",
                other
            ))),
        }
    }
}

/// Everything needed to open a stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestDescription {
    /// Target URL
    pub endpoint: String,
    /// Method, POST unless set
    #[serde(default)]
    pub method: Method,
    /// Request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body, sent when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
}

impl RequestDescription {
    /// Create a POST request description for `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the method
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set one body field
    pub fn with_body_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.get_or_insert_with(Map::new).insert(key.into(), value);
        self
    }

    /// Apply a per-call override on top of this description.
    ///
    /// Headers and body fields are merged key by key, the override winning;
    /// endpoint and method are replaced only when the override sets them.
    pub fn merged(&self, overlay: &RequestOverride) -> Self {
        let mut headers = self.headers.clone();
        headers.extend(overlay.headers.clone());

        let body = match (&self.body, &overlay.body) {
            (Some(base), Some(extra)) => {
                let mut body = base.clone();
                body.extend(extra.clone());
                Some(body)
            }
            (None, Some(extra)) => Some(extra.clone()),
            (base, None) => base.clone(),
        };

        Self {
            endpoint: overlay
                .endpoint
                .clone()
                .unwrap_or_else(|| self.endpoint.clone()),
            method: overlay.method.unwrap_or(self.method),
            headers,
            body,
        }
    }
}

/// Per-call changes to a [`RequestDescription`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOverride {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub method: Option<Method>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Map<String, Value>>,
}

impl RequestOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add or replace one body field
    pub fn with_body_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.get_or_insert_with(Map::new).insert(key.into(), value);
        self
    }

    /// Replace the endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Replace the method
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }
}
