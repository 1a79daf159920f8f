//! CORS allow-list configuration for buckets.

use serde::{Deserialize, Serialize};

/// CORS configuration for a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CorsConfiguration {
    /// CORS rules.
    #[serde(rename = "CORSRules")]
    pub rules: Vec<CorsRule>,
}

impl CorsConfiguration {
    /// Returns true if a request from `origin` using `method` is allowed by
    /// any rule.
    #[must_use]
    pub fn allows(&self, origin: &str, method: HttpMethod) -> bool {
        self.rules.iter().any(|r| r.allows(origin, method))
    }
}

/// A single CORS rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CorsRule {
    /// Optional ID for this rule.
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Allowed HTTP methods.
    pub allowed_methods: Vec<HttpMethod>,

    /// Allowed origins (e.g., `*` or `http://example.com`).
    pub allowed_origins: Vec<String>,

    /// Allowed headers in the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_headers: Vec<String>,

    /// How long browsers may cache the preflight response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,
}

impl CorsRule {
    /// Creates a rule allowing `methods` from `origins`.
    #[must_use]
    pub fn new<O>(methods: impl IntoIterator<Item = HttpMethod>, origins: O) -> Self
    where
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            id: None,
            allowed_methods: methods.into_iter().collect(),
            allowed_origins: origins.into_iter().map(Into::into).collect(),
            allowed_headers: Vec::new(),
            max_age: None,
        }
    }

    /// Sets the allowed request headers.
    #[must_use]
    pub fn with_headers<H>(mut self, headers: H) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
    {
        self.allowed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    fn allows(&self, origin: &str, method: HttpMethod) -> bool {
        self.allowed_methods.contains(&method)
            && self
                .allowed_origins
                .iter()
                .any(|o| crate::policy::wildcard_match(o, origin))
    }
}

/// HTTP methods a CORS rule may allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// HEAD
    Head,
}
