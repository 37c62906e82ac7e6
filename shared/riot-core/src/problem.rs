//! Problem details body returned for failures before any dataset byte is sent

use serde::{Deserialize, Serialize};

/// Type URI for plain HTTP status failures
pub const HTTP_STATUS_TYPE: &str = "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html";

/// Type URI for timestamp parameter failures
pub const RFC3339_TYPE: &str = "https://www.ietf.org/rfc/rfc3339.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl ProblemDetails {
    pub fn new(status: u16, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: None,
            title: title.into(),
            status,
            detail: detail.into(),
        }
    }

    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}
