use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label used when an endpoint is configured without a name
pub const UNKNOWN_NAME: &str = "unknown";

/// Method used when an endpoint does not configure one
pub const DEFAULT_METHOD: &str = "GET";

/// One probe target as read from configuration.
///
/// Every field is optional at this stage; the prober decides what a missing
/// field means when the endpoint is checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Free-text label for the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// URL to probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// HTTP method, `GET` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Request headers, values are passed through as configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, serde_json::Value>>,

    /// JSON request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl EndpointDescriptor {
    /// Create a descriptor with only a name and URL set
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: Some(name.into()), url: Some(url.into()), ..Self::default() }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.headers.get_or_insert_with(BTreeMap::new).insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The configured name, if it is present and non-empty
    pub fn configured_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// The configured URL, if it is present and non-empty
    pub fn configured_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }

    /// Display name, falling back to [`UNKNOWN_NAME`]
    pub fn display_name(&self) -> &str {
        self.configured_name().unwrap_or(UNKNOWN_NAME)
    }

    /// Method to issue, falling back to [`DEFAULT_METHOD`]
    pub fn method(&self) -> &str {
        self.method.as_deref().filter(|method| !method.is_empty()).unwrap_or(DEFAULT_METHOD)
    }

    /// Domain key this endpoint aggregates under, if it has a URL
    pub fn domain(&self) -> Option<String> {
        self.configured_url().and_then(domain_key)
    }
}

/// Binary classification of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeStatus {
    Up,
    Down,
}

impl ProbeStatus {
    /// `Up` iff the status code is in `[200, 300)`
    pub fn from_status_code(code: u16) -> Self {
        if (200..300).contains(&code) { ProbeStatus::Up } else { ProbeStatus::Down }
    }

    pub fn is_up(self) -> bool {
        self == ProbeStatus::Up
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStatus::Up => write!(f, "UP"),
            ProbeStatus::Down => write!(f, "DOWN"),
        }
    }
}

/// Why a probe was classified DOWN
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// No URL configured, no request was sent
    MissingUrl,
    /// No response within the probe timeout
    TimedOut,
    /// A response arrived with a status outside `[200, 300)`
    Status(u16),
    /// Any other client, connection or protocol error
    Transport(String),
}

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeFailure::MissingUrl => write!(f, "missing URL"),
            ProbeFailure::TimedOut => write!(f, "timed out"),
            ProbeFailure::Status(code) => write!(f, "status code {code}"),
            ProbeFailure::Transport(message) => write!(f, "{message}"),
        }
    }
}

/// Result of probing one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Display name of the endpoint (never empty)
    pub name: String,

    pub status: ProbeStatus,

    /// Set whenever `status` is `Down`
    pub failure: Option<ProbeFailure>,
}

impl ProbeOutcome {
    pub fn up(name: impl Into<String>) -> Self {
        Self { name: name.into(), status: ProbeStatus::Up, failure: None }
    }

    pub fn down(name: impl Into<String>, failure: ProbeFailure) -> Self {
        Self { name: name.into(), status: ProbeStatus::Down, failure: Some(failure) }
    }

    /// Classify a received status code
    pub fn from_status_code(name: impl Into<String>, code: u16) -> Self {
        match ProbeStatus::from_status_code(code) {
            ProbeStatus::Up => Self::up(name),
            ProbeStatus::Down => Self::down(name, ProbeFailure::Status(code)),
        }
    }
}

/// Derive the aggregation key for a URL: its host, without port or userinfo.
///
/// Endpoints on the same host but different ports share a key. Returns `None`
/// when no host can be found.
pub fn domain_key(url: &str) -> Option<String> {
    let host = match url::Url::parse(url) {
        Ok(parsed) => parsed.host_str().map(str::to_string),
        Err(_) => fallback_host(url),
    };

    host.filter(|host| !host.is_empty())
}

/// Best-effort host extraction for strings `url` refuses to parse
fn fallback_host(raw: &str) -> Option<String> {
    let (_, rest) = raw.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = host_port.split(':').next().unwrap_or_default();
    Some(host.to_ascii_lowercase())
}
