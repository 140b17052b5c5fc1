use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use thiserror::Error;
use tracing::Level;

use super::sink::EventSink;
use super::types::{EndpointDescriptor, ProbeFailure, ProbeOutcome};

/// Hard budget for one probe, connection plus response.
///
/// An endpoint that cannot answer within this window is unavailable.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ProberError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Probes a single endpoint.
///
/// Implementations never fail: every problem is folded into a DOWN
/// [`ProbeOutcome`], so a cycle can always join on all of them.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &EndpointDescriptor) -> ProbeOutcome;
}

/// HTTP prober backed by one shared `reqwest` client.
///
/// Diagnostics for missing fields, timeouts and transport errors go to the
/// sink; a probe that gets a response emits nothing.
#[derive(Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    sink: Arc<dyn EventSink>,
}

impl HttpProber {
    pub fn new(sink: Arc<dyn EventSink>) -> Result<Self, ProberError> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .user_agent(concat!("endpoint-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, sink })
    }

    fn build_request(
        &self,
        endpoint: &EndpointDescriptor,
        url: &str,
    ) -> Result<reqwest::RequestBuilder, String> {
        let method = Method::from_bytes(endpoint.method().to_ascii_uppercase().as_bytes())
            .map_err(|_| format!("invalid HTTP method '{}'", endpoint.method()))?;

        let mut request = self.client.request(method, url).timeout(PROBE_TIMEOUT);

        if let Some(headers) = &endpoint.headers {
            request = request.headers(header_map(headers)?);
        }

        if let Some(body) = &endpoint.body {
            request = request.json(body);
        }

        Ok(request)
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &EndpointDescriptor) -> ProbeOutcome {
        if endpoint.configured_name().is_none() {
            self.sink.emit(
                Level::WARN,
                &format!("Missing name to describe the HTTP endpoint for: {endpoint:?}"),
            );
        }
        let name = endpoint.display_name();

        let Some(url) = endpoint.configured_url() else {
            self.sink
                .emit(Level::ERROR, &format!("Missing URL for the HTTP endpoint: {endpoint:?}"));
            return ProbeOutcome::down(name, ProbeFailure::MissingUrl);
        };

        let failure = match self.build_request(endpoint, url) {
            Ok(request) => match request.send().await {
                Ok(response) => {
                    return ProbeOutcome::from_status_code(name, response.status().as_u16());
                }
                Err(e) if e.is_timeout() => ProbeFailure::TimedOut,
                Err(e) => ProbeFailure::Transport(e.to_string()),
            },
            Err(message) => ProbeFailure::Transport(message),
        };

        let message = match &failure {
            ProbeFailure::TimedOut => format!("Request to {name} timed out, {url} is DOWN"),
            other => format!("Request to {name} failed, {url} is DOWN: {other}"),
        };
        self.sink.emit(Level::ERROR, &message);

        ProbeOutcome::down(name, failure)
    }
}

/// Convert configured header values; strings go through as-is, anything else
/// is sent as its JSON text.
fn header_map(
    headers: &std::collections::BTreeMap<String, serde_json::Value>,
) -> Result<HeaderMap, String> {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| format!("invalid header name '{key}': {e}"))?;
        let text = match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let value = HeaderValue::from_str(&text)
            .map_err(|e| format!("invalid value for header '{key}': {e}"))?;
        map.append(name, value);
    }

    Ok(map)
}
