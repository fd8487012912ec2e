//! The network seam between the executor and an HTTP client.
//!
//! # Design
//! `Transport` receives a fully prepared `HttpRequest` and reports the
//! completed response whatever its status. Status interpretation belongs to
//! the classifier, so an implementation must only fail for network errors and
//! timeouts.
//!
//! `UreqTransport` runs ureq's blocking client on tokio's blocking pool. A
//! fresh agent is built per call so the request's own timeout can be applied
//! without shared state; nothing is pooled or retried.

use async_trait::async_trait;
use tracing::debug;

use crate::error::PlugError;
use crate::http::{HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, PlugError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, PlugError> {
        tokio::task::spawn_blocking(move || execute_blocking(request))
            .await
            .map_err(|err| PlugError::Transport(err.to_string()))?
    }
}

fn execute_blocking(request: HttpRequest) -> Result<HttpResponse, PlugError> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(request.timeout)
        .build()
        .new_agent();

    let mut builder = ureq::http::Request::builder()
        .method(request.method.as_str())
        .uri(request.url.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let result = match request.body {
        Some(body) => agent.run(builder.body(body).map_err(invalid_request)?),
        None => agent.run(builder.body(()).map_err(invalid_request)?),
    };
    let mut response = result.map_err(|err| {
        debug!(method = %request.method, url = %request.url, error = %err, "HTTP request failed");
        from_ureq(err)
    })?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response.body_mut().read_to_string().map_err(from_ureq)?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn invalid_request(err: ureq::http::Error) -> PlugError {
    PlugError::Transport(err.to_string())
}

fn from_ureq(err: ureq::Error) -> PlugError {
    match err {
        ureq::Error::Timeout(_) => PlugError::Timeout,
        other => PlugError::Transport(other.to_string()),
    }
}
