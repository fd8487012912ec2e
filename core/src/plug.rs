//! Immutable request builder and executor.
//!
//! # Design
//! A `Plug` describes one API location: base URL, headers, timeout and
//! whether structured (JSON) output is negotiated. Every builder method
//! returns a new `Plug` and leaves the receiver untouched, so one root plug
//! per resource can be forked freely, including from several tasks at once.
//!
//! Execution happens in two steps. `prepare` applies the per-call
//! augmentation (cache-busting timestamp, origin tag, format negotiation,
//! content type, TLS front-end signal) and yields a plain `HttpRequest`;
//! the `Transport` then performs the I/O. The `*_raw` methods hand back the
//! response whatever its status, the plain verb methods run it through
//! `classify::check_status` and return the text body.
//!
//! PUT and DELETE are sent as POST with `X-HTTP-Method-Override` because
//! some proxies and clients only let GET and POST through.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::classify::check_status;
use crate::config::PlugConfig;
use crate::error::PlugError;
use crate::headers::Headers;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::uri::Uri;

pub const TIMESTAMP_PARAM: &str = "_";
pub const ORIGIN_PARAM: &str = "origin";
pub const ORIGIN_TAG: &str = "mt-web";
pub const FORMAT_PARAM: &str = "dream.out.format";
pub const FORMAT_JSON: &str = "json";

pub const CONTENT_TYPE: &str = "Content-Type";
pub const FRONT_END_HTTPS: &str = "Front-End-Https";
pub const METHOD_OVERRIDE: &str = "X-HTTP-Method-Override";

/// URL changes applied once when a plug is constructed, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructionParams {
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub exclude_query: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct PlugOptions {
    pub headers: Headers,
    /// Do not ask the server for structured output.
    pub raw: bool,
    /// Scheme to assume when the URL carries none (`//host/..` or `/path`).
    pub ambient_scheme: Option<String>,
    pub construction: ConstructionParams,
}

#[derive(Clone)]
pub struct Plug {
    uri: Uri,
    headers: Headers,
    timeout: Option<Duration>,
    negotiate_structured: bool,
    ambient_scheme: Option<String>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Plug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plug")
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("negotiate_structured", &self.negotiate_structured)
            .field("ambient_scheme", &self.ambient_scheme)
            .finish_non_exhaustive()
    }
}

impl Plug {
    pub fn new(url: &str, transport: Arc<dyn Transport>) -> Result<Self, PlugError> {
        Self::with_options(url, PlugOptions::default(), transport)
    }

    pub fn with_options(
        url: &str,
        options: PlugOptions,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, PlugError> {
        let mut uri = Uri::parse(url)?;
        let ConstructionParams {
            segments,
            query,
            exclude_query,
            timeout,
        } = options.construction;

        uri.add_segments(segments);
        uri.add_query_params(query);
        if let Some(key) = exclude_query {
            uri.remove_query_param(&key);
        }

        Ok(Self {
            uri,
            headers: options.headers,
            timeout,
            negotiate_structured: !options.raw,
            ambient_scheme: options.ambient_scheme,
            transport,
        })
    }

    pub fn from_config(config: &PlugConfig, transport: Arc<dyn Transport>) -> Result<Self, PlugError> {
        let options = PlugOptions {
            headers: config.headers.clone().into(),
            raw: config.raw,
            ambient_scheme: config.ambient_scheme.clone(),
            construction: ConstructionParams {
                timeout: config.timeout(),
                ..ConstructionParams::default()
            },
        };
        Self::with_options(&config.host, options, transport)
    }

    // -----------------------------------------------------------------------
    // Builder
    // -----------------------------------------------------------------------

    fn derive(&self, change: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        change(&mut next);
        next
    }

    /// Append path segments, each stringified.
    pub fn at<I>(&self, segments: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let segments: Vec<String> = segments.into_iter().map(|s| s.to_string()).collect();
        self.derive(|plug| plug.uri.add_segments(segments))
    }

    pub fn with_param(&self, key: impl Into<String>, value: impl ToString) -> Self {
        let pair = (key.into(), value.to_string());
        self.derive(|plug| plug.uri.add_query_params([pair]))
    }

    pub fn with_params<I, K, V>(&self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let pairs: Vec<(String, String)> = params
            .into_iter()
            .map(|(key, value)| (key.into(), value.to_string()))
            .collect();
        self.derive(|plug| plug.uri.add_query_params(pairs))
    }

    pub fn without_param(&self, key: &str) -> Self {
        self.derive(|plug| plug.uri.remove_query_param(key))
    }

    pub fn with_header(&self, key: impl Into<String>, value: impl ToString) -> Self {
        let (key, value) = (key.into(), value.to_string());
        self.derive(|plug| plug.headers.insert(key, value))
    }

    pub fn with_headers<I, K, V>(&self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let pairs: Vec<(String, String)> = headers
            .into_iter()
            .map(|(key, value)| (key.into(), value.to_string()))
            .collect();
        self.derive(|plug| plug.headers.extend(pairs))
    }

    pub fn without_header(&self, key: &str) -> Self {
        self.derive(|plug| plug.headers.remove(key))
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        trace!(?timeout, "request timeout configured");
        self.derive(|plug| plug.timeout = Some(timeout))
    }

    pub fn without_timeout(&self) -> Self {
        self.derive(|plug| plug.timeout = None)
    }

    /// Rebase onto another host. Returns a new plug like every other
    /// builder method; the receiver keeps its host.
    pub fn with_host(&self, host: &str) -> Result<Self, PlugError> {
        let mut next = self.clone();
        next.uri.with_host(host)?;
        Ok(next)
    }

    pub fn url(&self) -> String {
        self.uri.to_string()
    }

    /// An independent copy; changing it does not affect the plug.
    pub fn headers(&self) -> Headers {
        self.headers.clone()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_raw(&self) -> bool {
        !self.negotiate_structured
    }

    fn is_secure(&self) -> bool {
        self.uri
            .scheme()
            .or(self.ambient_scheme.as_deref())
            .map(|scheme| scheme.trim_end_matches(':').eq_ignore_ascii_case("https"))
            .unwrap_or(false)
    }

    // -----------------------------------------------------------------------
    // Executor
    // -----------------------------------------------------------------------

    /// Build the wire request for one call without performing any I/O.
    ///
    /// The mime is written as `Content-Type` and only replaces a builder
    /// header of that exact spelling; a `content-type` builder header is
    /// sent alongside it.
    pub fn prepare(&self, method: HttpMethod, body: Option<String>, mime: Option<&str>) -> HttpRequest {
        let mut uri = self.uri.clone();
        uri.add_query_params([
            (TIMESTAMP_PARAM, chrono::Utc::now().timestamp_millis().to_string()),
            (ORIGIN_PARAM, ORIGIN_TAG.to_string()),
        ]);
        if self.negotiate_structured {
            uri.add_query_params([(FORMAT_PARAM, FORMAT_JSON)]);
        }

        let mut headers = self.headers.clone();
        if let Some(mime) = mime {
            headers.insert(CONTENT_TYPE, mime);
        }
        if self.is_secure() {
            headers.insert(FRONT_END_HTTPS, "On");
        }

        HttpRequest {
            method,
            url: uri.to_string(),
            headers: headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            body,
            timeout: self.timeout,
        }
    }

    async fn dispatch(
        &self,
        method: HttpMethod,
        body: Option<String>,
        mime: Option<&str>,
    ) -> Result<HttpResponse, PlugError> {
        let request = self.prepare(method, body, mime);
        debug!(%method, url = %request.url, "dispatching request");
        let response = self.transport.execute(request).await?;
        debug!(%method, status = response.status, "request completed");
        Ok(response)
    }

    pub async fn get_raw(&self) -> Result<HttpResponse, PlugError> {
        self.dispatch(HttpMethod::Get, None, None).await
    }

    pub async fn head_raw(&self) -> Result<HttpResponse, PlugError> {
        self.dispatch(HttpMethod::Head, None, None).await
    }

    pub async fn options_raw(&self) -> Result<HttpResponse, PlugError> {
        self.dispatch(HttpMethod::Options, None, None).await
    }

    pub async fn post_raw(&self, body: Option<String>, mime: Option<&str>) -> Result<HttpResponse, PlugError> {
        self.dispatch(HttpMethod::Post, body, mime).await
    }

    pub async fn put_raw(&self, body: Option<String>, mime: Option<&str>) -> Result<HttpResponse, PlugError> {
        self.with_header(METHOD_OVERRIDE, HttpMethod::Put)
            .post_raw(body, mime)
            .await
    }

    pub async fn del_raw(&self) -> Result<HttpResponse, PlugError> {
        self.with_header(METHOD_OVERRIDE, HttpMethod::Delete)
            .post_raw(None, None)
            .await
    }

    pub async fn delete_raw(&self) -> Result<HttpResponse, PlugError> {
        self.del_raw().await
    }

    pub async fn get(&self) -> Result<String, PlugError> {
        classified(self.get_raw().await)
    }

    pub async fn head(&self) -> Result<String, PlugError> {
        classified(self.head_raw().await)
    }

    pub async fn options(&self) -> Result<String, PlugError> {
        classified(self.options_raw().await)
    }

    pub async fn post(&self, body: Option<String>, mime: Option<&str>) -> Result<String, PlugError> {
        classified(self.post_raw(body, mime).await)
    }

    pub async fn put(&self, body: Option<String>, mime: Option<&str>) -> Result<String, PlugError> {
        classified(self.put_raw(body, mime).await)
    }

    pub async fn del(&self) -> Result<String, PlugError> {
        classified(self.del_raw().await)
    }

    pub async fn delete(&self) -> Result<String, PlugError> {
        self.del().await
    }
}

fn classified(result: Result<HttpResponse, PlugError>) -> Result<String, PlugError> {
    check_status(result?).map(HttpResponse::into_text)
}
