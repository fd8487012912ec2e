//! Explicit configuration for constructing a root `Plug`.
//!
//! Callers load this from wherever their settings live and pass it in; the
//! crate keeps no process-wide defaults.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlugConfig {
    /// Base URL every request starts from.
    pub host: String,

    /// Skip the structured-format query parameter.
    #[serde(default)]
    pub raw: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Scheme assumed when `host` is an origin-relative reference, e.g.
    /// the scheme of the page the client runs under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_scheme: Option<String>,
}

impl PlugConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            raw: false,
            timeout_ms: None,
            headers: BTreeMap::new(),
            ambient_scheme: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
