//! Client-side HTTP request composition and execution.
//!
//! # Overview
//! `Plug` is an immutable description of an API location. Builder methods
//! (`at`, `with_param`, `with_header`, ...) derive new plugs; verb methods
//! (`get`, `post`, `put`, `del`, `head`, `options`) execute them through a
//! pluggable `Transport`.
//!
//! # Design
//! - Builders never mutate in place, so a root plug can be shared and forked
//!   from any number of tasks without locking.
//! - `Plug::prepare` turns a plug into a plain `HttpRequest`; the transport
//!   does the I/O. This keeps request composition deterministic and testable
//!   with a fake transport.
//! - Two response tiers: `*_raw` returns the response whatever its status,
//!   the plain verbs classify it and return the text body.
//! - PUT and DELETE go out as POST with `X-HTTP-Method-Override`.

pub mod classify;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod plug;
pub mod transport;
pub mod uri;

pub use classify::{check_status, is_success};
pub use config::PlugConfig;
pub use error::PlugError;
pub use headers::Headers;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use plug::{ConstructionParams, Plug, PlugOptions};
pub use transport::{Transport, UreqTransport};
pub use uri::Uri;
