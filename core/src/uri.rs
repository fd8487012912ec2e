//! URL composition: base URL, ordered path segments, keyed query parameters.
//!
//! # Design
//! Scheme, host and path live in a `url::Url`; the query is held separately
//! as an ordered key→value list so a later write for the same key replaces
//! the earlier one in place instead of appending a duplicate. The query is
//! only serialized back into the URL when the string form is produced.
//!
//! Besides absolute URLs two reference forms are accepted, both reporting no
//! scheme so the executor falls back to the ambient scheme:
//! - scheme-relative (`//cdn.example.com/api`), which keeps its host;
//! - origin-relative (`/@api/deki`), which has no host at all.
//!
//! Path-relative references (`api/v1`) are rejected since they have no fixed
//! position to append segments to.
//!
//! The query is form-encoded on output, so a valueless key in the base URL
//! (`?flag`) comes back as `?flag=`.

use std::fmt;

use url::{Position, Url};

use crate::error::PlugError;

const ORIGIN_PLACEHOLDER: &str = "http://relative.invalid";
// Non-special, so no default port is ever dropped from the real authority.
const SCHEME_PLACEHOLDER: &str = "relative:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Absolute,
    SchemeRelative,
    OriginRelative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    url: Url,
    form: Form,
    query: Vec<(String, String)>,
}

impl Uri {
    pub fn parse(input: &str) -> Result<Self, PlugError> {
        let (mut url, form) = if input.starts_with("//") {
            (Url::parse(&format!("{SCHEME_PLACEHOLDER}{input}"))?, Form::SchemeRelative)
        } else if input.starts_with('/') {
            (Url::parse(ORIGIN_PLACEHOLDER)?.join(input)?, Form::OriginRelative)
        } else {
            (Url::parse(input)?, Form::Absolute)
        };
        if form == Form::SchemeRelative && url.path().is_empty() {
            url.set_path("/");
        }
        if url.cannot_be_a_base() {
            return Err(PlugError::NotHierarchical(input.to_string()));
        }

        let existing: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        url.set_query(None);

        let mut uri = Self {
            url,
            form,
            query: Vec::new(),
        };
        uri.add_query_params(existing);
        Ok(uri)
    }

    /// Append path segments in order. Each segment is percent-encoded as a
    /// single path component.
    pub fn add_segments<I, S>(&mut self, segments: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<S> = segments.into_iter().collect();
        if segments.is_empty() {
            return;
        }
        // `parse` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = self.url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
    }

    pub fn add_query_params<I, K, V>(&mut self, params: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            let (key, value) = (key.into(), value.into());
            match self.query.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => self.query.push((key, value)),
            }
        }
    }

    pub fn remove_query_param(&mut self, key: &str) {
        self.query.retain(|(existing, _)| existing != key);
    }

    /// `None` for scheme-relative and origin-relative references.
    pub fn scheme(&self) -> Option<&str> {
        (self.form == Form::Absolute).then(|| self.url.scheme())
    }

    /// Rebase onto `host`, given as `name` or `name:port`.
    pub fn with_host(&mut self, host: &str) -> Result<(), PlugError> {
        if self.form == Form::OriginRelative {
            return Err(PlugError::InvalidHost(format!(
                "{host}: origin-relative reference has no host to replace"
            )));
        }
        let (name, port) = split_host_port(host)?;
        self.url
            .set_host(Some(name))
            .map_err(|err| PlugError::InvalidHost(format!("{host}: {err}")))?;
        if let Some(port) = port {
            self.url
                .set_port(Some(port))
                .map_err(|()| PlugError::InvalidHost(host.to_string()))?;
        }
        Ok(())
    }
}

fn split_host_port(host: &str) -> Result<(&str, Option<u16>), PlugError> {
    let separator = if host.starts_with('[') {
        host.rfind("]:").map(|idx| idx + 1)
    } else {
        host.rfind(':')
    };
    match separator {
        Some(idx) => {
            let port = host[idx + 1..]
                .parse()
                .map_err(|_| PlugError::InvalidHost(host.to_string()))?;
            Ok((&host[..idx], Some(port)))
        }
        None => Ok((host, None)),
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        match self.form {
            Form::Absolute => f.write_str(url.as_str()),
            Form::SchemeRelative => write!(f, "//{}", &url[Position::BeforeUsername..]),
            Form::OriginRelative => f.write_str(&url[Position::BeforePath..]),
        }
    }
}
