//! The path-recognition collaborator this engine consumes but does not implement.
//!
//! Path recognition and URL generation are explicitly out of scope here;
//! this module only defines the shape the core needs from a recognizer, so
//! a host can plug in whatever trie/regex matcher it likes.

use crate::params::{Params, QueryParams};
use std::collections::BTreeMap;

/// One level of a chain as reported by the recognizer.
#[derive(Debug, Clone)]
pub struct RecognizedHandler {
    pub handler: String,
    /// Ordered dynamic-segment names this handler owns (e.g. `["id"]`).
    pub names: Vec<String>,
    pub is_dynamic: bool,
    /// Params parsed directly from the URL, if this came from `recognize`.
    pub params: Option<Params>,
    /// Query-param keys this handler (and only this handler) accepts.
    pub query_params: Vec<String>,
}

impl RecognizedHandler {
    pub fn static_handler(name: impl Into<String>) -> Self {
        Self {
            handler: name.into(),
            names: Vec::new(),
            is_dynamic: false,
            params: None,
            query_params: Vec::new(),
        }
    }

    pub fn dynamic_handler(name: impl Into<String>, dynamic_name: impl Into<String>) -> Self {
        Self {
            handler: name.into(),
            names: vec![dynamic_name.into()],
            is_dynamic: true,
            params: None,
            query_params: Vec::new(),
        }
    }

    pub fn with_query_params(mut self, params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.query_params = params.into_iter().map(Into::into).collect();
        self
    }
}

/// External collaborator: path recognition and URL generation.
///
/// The core never inspects URL syntax itself; it only calls these three
/// methods. Route-table construction helpers like `map`/`delegate` are
/// recognizer-internal concerns with no bearing on the transition engine
/// and are not modeled here.
pub trait Recognizer: Send + Sync {
    /// Parse a URL into an ordered chain, or `None` if nothing matches.
    fn recognize(&self, url: &str) -> Option<Vec<RecognizedHandler>>;

    /// Look up the static chain for a symbolic route name.
    fn handlers_for(&self, name: &str) -> Option<Vec<RecognizedHandler>>;

    /// Build a URL from a route name and a flat param/query-param map.
    fn generate(&self, name: &str, params: &Params, query_params: &QueryParams) -> Result<String, crate::error::RouterError>;

    /// Whether `name` is a route this recognizer knows about.
    fn has_route(&self, name: &str) -> bool {
        self.handlers_for(name).is_some()
    }
}

/// An in-memory recognizer driven by a static table, useful for hosts that
/// build their route tree up front (and for this crate's own tests).
pub struct StaticRecognizer {
    routes: BTreeMap<String, Vec<RecognizedHandler>>,
    url_table: Vec<(String, String)>,
}

impl StaticRecognizer {
    pub fn new() -> Self {
        Self {
            routes: BTreeMap::new(),
            url_table: Vec::new(),
        }
    }

    /// Register the full ancestor chain for `name`, plus the static URL
    /// pattern used for `recognize`/`generate` round-tripping in tests.
    pub fn add_route(mut self, name: impl Into<String>, url_pattern: impl Into<String>, chain: Vec<RecognizedHandler>) -> Self {
        let name = name.into();
        self.url_table.push((name.clone(), url_pattern.into()));
        self.routes.insert(name, chain);
        self
    }
}

impl Default for StaticRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for StaticRecognizer {
    fn recognize(&self, url: &str) -> Option<Vec<RecognizedHandler>> {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        for (name, pattern) in &self.url_table {
            let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
            if pattern_segments.len() != segments.len() {
                continue;
            }
            let mut captured = BTreeMap::new();
            let mut ok = true;
            for (p, s) in pattern_segments.iter().zip(segments.iter()) {
                if let Some(dyn_name) = p.strip_prefix(':') {
                    captured.insert(dyn_name.to_string(), (*s).to_string());
                } else if p != s {
                    ok = false;
                    break;
                }
            }
            if !ok {
                continue;
            }
            let mut chain = self.routes.get(name)?.clone();
            for handler in chain.iter_mut() {
                if handler.is_dynamic {
                    let mut params = BTreeMap::new();
                    for n in &handler.names {
                        if let Some(v) = captured.get(n) {
                            params.insert(n.clone(), v.clone());
                        }
                    }
                    handler.params = Some(params);
                }
            }
            let _ = query;
            return Some(chain);
        }
        None
    }

    fn handlers_for(&self, name: &str) -> Option<Vec<RecognizedHandler>> {
        self.routes.get(name).cloned()
    }

    fn generate(&self, name: &str, params: &Params, query_params: &QueryParams) -> Result<String, crate::error::RouterError> {
        let (_, pattern) = self
            .url_table
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| crate::error::RouterError::UnrecognizedUrl(format!("no route named '{name}'")))?;

        let mut url = String::new();
        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            url.push('/');
            if let Some(dyn_name) = segment.strip_prefix(':') {
                match params.get(dyn_name) {
                    Some(v) => url.push_str(v),
                    None => {
                        return Err(crate::error::RouterError::MissingParam {
                            handler: name.to_string(),
                            name: dyn_name.to_string(),
                        })
                    }
                }
            } else {
                url.push_str(segment);
            }
        }
        if url.is_empty() {
            url.push('/');
        }
        if !query_params.is_empty() {
            let qs: Vec<String> = query_params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            url.push('?');
            url.push_str(&qs.join("&"));
        }
        Ok(url)
    }
}
