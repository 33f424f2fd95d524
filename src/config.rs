//! Router-wide configuration.
//!
//! Scaled down from `r2e-core`'s layered YAML/env/secrets loader: this crate
//! is a library embedded in a host application, not a deployed service, so
//! there's no file or environment source to layer — just a small struct the
//! host builds in code via [`crate::router::RouterBuilder`].

/// How a committed transition should affect the host's address bar / URL
/// state, mirroring `router.js`'s `updateURL`/`replaceURL`/do-nothing split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlMethod {
    /// Push a new history entry (the default).
    #[default]
    Update,
    /// Replace the current history entry.
    Replace,
    /// Don't touch host URL state at all.
    Suppress,
}

/// Tunables for a [`crate::router::Router`].
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// URL method used when a transition doesn't specify one.
    pub default_url_method: UrlMethod,
    /// Whether a `transition_to` with the same target/params/query as the
    /// active transition short-circuits to the existing in-flight
    /// transition instead of starting a new one.
    pub dedup_in_flight: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_url_method: UrlMethod::Update,
            dedup_in_flight: true,
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<(), crate::error::RouterError> {
        // Every field here is already a closed enum or bool; nothing can be
        // out of range today. Kept as a hook so future config additions
        // (timeouts, retry limits) have a single place to enforce invariants.
        Ok(())
    }
}
