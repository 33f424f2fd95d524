//! Error taxonomy for the transition engine.
//!
//! Modeled on `r2e-core`'s hand-rolled `AppError`: a plain enum with a manual
//! `Display` impl rather than a `thiserror` derive, because every variant here
//! already carries exactly the context a caller needs and there is no
//! library-boundary error type to wrap.

use std::fmt;

/// Everything that can go wrong while resolving or committing a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterError {
    /// The recognizer returned nothing for a URL transition.
    UnrecognizedUrl(String),
    /// A transition observed `is_aborted` between pipeline steps.
    TransitionAborted,
    /// More context objects were supplied than the chain has dynamic segments.
    TooManyContextObjects { leaf: String },
    /// A query param key isn't in the allow-list of the handler or any ancestor.
    InvalidQueryParam { handler: String, key: String },
    /// A dynamic segment has no value to generate a URL with: neither
    /// supplied at the call site nor found in the handler's active params.
    MissingParam { handler: String, name: String },
    /// A handler hook (`before_model`, `model`, `after_model`, `setup`, ...) failed.
    HookFailed { handler: String, source: String },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::UnrecognizedUrl(url) => write!(f, "unrecognized URL: {url}"),
            RouterError::TransitionAborted => write!(f, "transition aborted"),
            RouterError::TooManyContextObjects { leaf } => {
                write!(f, "too many context objects supplied for '{leaf}'")
            }
            RouterError::InvalidQueryParam { handler, key } => {
                write!(f, "query param '{key}' is not valid for handler '{handler}' or its ancestors")
            }
            RouterError::MissingParam { handler, name } => {
                write!(f, "no value for param '{name}' of handler '{handler}'")
            }
            RouterError::HookFailed { handler, source } => {
                write!(f, "hook failed in handler '{handler}': {source}")
            }
        }
    }
}

impl std::error::Error for RouterError {}

impl RouterError {
    /// Whether this error represents a clean abort rather than a hook failure.
    ///
    /// A handler "throwing" `TransitionAborted` itself is treated as a clean
    /// abort and must not bubble an `error` event — see the pipeline's
    /// `handle_error`.
    pub fn is_aborted(&self) -> bool {
        matches!(self, RouterError::TransitionAborted)
    }

    pub(crate) fn hook_failed(handler: impl Into<String>, source: impl fmt::Display) -> Self {
        RouterError::HookFailed {
            handler: handler.into(),
            source: source.to_string(),
        }
    }
}
