//! Convenience re-exports for hosts embedding this engine (mirrors
//! `r2e-core`'s `prelude` module).

pub use crate::config::{RouterConfig, UrlMethod};
pub use crate::error::RouterError;
pub use crate::handler::{EventOutcome, Handler, HandlerRegistry, HookOutcome, Model, SuppliedObject};
pub use crate::recognizer::{RecognizedHandler, Recognizer, StaticRecognizer};
pub use crate::router::{CommittedHandler, Router, RouterBuilder};
pub use crate::transition::{Outcome, Transition};
