//! A hierarchical route transition engine: resolves nested handler chains,
//! asynchronously validates and fetches their models, diffs the result
//! against whatever's currently active, and commits or aborts as one unit.
//!
//! Path recognition and URL generation are deliberately out of scope — see
//! [`recognizer::Recognizer`] for the boundary a host implements. Everything
//! from there inward (match-point resolution, the validation pipeline,
//! context setup/teardown, event bubbling) lives in this crate.
//!
//! ```no_run
//! use routex::prelude::*;
//!
//! # async fn example(recognizer: std::sync::Arc<dyn Recognizer>) -> Result<(), RouterError> {
//! let router = Router::builder().recognizer(recognizer).build()?;
//! let transition = router.handle_url("/posts/1").await?;
//! transition.wait().await;
//! # Ok(())
//! # }
//! ```

mod commit;
mod config;
mod deferred;
mod error;
mod events;
mod handler;
mod handler_info;
mod match_point;
mod params;
mod partition;
mod pipeline;
mod recognizer;
mod router;
mod serializer;
mod transition;

pub mod prelude;

pub use config::{RouterConfig, UrlMethod};
pub use error::RouterError;
pub use handler::{EventOutcome, Handler, HandlerRegistry, HookOutcome, Model, SuppliedObject};
pub use params::{Params, QueryParams};
pub use recognizer::{RecognizedHandler, Recognizer, StaticRecognizer};
pub use router::{CommittedHandler, Router, RouterBuilder};
pub use transition::{Outcome, Transition};
