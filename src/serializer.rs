//! Component C: turning a handler's resolved model back into a flat param
//! map, and validating a request's query params against a handler's
//! (and its ancestors') allow-list before `generate` touches the recognizer.

use crate::handler::{Handler, Model};
use crate::params::{Params, QueryParams};
use crate::recognizer::RecognizedHandler;

/// The rule applied when a handler has no custom [`Handler::serialize`]: the
/// model must itself be a stringifiable primitive.
///
/// The original duck-typed default additionally special-cases a lone name
/// ending in `_id` by reading an `.id` property off the model object — that
/// relies on structural reflection this crate's type-erased `Model` doesn't
/// have. A host that needs that shape implements `serialize` itself; this
/// fallback only covers the case where the model already *is* the param.
pub fn serialize_default(model: &Model, names: &[String]) -> Option<Params> {
    let [name] = names else { return None };
    let value = if let Some(s) = model.downcast_ref::<String>() {
        s.clone()
    } else if let Some(n) = model.downcast_ref::<u64>() {
        n.to_string()
    } else if let Some(n) = model.downcast_ref::<i64>() {
        n.to_string()
    } else if let Some(n) = model.downcast_ref::<u32>() {
        n.to_string()
    } else {
        return None;
    };
    Some(Params::from([(name.clone(), value)]))
}

/// Serialize `model` into its param slice, preferring the handler's own
/// `serialize` over [`serialize_default`].
pub fn serialize_handler(handler: &dyn Handler, model: &Model, names: &[String]) -> Option<Params> {
    handler.serialize(model, names).or_else(|| serialize_default(model, names))
}

/// The query-param allow-list valid for `name`: the union of the allow-lists
/// of `name` and every ancestor preceding it in `chain`.
pub fn query_params_for_handler(chain: &[RecognizedHandler], name: &str) -> Vec<String> {
    let mut allowed = Vec::new();
    for h in chain {
        allowed.extend(h.query_params.iter().cloned());
        if h.handler == name {
            break;
        }
    }
    allowed
}

/// Reject any `query_params` key outside `allow_list`, naming the offending
/// key — the synchronous "programmer error" `generate` must surface.
pub fn validate_query_params(
    name: &str,
    query_params: &QueryParams,
    allow_list: &[String],
) -> Result<(), crate::error::RouterError> {
    for key in query_params.keys() {
        if !allow_list.iter().any(|allowed| allowed == key) {
            return Err(crate::error::RouterError::InvalidQueryParam {
                handler: name.to_string(),
                key: key.clone(),
            });
        }
    }
    Ok(())
}
