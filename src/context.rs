//! Per-request state threaded through a chain.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::chain::Flow;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};

/// The request data bag.
///
/// Created empty for every request and owned by that request's chain alone.
/// Whatever an earlier filter inserts is visible to the action and to every
/// later filter. Serializes as a JSON object, so a filter can render it
/// straight back to the client.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Data(Map<String, Value>);

impl Data {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

    /// Inserts `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool { self.0.contains_key(key) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl IntoResponse for Data {
    fn into_response(self) -> Response { Json(self).into_response() }
}

impl IntoResponse for &Data {
    fn into_response(self) -> Response { Json(self).into_response() }
}

/// What every filter and action receives: the request, the shared
/// [`Data`] bag, and the name of the action the chain was built for.
///
/// A middleware consumes the context and gives it back through exactly one
/// of [`next`](Context::next) or [`respond`](Context::respond).
#[derive(Debug)]
pub struct Context {
    request: Request,
    data: Data,
    action: String,
}

impl Context {
    pub fn new(request: Request, action: impl Into<String>) -> Self {
        Self { request, data: Data::new(), action: action.into() }
    }

    pub fn request(&self) -> &Request { &self.request }
    pub fn data(&self) -> &Data { &self.data }
    pub fn data_mut(&mut self) -> &mut Data { &mut self.data }

    /// Name of the action this request was routed to, e.g. `"showAction"`.
    pub fn action(&self) -> &str { &self.action }

    /// Shorthand for `self.request().param(key)`.
    pub fn param(&self, key: &str) -> Option<&str> { self.request.param(key) }

    /// Hands control to the next entry of the chain.
    pub fn next(self) -> Flow {
        Flow::Next(self)
    }

    /// Ends the chain with `response`. Remaining entries, after-filters
    /// included, do not run.
    pub fn respond(self, response: impl IntoResponse) -> Flow {
        Flow::Respond(response.into_response())
    }
}
