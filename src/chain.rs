//! Sequential execution of one action's middleware chain.
//!
//! Each entry receives the request [`Context`] by value and must give back a
//! [`Flow`]: either the context itself (`Next`, keep walking) or a finished
//! response (`Respond`, stop here). An `Err` stops the walk as well and is
//! reported for this request only.
//!
//! ```text
//! Pending ─▶ Running(0) ─Next─▶ Running(1) ─Next─▶ … ─Next─▶ Exhausted
//!                │                  │
//!             Respond            Respond ─▶ Terminated
//!                │                  │
//!               Err                Err   ─▶ Error::Middleware
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::response::Response;

/// A middleware's decision about the rest of the chain.
#[derive(Debug)]
pub enum Flow {
    /// Continue with the next entry, handing over the context.
    Next(Context),
    /// Stop the chain and send this response.
    Respond(Response),
}

/// How a chain walk ended without error.
#[derive(Debug)]
pub enum Completion {
    /// Some entry responded. Later entries were skipped.
    Responded(Response),
    /// Every entry said `Next`; nobody produced a response.
    Exhausted(Context),
}

/// Where an entry came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    Before,
    Action,
    After,
}

/// One resolved chain entry.
#[derive(Clone)]
pub struct Step {
    label: Arc<str>,
    stage: Stage,
    handler: BoxedHandler,
}

impl Step {
    pub(crate) fn new(label: impl Into<Arc<str>>, stage: Stage, handler: BoxedHandler) -> Self {
        Self { label: label.into(), stage, handler }
    }

    pub fn label(&self) -> &str { &self.label }
    pub fn stage(&self) -> Stage { self.stage }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("label", &self.label)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

/// The frozen chain for one action: before-filters, the action, after-filters.
#[derive(Clone, Debug)]
pub struct Chain {
    action: Arc<str>,
    steps: Arc<[Step]>,
}

impl Chain {
    pub(crate) fn new(action: impl Into<Arc<str>>, steps: Vec<Step>) -> Self {
        Self { action: action.into(), steps: steps.into() }
    }

    pub fn action(&self) -> &str { &self.action }
    pub fn steps(&self) -> &[Step] { &self.steps }
    pub fn len(&self) -> usize { self.steps.len() }
    pub fn is_empty(&self) -> bool { self.steps.is_empty() }

    /// Entry labels in execution order, e.g. `["UserFilter", "showAction", "RenderFilter"]`.
    pub fn labels(&self) -> Vec<&str> {
        self.steps.iter().map(Step::label).collect()
    }

    /// Walks the chain for one request.
    ///
    /// Entries run strictly one after another; the next entry starts only
    /// once the previous one has returned `Next`.
    pub async fn run(&self, mut cx: Context) -> Result<Completion, Error> {
        for (i, step) in self.steps.iter().enumerate() {
            debug!(action = %self.action, step = %step.label, index = i, "running chain step");
            match step.handler.call(cx).await {
                Ok(Flow::Next(next)) => cx = next,
                Ok(Flow::Respond(response)) => {
                    debug!(action = %self.action, step = %step.label, "chain terminated by response");
                    return Ok(Completion::Responded(response));
                }
                Err(source) => {
                    return Err(Error::Middleware { step: step.label.to_string(), source });
                }
            }
        }
        Ok(Completion::Exhausted(cx))
    }
}
