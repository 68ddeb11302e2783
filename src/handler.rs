//! Handler trait and type erasure.
//!
//! # How chain entries are stored
//!
//! A chain mixes filters and actions of different concrete types, so every
//! entry is hidden behind one trait object (`dyn ErasedHandler`):
//!
//! ```text
//! async fn show(cx: Context) -> Flow { … }   ← user writes this
//!        ↓ def.get("/users/1", "showAction", show)
//! show.into_boxed_handler()                   ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                   ← stored as BoxedHandler
//!        ↓
//! handler.call(cx)  at request time           ← one vtable dispatch
//! ```
//!
//! Filters take the same path through [`FilterHandler`](crate::filter),
//! which is why a chain is nothing more than a `Vec<BoxedHandler>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::chain::Flow;
use crate::context::Context;
use crate::error::BoxError;

/// A heap-allocated, type-erased future resolving to the middleware's decision.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Result<Flow, BoxError>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, cx: Context) -> BoxFuture;
}

/// A type-erased chain entry shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── IntoFlow ──────────────────────────────────────────────────────────────────

/// What an action may return: a bare [`Flow`], or a `Result` whose error
/// aborts the request.
pub trait IntoFlow {
    fn into_flow(self) -> Result<Flow, BoxError>;
}

impl IntoFlow for Flow {
    fn into_flow(self) -> Result<Flow, BoxError> { Ok(self) }
}

impl<E> IntoFlow for Result<Flow, E>
where
    E: Into<BoxError>,
{
    fn into_flow(self) -> Result<Flow, BoxError> { self.map_err(Into::into) }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid action.
///
/// You never implement this yourself. It is satisfied for any `async fn`
/// (or closure returning a future) with the signature:
///
/// ```text
/// async fn name(cx: Context) -> Flow
/// async fn name(cx: Context) -> Result<Flow, E>
/// ```
///
/// The trait is sealed so only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFlow + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFlow + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Bridges a concrete action `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFlow + Send + 'static,
{
    fn call(&self, cx: Context) -> BoxFuture {
        let fut = (self.0)(cx);
        Box::pin(async move { fut.await.into_flow() })
    }
}
