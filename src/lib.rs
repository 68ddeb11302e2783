//! # castor
//!
//! Controllers, filters, and the chains between them, on top of a minimal
//! hyper server.
//!
//! ## The model
//!
//! - A **controller** groups actions under a path prefix.
//! - An **action** answers one method + path.
//! - A **filter** is reusable middleware, attached to a controller to run
//!   *before* or *after* its actions, optionally limited with
//!   [`FilterOptions::only`] / [`FilterOptions::except`].
//!
//! At bootstrap every action gets one frozen chain:
//!
//! ```text
//! [before-filters in scope] → action → [after-filters in scope]
//! ```
//!
//! Per request, a fresh [`Data`] bag travels down that chain inside a
//! [`Context`]. Each entry either passes the context on with
//! [`Context::next`] or ends the request with [`Context::respond`]. After
//! filters therefore only run when the action hands control on.
//!
//! What castor leaves to others: TLS, rate limiting, body-size limits,
//! routing precedence beyond what [`matchit`] does, and process config.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use castor::{App, BoxError, Context, Controller, ControllerDef, Filter, FilterOptions, Flow};
//!
//! struct UserFilter;
//!
//! impl Filter for UserFilter {
//!     async fn handle(&self, mut cx: Context) -> Result<Flow, BoxError> {
//!         cx.data_mut().insert("username", "Jack");
//!         Ok(cx.next())
//!     }
//! }
//!
//! struct UsersController;
//!
//! impl Controller for UsersController {
//!     fn define(def: &mut ControllerDef<'_, Self>) {
//!         def.before::<UserFilter>(FilterOptions::all())
//!             .get("/users", "indexAction", index);
//!     }
//! }
//!
//! async fn index(cx: Context) -> Flow {
//!     let data = cx.data().clone();
//!     cx.respond(data)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), castor::Error> {
//!     let mut app = App::new();
//!     app.filter(UserFilter).controller::<UsersController>();
//!     app.listen(3000).await
//! }
//! ```

mod app;
mod chain;
mod context;
mod controller;
mod error;
mod filter;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod scope;
mod server;

pub mod metadata;
pub mod pipeline;

pub use app::App;
pub use chain::{Chain, Completion, Flow, Stage, Step};
pub use context::{Context, Data};
pub use controller::{ActionMeta, Controller, ControllerDef, ControllerMeta, FilterBinding};
pub use error::{BoxError, ConfigError, Error, Result};
pub use filter::{Filter, FilterRef, FilterRegistry};
pub use handler::{Handler, IntoFlow};
pub use method::{Method, UnsupportedMethod};
pub use pipeline::Route;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use scope::{ConflictingScope, FilterOptions, ScopeRule};
pub use server::Server;
