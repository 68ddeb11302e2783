//! Controllers: grouping actions under a prefix and attaching filters.
//!
//! Implementing [`Controller`] is how a type becomes a controller. Its
//! [`define`](Controller::define) body plays the role of the annotations:
//! every call on [`ControllerDef`] records metadata about the controller,
//! and nothing is resolved until the app is built.
//!
//! ```rust
//! use castor::{BoxError, Context, Controller, ControllerDef, Filter, FilterOptions, Flow};
//!
//! struct ChangeFilter;
//!
//! impl Filter for ChangeFilter {
//!     async fn handle(&self, mut cx: Context) -> Result<Flow, BoxError> {
//!         cx.data_mut().insert("changed", true);
//!         Ok(cx.next())
//!     }
//! }
//!
//! struct Users2Controller;
//!
//! impl Controller for Users2Controller {
//!     fn define(def: &mut ControllerDef<'_, Self>) {
//!         def.prefix("/2")
//!             .before::<ChangeFilter>(FilterOptions::only(["show1Action"]))
//!             .get("/users1", "show1Action", show)
//!             .get("/users2", "show2Action", show);
//!     }
//! }
//!
//! async fn show(cx: Context) -> Flow {
//!     let data = cx.data().clone();
//!     cx.respond(data)
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::filter::{Filter, FilterRef};
use crate::handler::{BoxedHandler, Handler};
use crate::metadata::{Key, MetadataStore, Target};
use crate::method::Method;
use crate::scope::FilterOptions;

const PREFIX: Key<String> = Key::scalar("controller.prefix");
const ACTIONS: Key<&'static str> = Key::list("controller.actions");
const BEFORE_FILTERS: Key<FilterBinding> = Key::list("controller.before_filters");
const AFTER_FILTERS: Key<FilterBinding> = Key::list("controller.after_filters");
const ROUTE: Key<ActionMeta> = Key::scalar("action.route");

/// A type whose actions are served under a common prefix.
pub trait Controller: 'static {
    fn define(def: &mut ControllerDef<'_, Self>)
    where
        Self: Sized;
}

/// One declared action.
#[derive(Clone)]
pub struct ActionMeta {
    pub name: &'static str,
    pub method: Method,
    pub path: String,
    pub handler: BoxedHandler,
}

impl fmt::Debug for ActionMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionMeta")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// One `before`/`after` attachment of a filter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilterBinding {
    pub filter: FilterRef,
    pub options: FilterOptions,
}

/// Everything recorded about one controller, read back from the store.
#[derive(Clone, Debug)]
pub struct ControllerMeta {
    pub name: &'static str,
    pub prefix: String,
    pub actions: Vec<ActionMeta>,
    pub before_filters: Vec<FilterBinding>,
    pub after_filters: Vec<FilterBinding>,
}

impl ControllerMeta {
    /// Assembles the descriptor for `target`.
    ///
    /// Missing pieces read as empty: no prefix is `""`, no actions is an
    /// empty list. A name declared twice appears twice, pointing at the last
    /// declaration; bootstrap rejects it.
    pub fn read(store: &MetadataStore, target: Target) -> Self {
        let target = target.owner();
        let actions = store
            .get_all(target, &ACTIONS)
            .filter_map(|&name| store.get(target.with_member(name), &ROUTE))
            .cloned()
            .collect();

        Self {
            name: target.short_name(),
            prefix: store.get(target, &PREFIX).cloned().unwrap_or_default(),
            actions,
            before_filters: store.get_all(target, &BEFORE_FILTERS).cloned().collect(),
            after_filters: store.get_all(target, &AFTER_FILTERS).cloned().collect(),
        }
    }
}

/// Definition-time surface for a controller `C`.
///
/// Obtained from [`App::controller`](crate::App::controller). Every method
/// returns `&mut Self` so declarations chain.
pub struct ControllerDef<'a, C> {
    store: &'a mut MetadataStore,
    _controller: PhantomData<fn() -> C>,
}

impl<'a, C: 'static> ControllerDef<'a, C> {
    pub(crate) fn new(store: &'a mut MetadataStore) -> Self {
        Self { store, _controller: PhantomData }
    }

    fn target() -> Target { Target::of::<C>() }

    /// Path prefix for every action. The last call wins.
    pub fn prefix(&mut self, prefix: &str) -> &mut Self {
        self.store.record(Self::target(), &PREFIX, prefix.to_owned());
        self
    }

    /// Declares action `name` answering `method` on `path` (relative to the prefix).
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        name: &'static str,
        handler: impl Handler,
    ) -> &mut Self {
        let action = ActionMeta {
            name,
            method,
            path: path.to_owned(),
            handler: handler.into_boxed_handler(),
        };
        self.store.record(Self::target(), &ACTIONS, name);
        self.store.record(Target::member::<C>(name), &ROUTE, action);
        self
    }

    pub fn get(&mut self, path: &str, name: &'static str, handler: impl Handler) -> &mut Self {
        self.route(Method::Get, path, name, handler)
    }

    pub fn post(&mut self, path: &str, name: &'static str, handler: impl Handler) -> &mut Self {
        self.route(Method::Post, path, name, handler)
    }

    pub fn put(&mut self, path: &str, name: &'static str, handler: impl Handler) -> &mut Self {
        self.route(Method::Put, path, name, handler)
    }

    pub fn patch(&mut self, path: &str, name: &'static str, handler: impl Handler) -> &mut Self {
        self.route(Method::Patch, path, name, handler)
    }

    pub fn delete(&mut self, path: &str, name: &'static str, handler: impl Handler) -> &mut Self {
        self.route(Method::Delete, path, name, handler)
    }

    pub fn head(&mut self, path: &str, name: &'static str, handler: impl Handler) -> &mut Self {
        self.route(Method::Head, path, name, handler)
    }

    pub fn options(&mut self, path: &str, name: &'static str, handler: impl Handler) -> &mut Self {
        self.route(Method::Options, path, name, handler)
    }

    /// Runs filter `F` ahead of the actions selected by `options`.
    pub fn before<F: Filter>(&mut self, options: FilterOptions) -> &mut Self {
        let binding = FilterBinding { filter: FilterRef::of::<F>(), options };
        self.store.record(Self::target(), &BEFORE_FILTERS, binding);
        self
    }

    /// Runs filter `F` after the actions selected by `options`, for requests
    /// whose action hands control on instead of responding.
    pub fn after<F: Filter>(&mut self, options: FilterOptions) -> &mut Self {
        let binding = FilterBinding { filter: FilterRef::of::<F>(), options };
        self.store.record(Self::target(), &AFTER_FILTERS, binding);
        self
    }
}
