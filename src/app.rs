//! Application assembly and bootstrap.
//!
//! An [`App`] owns the metadata store and the filter registry for one
//! application. Controllers and filters are declared on it in any order;
//! [`App::build`] then resolves everything at once and either returns a
//! complete [`Router`] or an error, never a partly registered one.
//!
//! ```rust,no_run
//! use castor::{App, Context, Controller, ControllerDef, Flow};
//!
//! struct HelloController;
//!
//! impl Controller for HelloController {
//!     fn define(def: &mut ControllerDef<'_, Self>) {
//!         def.get("/hello", "helloAction", hello);
//!     }
//! }
//!
//! async fn hello(cx: Context) -> Flow {
//!     cx.respond("hello")
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), castor::Error> {
//!     let mut app = App::new();
//!     app.controller::<HelloController>();
//!     app.listen(3000).await
//! }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::controller::{Controller, ControllerDef, ControllerMeta};
use crate::error::{ConfigError, Error};
use crate::filter::{Filter, FilterRegistry};
use crate::metadata::{MetadataStore, Target};
use crate::pipeline::build_routes;
use crate::router::Router;
use crate::server::Server;

/// Builder for one application.
#[derive(Debug, Default)]
pub struct App {
    store: MetadataStore,
    filters: FilterRegistry,
    controllers: Vec<Target>,
    // First definition-time error; reported by `build`.
    deferred: Option<ConfigError>,
}

impl App {
    pub fn new() -> Self { Self::default() }

    /// Registers a filter instance under its type.
    pub fn filter<F: Filter>(&mut self, filter: F) -> &mut Self {
        self.filter_arc(Arc::new(filter))
    }

    /// Registers a shared filter instance. Registering the same `Arc` twice
    /// is harmless; a different instance of a registered type is an error
    /// reported by [`build`](App::build).
    pub fn filter_arc<F: Filter>(&mut self, filter: Arc<F>) -> &mut Self {
        if let Err(e) = self.filters.register(filter) {
            self.deferred.get_or_insert(e);
        }
        self
    }

    /// Declares controller `C`. Controllers are served in declaration order;
    /// declaring the same controller twice only records it once.
    pub fn controller<C: Controller>(&mut self) -> &mut Self {
        let target = Target::of::<C>();
        if self.controllers.contains(&target) {
            return self;
        }
        C::define(&mut ControllerDef::new(&mut self.store));
        self.controllers.push(target);
        self
    }

    pub fn store(&self) -> &MetadataStore { &self.store }
    pub fn filters(&self) -> &FilterRegistry { &self.filters }

    /// Descriptors of every declared controller, in declaration order.
    pub fn descriptors(&self) -> Vec<ControllerMeta> {
        self.controllers
            .iter()
            .map(|&t| ControllerMeta::read(&self.store, t))
            .collect()
    }

    /// Resolves every filter, builds every chain, and registers every route.
    pub fn build(&self) -> Result<Router, Error> {
        if let Some(e) = &self.deferred {
            return Err(e.clone().into());
        }

        let mut router = Router::new();
        for meta in self.descriptors() {
            for route in build_routes(&meta, &self.filters)? {
                router.route(route)?;
            }
        }

        info!(
            controllers = self.controllers.len(),
            filters = self.filters.len(),
            routes = router.routes().len(),
            "bootstrap complete"
        );
        Ok(router)
    }

    /// Builds the router and serves it on `0.0.0.0:port` until shutdown.
    pub async fn listen(&self, port: u16) -> Result<(), Error> {
        let router = self.build()?;
        Server::port(port).serve(router).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Flow;
    use crate::context::Context;
    use crate::error::BoxError;
    use crate::method::Method;
    use crate::request::Request;
    use crate::scope::FilterOptions;
    use http::StatusCode;

    struct UserFilter;

    impl Filter for UserFilter {
        async fn handle(&self, mut cx: Context) -> Result<Flow, BoxError> {
            cx.data_mut().insert("username", "Jack");
            Ok(cx.next())
        }
    }

    struct RenderFilter;

    impl Filter for RenderFilter {
        async fn handle(&self, cx: Context) -> Result<Flow, BoxError> {
            let data = cx.data().clone();
            Ok(cx.respond(data))
        }
    }

    struct NameFilter(&'static str);

    impl Filter for NameFilter {
        async fn handle(&self, mut cx: Context) -> Result<Flow, BoxError> {
            cx.data_mut().insert("username", self.0);
            Ok(cx.next())
        }
    }

    struct UsersController;

    impl Controller for UsersController {
        fn define(def: &mut ControllerDef<'_, Self>) {
            def.before::<UserFilter>(FilterOptions::all())
                .after::<RenderFilter>(FilterOptions::all())
                .get("/users", "indexAction", index)
                .get("/users/1", "showAction", show);
        }
    }

    async fn index(cx: Context) -> Flow {
        let name = cx.data().get("username").and_then(|v| v.as_str()).unwrap_or_default().to_owned();
        cx.respond(name)
    }

    async fn show(mut cx: Context) -> Flow {
        cx.data_mut().insert("username", "Hill");
        cx.next()
    }

    struct ConflictingController;

    impl Controller for ConflictingController {
        fn define(def: &mut ControllerDef<'_, Self>) {
            def.prefix("/bad")
                .before::<UserFilter>(FilterOptions {
                    only: Some(vec!["a".into()]),
                    except: Some(vec!["b".into()]),
                })
                .get("/a", "a", show);
        }
    }

    fn app() -> App {
        let mut app = App::new();
        app.controller::<UsersController>().filter(UserFilter).filter(RenderFilter);
        app
    }

    #[tokio::test]
    async fn before_filter_feeds_a_responding_action() {
        let router = app().build().unwrap();
        let res = router.dispatch(Request::new(Method::Get, "/users")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"Jack");
    }

    #[tokio::test]
    async fn after_filter_sees_the_action_mutation() {
        let router = app().build().unwrap();
        let res = router.dispatch(Request::new(Method::Get, "/users/1")).await;
        assert_eq!(res.body(), br#"{"username":"Hill"}"#);
    }

    #[test]
    fn missing_filter_aborts_bootstrap() {
        let mut app = App::new();
        app.controller::<UsersController>().filter(UserFilter);
        let err = app.build().err().unwrap();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnresolvedFilter { ref filter, .. }) if filter == "RenderFilter"
        ));
    }

    #[test]
    fn conflicting_scope_aborts_bootstrap() {
        let mut app = app();
        app.controller::<ConflictingController>();
        assert!(matches!(app.build(), Err(Error::Config(ConfigError::ConflictingScope { .. }))));
    }

    #[test]
    fn duplicate_filter_instance_is_reported_by_build() {
        let mut app = app();
        app.filter(NameFilter("Jack")).filter(NameFilter("Hill"));
        assert!(matches!(app.build(), Err(Error::Config(ConfigError::DuplicateFilter { .. }))));
    }

    #[test]
    fn stateless_filter_registered_twice_still_builds() {
        let mut app = app();
        app.filter(UserFilter);
        assert_eq!(app.build().unwrap().routes().len(), 2);
    }

    #[test]
    fn controller_declared_twice_is_recorded_once() {
        let mut app = app();
        app.controller::<UsersController>();
        let router = app.build().unwrap();
        assert_eq!(router.routes().len(), 2);
        assert_eq!(app.descriptors().len(), 1);
    }

    #[test]
    fn bootstrap_is_repeatable() {
        let summary = |r: &Router| -> Vec<(Method, String, Vec<String>)> {
            r.routes()
                .iter()
                .map(|rt| (rt.method, rt.path.clone(), rt.chain.labels().iter().map(|s| s.to_string()).collect()))
                .collect()
        };
        let a = app().build().unwrap();
        let b = app().build().unwrap();
        assert_eq!(summary(&a), summary(&b));
        assert_eq!(summary(&a)[1].2, ["UserFilter", "showAction", "RenderFilter"]);
    }
}
