//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. Every leaf is a frozen
//! [`Chain`]; the router never rebuilds or reorders one after bootstrap.

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;
use matchit::Router as MatchitRouter;
use tracing::{error, warn};

use crate::chain::{Chain, Completion};
use crate::context::Context;
use crate::error::ConfigError;
use crate::method::Method;
use crate::pipeline::Route;
use crate::request::Request;
use crate::response::Response;

/// The application router, produced by [`App::build`](crate::App::build).
///
/// Pass it to [`Server::serve`](crate::Server::serve), or call
/// [`dispatch`](Router::dispatch) directly to run requests in-process.
#[derive(Default)]
pub struct Router {
    trees: HashMap<Method, MatchitRouter<Arc<Chain>>>,
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self { Self::default() }

    /// Registers one `(method, path, chain)` triple.
    ///
    /// Path parameters use `{name}` syntax. Overlapping or malformed paths
    /// are rejected with [`ConfigError::InvalidRoute`].
    pub fn route(&mut self, route: Route) -> Result<(), ConfigError> {
        self.trees
            .entry(route.method)
            .or_default()
            .insert(route.path.clone(), Arc::clone(&route.chain))
            .map_err(|e| ConfigError::InvalidRoute {
                method: route.method.to_string(),
                path: route.path.clone(),
                reason: e.to_string(),
            })?;
        self.routes.push(route);
        Ok(())
    }

    /// Every registration, in the order controllers and actions were declared.
    pub fn routes(&self) -> &[Route] { &self.routes }

    pub(crate) fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(Arc<Chain>, HashMap<String, String>)> {
        let tree = self.trees.get(&method)?;
        let matched = tree.at(path).ok()?;
        let chain = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((chain, params))
    }

    /// Routes one request through its chain and produces one response.
    ///
    /// - no route: `404 Not Found`
    /// - chain responded: that response
    /// - chain exhausted without a response: `500`, logged as a warning
    /// - a filter or action failed: `500`, logged as an error
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let method = req.method();
        let path = req.path().to_owned();

        let Some((chain, params)) = self.lookup(method, &path) else {
            return Response::status(StatusCode::NOT_FOUND);
        };
        req.set_params(params);

        let cx = Context::new(req, chain.action());
        match chain.run(cx).await {
            Ok(Completion::Responded(response)) => response,
            Ok(Completion::Exhausted(_)) => {
                warn!(%method, %path, action = chain.action(), "chain finished without a response");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Err(e) => {
                error!(%method, %path, action = chain.action(), "{e}");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
