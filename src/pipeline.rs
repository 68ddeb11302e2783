//! Turns controller descriptors into one frozen chain per action.
//!
//! For every action the chain is
//! `[matching before-filters] ++ [action] ++ [matching after-filters]`,
//! each group in binding declaration order. Building is a pure function of
//! the descriptor and the registry: the same declarations always produce the
//! same routes, and nothing here runs per request.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::chain::{Chain, Stage, Step};
use crate::controller::{ActionMeta, ControllerMeta, FilterBinding};
use crate::error::ConfigError;
use crate::filter::FilterRegistry;
use crate::method::Method;
use crate::scope::ScopeRule;

/// A registration handed to the router: method, full path, chain.
#[derive(Clone, Debug)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub chain: Arc<Chain>,
}

/// A binding with its filter and scope already resolved.
struct ResolvedBinding {
    step: Step,
    scope: ScopeRule,
}

fn resolve_bindings(
    controller: &str,
    bindings: &[FilterBinding],
    stage: Stage,
    registry: &FilterRegistry,
) -> Result<Vec<ResolvedBinding>, ConfigError> {
    bindings
        .iter()
        .map(|b| {
            let scope = ScopeRule::try_from(&b.options).map_err(|_| ConfigError::ConflictingScope {
                controller: controller.to_owned(),
                filter: b.filter.name().to_owned(),
            })?;
            let handler = registry.resolve(b.filter, controller)?;
            Ok(ResolvedBinding { step: Step::new(b.filter.name(), stage, handler), scope })
        })
        .collect()
}

fn scoped<'a>(
    bindings: &'a [ResolvedBinding],
    action: &'a str,
) -> impl Iterator<Item = Step> + 'a {
    bindings
        .iter()
        .filter(move |b| b.scope.matches(action))
        .map(|b| b.step.clone())
}

fn build_chain(action: &ActionMeta, before: &[ResolvedBinding], after: &[ResolvedBinding]) -> Chain {
    let steps = scoped(before, action.name)
        .chain(std::iter::once(Step::new(action.name, Stage::Action, Arc::clone(&action.handler))))
        .chain(scoped(after, action.name))
        .collect();
    Chain::new(action.name, steps)
}

/// Builds every route of one controller.
///
/// Fails on the first unresolved filter, conflicting scope, or duplicate
/// action name. Filters are resolved even when no action selects them, so a
/// dangling reference is always caught.
pub fn build_routes(meta: &ControllerMeta, registry: &FilterRegistry) -> Result<Vec<Route>, ConfigError> {
    let before = resolve_bindings(meta.name, &meta.before_filters, Stage::Before, registry)?;
    let after = resolve_bindings(meta.name, &meta.after_filters, Stage::After, registry)?;

    let mut seen = HashSet::new();
    let mut routes = Vec::with_capacity(meta.actions.len());
    for action in &meta.actions {
        if !seen.insert(action.name) {
            return Err(ConfigError::DuplicateAction {
                controller: meta.name.to_owned(),
                action: action.name.to_owned(),
            });
        }
        let chain = build_chain(action, &before, &after);
        let path = join_path(&meta.prefix, &action.path);
        debug!(
            controller = meta.name,
            method = %action.method,
            path = %path,
            chain = ?chain.labels(),
            "built route"
        );
        routes.push(Route { method: action.method, path, chain: Arc::new(chain) });
    }
    Ok(routes)
}

/// Joins a controller prefix and an action path with exactly one `/`
/// between them. An empty result is `/`.
pub fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_start_matches('/');
    let mut full = String::with_capacity(prefix.len() + path.len() + 2);
    if !prefix.is_empty() {
        full.push('/');
        full.push_str(prefix);
    }
    if !path.is_empty() {
        full.push('/');
        full.push_str(path);
    }
    if full.is_empty() {
        full.push('/');
    }
    full
}
