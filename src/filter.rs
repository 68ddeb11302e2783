//! Reusable filters and the registry that resolves them at bootstrap.
//!
//! A filter is any type implementing [`Filter`]. It is registered once on
//! the [`App`](crate::App) and then attached to controllers by type with
//! `before::<F>()` / `after::<F>()`. Attachments are only resolved against
//! the registry during bootstrap, so a controller may name a filter before
//! it has been registered.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::chain::Flow;
use crate::context::Context;
use crate::error::{BoxError, ConfigError};
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::metadata::short_type_name;

/// A unit of middleware attachable before or after a controller's actions.
///
/// ```rust
/// use castor::{Context, Filter, Flow, BoxError};
///
/// struct UserFilter;
///
/// impl Filter for UserFilter {
///     async fn handle(&self, mut cx: Context) -> Result<Flow, BoxError> {
///         cx.data_mut().insert("username", "Jack");
///         Ok(cx.next())
///     }
/// }
/// ```
pub trait Filter: Send + Sync + 'static {
    fn handle(&self, cx: Context) -> impl Future<Output = Result<Flow, BoxError>> + Send;
}

/// Identifies a filter type without holding an instance.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct FilterRef {
    type_id: TypeId,
    type_name: &'static str,
}

impl FilterRef {
    pub fn of<F: Filter>() -> Self {
        Self { type_id: TypeId::of::<F>(), type_name: type_name::<F>() }
    }

    /// Unqualified type name, e.g. `ChangeFilter`.
    pub fn name(&self) -> &'static str { short_type_name(self.type_name) }
}

impl fmt::Debug for FilterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Adapts a registered filter instance to a chain entry.
struct FilterHandler<F>(Arc<F>);

impl<F: Filter> ErasedHandler for FilterHandler<F> {
    fn call(&self, cx: Context) -> BoxFuture {
        let filter = Arc::clone(&self.0);
        Box::pin(async move { filter.handle(cx).await })
    }
}

struct Registered {
    // Kept to recognise re-registration of the same instance.
    instance: Arc<dyn Any + Send + Sync>,
    handler: BoxedHandler,
}

/// Registered filters, keyed by type.
#[derive(Default)]
pub struct FilterRegistry {
    filters: HashMap<FilterRef, Registered>,
}

impl FilterRegistry {
    pub fn new() -> Self { Self::default() }

    /// Registers `filter` under its type.
    ///
    /// Registering the very same `Arc` again is a no-op, as is registering a
    /// zero-sized filter type twice. Any other instance of an already
    /// registered type is a [`ConfigError::DuplicateFilter`].
    pub fn register<F: Filter>(&mut self, filter: Arc<F>) -> Result<(), ConfigError> {
        let key = FilterRef::of::<F>();
        if let Some(existing) = self.filters.get(&key) {
            let instance: Arc<dyn Any + Send + Sync> = filter;
            if size_of::<F>() == 0 || Arc::ptr_eq(&existing.instance, &instance) {
                return Ok(());
            }
            return Err(ConfigError::DuplicateFilter { filter: key.name().to_owned() });
        }
        let handler: BoxedHandler = Arc::new(FilterHandler(Arc::clone(&filter)));
        self.filters.insert(key, Registered { instance: filter, handler });
        Ok(())
    }

    /// Looks up the chain entry for `filter`.
    ///
    /// `controller` only feeds the error message.
    pub fn resolve(&self, filter: FilterRef, controller: &str) -> Result<BoxedHandler, ConfigError> {
        self.filters
            .get(&filter)
            .map(|r| Arc::clone(&r.handler))
            .ok_or_else(|| ConfigError::UnresolvedFilter {
                controller: controller.to_owned(),
                filter: filter.name().to_owned(),
            })
    }

    pub fn contains(&self, filter: FilterRef) -> bool { self.filters.contains_key(&filter) }
    pub fn len(&self) -> usize { self.filters.len() }
    pub fn is_empty(&self) -> bool { self.filters.is_empty() }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.filters.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::request::Request;

    struct ChangeFilter;

    impl Filter for ChangeFilter {
        async fn handle(&self, mut cx: Context) -> Result<Flow, BoxError> {
            cx.data_mut().insert("changed", true);
            Ok(cx.next())
        }
    }

    struct OtherFilter;

    impl Filter for OtherFilter {
        async fn handle(&self, cx: Context) -> Result<Flow, BoxError> {
            Ok(cx.next())
        }
    }

    #[test]
    fn unregistered_filter_is_a_config_error() {
        let registry = FilterRegistry::new();
        let err = registry.resolve(FilterRef::of::<ChangeFilter>(), "Users2Controller").err();
        assert_eq!(
            err,
            Some(ConfigError::UnresolvedFilter {
                controller: "Users2Controller".into(),
                filter: "ChangeFilter".into(),
            })
        );
    }

    struct TagFilter(&'static str);

    impl Filter for TagFilter {
        async fn handle(&self, mut cx: Context) -> Result<Flow, BoxError> {
            cx.data_mut().insert("tag", self.0);
            Ok(cx.next())
        }
    }

    #[test]
    fn same_instance_twice_is_fine_a_second_instance_is_not() {
        let mut registry = FilterRegistry::new();
        let shared = Arc::new(TagFilter("admin"));
        registry.register(Arc::clone(&shared)).unwrap();
        registry.register(shared).unwrap();
        registry.register(Arc::new(OtherFilter)).unwrap();
        assert_eq!(registry.len(), 2);

        assert_eq!(
            registry.register(Arc::new(TagFilter("guest"))),
            Err(ConfigError::DuplicateFilter { filter: "TagFilter".into() })
        );
    }

    #[tokio::test]
    async fn stateless_filter_may_be_registered_twice() {
        let mut registry = FilterRegistry::new();
        registry.register(Arc::new(ChangeFilter)).unwrap();
        registry.register(Arc::new(ChangeFilter)).unwrap();
        assert_eq!(registry.len(), 1);

        let handler = registry.resolve(FilterRef::of::<ChangeFilter>(), "C").unwrap();
        let cx = Context::new(Request::new(Method::Get, "/"), "show1Action");
        assert!(matches!(handler.call(cx).await.unwrap(), Flow::Next(_)));
    }

    #[tokio::test]
    async fn resolved_handler_runs_the_filter() {
        let mut registry = FilterRegistry::new();
        registry.register(Arc::new(ChangeFilter)).unwrap();
        let handler = registry.resolve(FilterRef::of::<ChangeFilter>(), "C").unwrap();

        let cx = Context::new(Request::new(Method::Get, "/"), "show1Action");
        match handler.call(cx).await.unwrap() {
            Flow::Next(cx) => assert_eq!(cx.data().get("changed"), Some(&true.into())),
            Flow::Respond(_) => panic!("filter should continue"),
        }
    }
}
