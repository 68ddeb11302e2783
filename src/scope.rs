//! Which actions a filter binding applies to.

use std::collections::BTreeSet;

use serde::Deserialize;

/// Options passed when attaching a filter to a controller.
///
/// Exactly two keys are recognised, `only` and `except`, and they are
/// mutually exclusive. Setting both is caught at bootstrap. The struct
/// deserializes from the same shape, so bindings can come from config:
///
/// ```rust
/// use castor::FilterOptions;
///
/// let opts: FilterOptions = serde_json::from_str(r#"{"only":["show1Action"]}"#).unwrap();
/// assert_eq!(opts, FilterOptions::only(["show1Action"]));
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterOptions {
    #[serde(default)]
    pub only: Option<Vec<String>>,
    #[serde(default)]
    pub except: Option<Vec<String>>,
}

impl FilterOptions {
    /// Applies to every action of the controller.
    pub fn all() -> Self { Self::default() }

    pub fn only<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { only: Some(actions.into_iter().map(Into::into).collect()), except: None }
    }

    pub fn except<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { only: None, except: Some(actions.into_iter().map(Into::into).collect()) }
    }
}

/// Returned when a [`FilterOptions`] sets both `only` and `except`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConflictingScope;

/// Resolved form of [`FilterOptions`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScopeRule {
    Unscoped,
    Only(BTreeSet<String>),
    Except(BTreeSet<String>),
}

impl ScopeRule {
    /// Whether a binding with this rule runs for `action`.
    pub fn matches(&self, action: &str) -> bool {
        match self {
            Self::Unscoped => true,
            Self::Only(names) => names.contains(action),
            Self::Except(names) => !names.contains(action),
        }
    }
}

impl TryFrom<FilterOptions> for ScopeRule {
    type Error = ConflictingScope;

    fn try_from(opts: FilterOptions) -> Result<Self, Self::Error> {
        match (opts.only, opts.except) {
            (Some(_), Some(_)) => Err(ConflictingScope),
            (Some(only), None) => Ok(Self::Only(only.into_iter().collect())),
            (None, Some(except)) => Ok(Self::Except(except.into_iter().collect())),
            (None, None) => Ok(Self::Unscoped),
        }
    }
}

impl TryFrom<&FilterOptions> for ScopeRule {
    type Error = ConflictingScope;

    fn try_from(opts: &FilterOptions) -> Result<Self, Self::Error> {
        opts.clone().try_into()
    }
}
