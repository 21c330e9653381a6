//! Parameters and fixed-parameter configurations

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named model parameter
///
/// `value` is the default substitution used when a configuration does not fix
/// the parameter. `bounds` is the search range used when the parameter is left
/// free for a boundary-finding solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub bounds: Option<(f64, f64)>,
}

impl Parameter {
    /// Create a parameter with a default value
    pub fn fixed(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            unit: unit.into(),
            bounds: None,
        }
    }

    /// Create a parameter with no default value
    pub fn free(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            unit: unit.into(),
            bounds: None,
        }
    }

    /// Set the search range used when this parameter is probed
    #[must_use]
    pub fn with_bounds(mut self, lo: f64, hi: f64) -> Self {
        self.bounds = Some((lo, hi));
        self
    }
}

/// Fixed-parameter substitutions for one solve
///
/// A configuration is a value: `with` and `without` return new configurations
/// and never touch the original, so nothing leaks between sweep points or
/// between outer-loop iterations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    fixed: BTreeMap<String, f64>,
}

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `name` fixed to `value`
    #[must_use]
    pub fn with(&self, name: &str, value: f64) -> Self {
        let mut fixed = self.fixed.clone();
        fixed.insert(name.to_string(), value);
        Self { fixed }
    }

    /// Return a copy with `name` no longer fixed
    #[must_use]
    pub fn without(&self, name: &str) -> Self {
        let mut fixed = self.fixed.clone();
        fixed.remove(name);
        Self { fixed }
    }

    /// Return a copy with every entry of `other` applied on top of this one
    #[must_use]
    pub fn merged(&self, other: &Configuration) -> Self {
        let mut fixed = self.fixed.clone();
        fixed.extend(other.fixed.iter().map(|(k, v)| (k.clone(), *v)));
        Self { fixed }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fixed.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fixed.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fixed.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fixed.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fixed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            fixed: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_leaves_original_untouched() {
        let base: Configuration = [("W_pay", 800.0)].into_iter().collect();
        let next = base.with("S_runway", 300.0);

        assert_eq!(base.len(), 1);
        assert!(!base.contains("S_runway"));
        assert_eq!(next.get("S_runway"), Some(300.0));
        assert_eq!(next.get("W_pay"), Some(800.0));
    }

    #[test]
    fn test_without_and_merged() {
        let base: Configuration = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        let trimmed = base.without("a");
        assert_eq!(trimmed.names().collect::<Vec<_>>(), vec!["b"]);

        let overrides: Configuration = [("b", 5.0), ("c", 3.0)].into_iter().collect();
        let merged = base.merged(&overrides);
        assert_eq!(merged.get("a"), Some(1.0));
        assert_eq!(merged.get("b"), Some(5.0));
        assert_eq!(merged.get("c"), Some(3.0));
    }
}
