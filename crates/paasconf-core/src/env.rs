//! Environment access
//!
//! Platform Mode is triggered and fed by environment variables. Reads go
//! through the [`Environment`] trait so resolution can be driven by the real
//! process environment or by a fixed map in tests.

use std::collections::HashMap;

/// JSON object describing the application, workspace and node
pub const METADATA_VAR: &str = "PM_METADATA";

/// JSON object of service name to credentials
pub const SERVICES_VAR: &str = "PM_SERVICES";

/// Optional TCP port the application should listen on
pub const PORT_VAR: &str = "PM_PORT";

/// Read access to environment variables.
///
/// `var` returns `None` only when the variable is unset; a variable set to
/// the empty string is `Some("")`.
pub trait Environment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The environment of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }
}

/// A fixed set of variables
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
