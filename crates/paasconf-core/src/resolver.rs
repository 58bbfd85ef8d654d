//! Configuration resolution entry point
//!
//! A [`ConfigResolver`] decides between Platform Mode and Local Mode and
//! produces a [`ResolvedConfig`]. Resolution happens once, at startup; the
//! result never changes.

use std::path::{Path, PathBuf};

use crate::config::ResolvedConfig;
use crate::env::{Environment, ProcessEnvironment};
use crate::error::Result;
use crate::source::ResolutionSource;

/// Options for resolving a configuration
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Override files to try, in order, when not on the platform
    pub override_paths: Vec<PathBuf>,
    /// Allow .yml/.yaml override files in addition to .json
    pub yaml_support: bool,
}

impl ResolverOptions {
    pub fn new<P: AsRef<Path>>(override_paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            override_paths: override_paths
                .into_iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
            yaml_support: false,
        }
    }

    /// Append an override path
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_paths.push(path.into());
        self
    }

    pub fn with_yaml_support(mut self, enabled: bool) -> Self {
        self.yaml_support = enabled;
        self
    }
}

/// Resolves platform metadata or a local override file into a
/// [`ResolvedConfig`]
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    options: ResolverOptions,
}

impl ConfigResolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve against the process environment
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.resolve_with(&ProcessEnvironment)
    }

    /// Resolve against the given environment
    pub fn resolve_with(&self, env: &dyn Environment) -> Result<ResolvedConfig> {
        let source = ResolutionSource::detect(
            env,
            &self.options.override_paths,
            self.options.yaml_support,
        )?;
        ResolvedConfig::from_source(source)
    }
}
