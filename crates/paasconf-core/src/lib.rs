//! paasconf-core: Platform-aware application configuration
//!
//! At startup an application asks where it is running. On the platform, the
//! `PM_METADATA`, `PM_SERVICES` and `PM_PORT` environment variables describe
//! the application, its workspace and node, and the credentials of every
//! service bound to it. Everywhere else the same information is read from the
//! first existing local override file (JSON, or YAML when enabled).
//!
//! # Example
//!
//! ```rust
//! use paasconf_core::{ConfigResolver, MapEnvironment, ResolverOptions};
//!
//! let env = MapEnvironment::new()
//!     .with(
//!         "PM_METADATA",
//!         r#"{"application":{"name":"shop","version":4,"workspace":"Retail","workspace_stub":"retail"}}"#,
//!     )
//!     .with("PM_SERVICES", r#"{"db":{"host":"10.0.0.5","port":5432}}"#)
//!     .with("PM_PORT", "42600");
//!
//! let config = ConfigResolver::new(ResolverOptions::new(["local.json"]))
//!     .resolve_with(&env)
//!     .unwrap();
//!
//! assert!(config.is_on_platform());
//! assert_eq!(config.port(), 42600);
//! assert_eq!(config.service("db").unwrap()["port"], "5432");
//! ```

pub mod env;
pub mod error;
pub mod resolver;
pub mod source;
pub mod value;

mod config;

pub use config::{
    Application, Credentials, ResolvedConfig, Tags, DEFAULT_EXPORT_PREFIX, DEFAULT_PORT,
    ENVIRONMENT_TAG,
};
pub use env::{Environment, MapEnvironment, ProcessEnvironment};
pub use error::{Error, ErrorKind, Result};
pub use resolver::{ConfigResolver, ResolverOptions};
pub use source::{ConfigSource, Format, ResolutionSource};
pub use value::Value;
