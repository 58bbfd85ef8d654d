//! Resolved configuration
//!
//! `ResolvedConfig` is the typed, read-only view over whichever source was
//! selected. The generic tree is validated and converted once, in
//! [`ResolvedConfig::from_source`]; the accessors never fail except for
//! [`ResolvedConfig::service`].

use std::path::Path;

use indexmap::IndexMap;

use crate::env::PORT_VAR;
use crate::error::{Error, Result};
use crate::resolver::{ConfigResolver, ResolverOptions};
use crate::source::{ConfigSource, ResolutionSource};
use crate::value::Value;

/// Port used when neither the platform nor the override file supplies one
pub const DEFAULT_PORT: u16 = 9001;

/// Workspace tag naming the deployment environment
pub const ENVIRONMENT_TAG: &str = "APP_ENV";

/// Prefix used by hosts that export service credentials as variables
pub const DEFAULT_EXPORT_PREFIX: &str = "PM";

const REDACTED: &str = "[REDACTED]";

/// Keys the application section must carry, in the order they are checked
const REQUIRED_KEYS: [&str; 4] = ["name", "version", "workspace", "workspace_stub"];

/// Node or workspace tags
pub type Tags = IndexMap<String, String>;

/// Credentials of a single service
pub type Credentials = IndexMap<String, String>;

/// The application section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub version: i64,
    /// Pretty name of the workspace
    pub workspace_name: String,
    /// URL friendly workspace name
    pub workspace_stub: String,
}

impl Application {
    fn from_section(section: Option<&Value>) -> Result<Self> {
        let section = section
            .and_then(Value::as_mapping)
            .ok_or_else(|| Error::missing_section("application"))?;

        let field = |key: &str| {
            section
                .get(key)
                .ok_or_else(|| Error::missing_key("application", key))
        };
        for key in REQUIRED_KEYS {
            field(key)?;
        }

        Ok(Self {
            name: field("name")?.coerce_string("application.name")?,
            version: field("version")?.coerce_i64("application.version")?,
            workspace_name: field("workspace")?.coerce_string("application.workspace")?,
            workspace_stub: field("workspace_stub")?.coerce_string("application.workspace_stub")?,
        })
    }

    fn to_value(&self) -> Value {
        let mut map = IndexMap::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("version".into(), Value::Integer(self.version));
        map.insert("workspace".into(), Value::String(self.workspace_name.clone()));
        map.insert(
            "workspace_stub".into(),
            Value::String(self.workspace_stub.clone()),
        );
        Value::Mapping(map)
    }
}

/// Application metadata, tags and service credentials
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    on_platform: bool,
    port: u16,
    application: Application,
    node_tags: Tags,
    workspace_tags: Tags,
    services: IndexMap<String, Credentials>,
    source: ConfigSource,
}

impl ResolvedConfig {
    /// Resolve from the process environment, falling back to the first
    /// existing override file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use paasconf_core::ResolvedConfig;
    ///
    /// let config = ResolvedConfig::load(&["config/local.json", "config/local.yml"], true)?;
    /// println!("{} listening on {}", config.application_name(), config.port());
    /// # Ok::<(), paasconf_core::Error>(())
    /// ```
    pub fn load<P: AsRef<Path>>(override_paths: &[P], yaml_support: bool) -> Result<Self> {
        let options = ResolverOptions::new(override_paths).with_yaml_support(yaml_support);
        ConfigResolver::new(options).resolve()
    }

    /// Normalize and validate a loaded source
    ///
    /// The application section is checked before anything else, so a
    /// document without one always fails with `MissingSection`.
    pub fn from_source(source: ResolutionSource) -> Result<Self> {
        let origin = source.origin();

        let (on_platform, document, services, platform_port) = match source {
            ResolutionSource::Platform {
                metadata,
                services,
                port,
            } => {
                if metadata.get("port").is_some() {
                    log::warn!(
                        "Ignoring 'port' in platform metadata, only {} sets the port",
                        PORT_VAR
                    );
                }
                (true, metadata, Some(services), port)
            }
            ResolutionSource::LocalFile { document, .. } => {
                let services = document.get("services").cloned();
                (false, document, services, None)
            }
        };

        let application = Application::from_section(document.get("application"))?;
        let port = if on_platform {
            platform_port
        } else {
            document.get("port").map(parse_port).transpose()?
        };
        let services = match services {
            Some(value) => parse_services(&value)?,
            None => IndexMap::new(),
        };
        let node_tags = parse_tags(&document, "node")?;
        let workspace_tags = parse_tags(&document, "workspace")?;

        log::debug!(
            "Resolved configuration for {} v{} from {}",
            application.name,
            application.version,
            origin
        );

        Ok(Self {
            on_platform,
            port: port.unwrap_or(DEFAULT_PORT),
            application,
            node_tags,
            workspace_tags,
            services,
            source: origin,
        })
    }

    /// True when the configuration came from the platform environment
    pub fn is_on_platform(&self) -> bool {
        self.on_platform
    }

    /// Where the configuration was loaded from
    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    pub fn application_name(&self) -> &str {
        &self.application.name
    }

    pub fn application_version(&self) -> i64 {
        self.application.version
    }

    /// The workspace pretty name
    pub fn workspace_name(&self) -> &str {
        &self.application.workspace_name
    }

    /// The URL friendly version of the workspace name
    pub fn workspace_stub(&self) -> &str {
        &self.application.workspace_stub
    }

    pub fn node_tags(&self) -> &Tags {
        &self.node_tags
    }

    pub fn workspace_tags(&self) -> &Tags {
        &self.workspace_tags
    }

    /// The TCP port the application should listen on
    pub fn port(&self) -> u16 {
        self.port
    }

    /// All services, keyed by name
    pub fn all_services(&self) -> &IndexMap<String, Credentials> {
        &self.services
    }

    /// Credentials for a named service
    pub fn service(&self, name: &str) -> Result<&Credentials> {
        self.services
            .get(name)
            .ok_or_else(|| Error::service_not_found(name))
    }

    /// The deployment environment from the `APP_ENV` workspace tag, or
    /// `default` when the tag is not set
    pub fn environment_name<'a>(&'a self, default: &'a str) -> &'a str {
        self.environment_name_from(ENVIRONMENT_TAG, default)
    }

    /// Like [`environment_name`](Self::environment_name), reading another tag
    pub fn environment_name_from<'a>(&'a self, tag: &str, default: &'a str) -> &'a str {
        self.workspace_tags
            .get(tag)
            .map(String::as_str)
            .unwrap_or(default)
    }

    /// Service credentials as environment variables
    ///
    /// Every credential becomes `<PREFIX>__<SERVICE>__<KEY>`, uppercased.
    /// Nothing is written to the process environment; applying the result
    /// is up to the host.
    pub fn service_env_vars(&self, prefix: &str) -> IndexMap<String, String> {
        let mut vars = IndexMap::new();
        for (service, credentials) in &self.services {
            for (key, value) in credentials {
                let name = if prefix.is_empty() {
                    format!("{}__{}", service, key)
                } else {
                    format!("{}__{}__{}", prefix, service, key)
                };
                vars.insert(name.to_uppercase(), value.clone());
            }
        }
        vars
    }

    /// The resolved view in override file shape
    ///
    /// With `redact`, every credential value is replaced by "[REDACTED]".
    /// The unredacted output can be saved and used as a local override file.
    pub fn to_value(&self, redact: bool) -> Value {
        let string_map = |map: &IndexMap<String, String>, redact: bool| {
            Value::Mapping(
                map.iter()
                    .map(|(k, v)| {
                        let v = if redact { REDACTED } else { v.as_str() };
                        (k.clone(), Value::from(v))
                    })
                    .collect(),
            )
        };

        let services = self
            .services
            .iter()
            .map(|(name, credentials)| (name.clone(), string_map(credentials, redact)))
            .collect();

        let mut root = IndexMap::new();
        root.insert("application".into(), self.application.to_value());
        root.insert("services".into(), Value::Mapping(services));
        root.insert("node".into(), string_map(&self.node_tags, false));
        root.insert("workspace".into(), string_map(&self.workspace_tags, false));
        root.insert("port".into(), Value::Integer(i64::from(self.port)));
        Value::Mapping(root)
    }

    /// Export the resolved view as YAML
    pub fn to_yaml(&self, redact: bool) -> Result<String> {
        serde_yaml::to_string(&self.to_value(redact)).map_err(|e| Error::parse(e.to_string()))
    }

    /// Export the resolved view as JSON
    pub fn to_json(&self, redact: bool) -> Result<String> {
        serde_json::to_string_pretty(&self.to_value(redact))
            .map_err(|e| Error::parse(e.to_string()))
    }
}

fn parse_port(value: &Value) -> Result<u16> {
    let port = value.coerce_i64("port")?;
    u16::try_from(port)
        .map_err(|_| Error::invalid_value("port", "port number (0-65535)", port.to_string()))
}

fn parse_tags(document: &Value, section: &str) -> Result<Tags> {
    Ok(document
        .get(section)
        .map(|v| v.coerce_string_map(section))
        .transpose()?
        .unwrap_or_default())
}

fn parse_services(value: &Value) -> Result<IndexMap<String, Credentials>> {
    match value {
        Value::Null => Ok(IndexMap::new()),
        Value::Mapping(map) => map
            .iter()
            .map(|(name, credentials)| -> Result<(String, Credentials)> {
                let path = format!("services.{}", name);
                Ok((name.clone(), credentials.coerce_string_map(&path)?))
            })
            .collect(),
        other => Err(Error::invalid_value("services", "mapping", other.type_name())),
    }
}
