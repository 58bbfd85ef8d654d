//! Where the configuration comes from
//!
//! Exactly one source is used per resolution: the platform environment when
//! both platform variables are set, otherwise the first override file that
//! exists.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::env::{Environment, METADATA_VAR, PORT_VAR, SERVICES_VAR};
use crate::error::{Error, Result, SourceLocation};
use crate::value::Value;

/// Override file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Pick the format for a file by extension (case-insensitive)
    ///
    /// YAML extensions only map to a format when `yaml_support` is on.
    pub fn from_path(path: &Path, yaml_support: bool) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Format::Json)
        } else if yaml_support
            && (ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
        {
            Some(Format::Yaml)
        } else {
            None
        }
    }

    /// Parse file content; `path` is only used for error locations
    pub fn parse(self, path: &Path, content: &str) -> Result<Value> {
        let value: Value = match self {
            Format::Json => serde_json::from_str(content).map_err(|e| Error::json(path, &e))?,
            Format::Yaml => serde_yaml::from_str(content).map_err(|e| Error::yaml(path, &e))?,
        };

        if value.is_null() {
            // An empty YAML document
            Ok(Value::Mapping(IndexMap::new()))
        } else if value.is_mapping() {
            Ok(value)
        } else {
            Err(Error::parse(format!(
                "Configuration root must be a mapping, got {}",
                value.type_name()
            ))
            .with_source_location(SourceLocation::file(path)))
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Yaml => write!(f, "yaml"),
        }
    }
}

/// Origin of a resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Platform environment variables
    Platform,
    /// A local override file
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Platform => write!(f, "platform environment"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A parsed, not yet validated, configuration source
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionSource {
    /// Platform Mode: metadata and services payloads, plus the port override
    Platform {
        metadata: Value,
        services: Value,
        port: Option<u16>,
    },
    /// Local Mode: the first existing override file
    LocalFile {
        path: PathBuf,
        format: Format,
        document: Value,
    },
}

impl ResolutionSource {
    /// Select and load the configuration source
    pub fn detect<P: AsRef<Path>>(
        env: &dyn Environment,
        override_paths: &[P],
        yaml_support: bool,
    ) -> Result<Self> {
        match (env.var(METADATA_VAR), env.var(SERVICES_VAR)) {
            (Some(metadata), Some(services)) => {
                log::debug!(
                    "{} and {} are set, running on the platform",
                    METADATA_VAR,
                    SERVICES_VAR
                );
                Self::from_platform(&metadata, &services, env.var(PORT_VAR).as_deref())
            }
            _ => Self::from_override_paths(override_paths, yaml_support),
        }
    }

    /// Parse the platform payloads
    pub fn from_platform(metadata: &str, services: &str, port: Option<&str>) -> Result<Self> {
        let metadata = parse_platform_object(METADATA_VAR, metadata)?;
        let services = parse_platform_object(SERVICES_VAR, services)?;

        let port = port
            .map(|p| {
                p.trim().parse::<u16>().map_err(|_| {
                    Error::invalid_value(PORT_VAR, "port number", format!("\"{}\"", p))
                })
            })
            .transpose()?;

        Ok(ResolutionSource::Platform {
            metadata,
            services,
            port,
        })
    }

    /// Load the first override file that exists
    ///
    /// An existing file ends the scan even when it can't be read or parsed.
    pub fn from_override_paths<P: AsRef<Path>>(
        override_paths: &[P],
        yaml_support: bool,
    ) -> Result<Self> {
        for path in override_paths.iter().map(AsRef::as_ref) {
            if !path.exists() {
                log::trace!("Override file {} does not exist, skipping", path.display());
                continue;
            }

            let format = Format::from_path(path, yaml_support)
                .ok_or_else(|| Error::unsupported_format(path, yaml_support))?;
            let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, &e))?;
            let document = format.parse(path, &content)?;

            log::debug!(
                "Loaded {} override configuration from {}",
                format,
                path.display()
            );
            return Ok(ResolutionSource::LocalFile {
                path: path.to_path_buf(),
                format,
                document,
            });
        }

        Err(Error::no_configuration_found(override_paths))
    }

    /// Where this source came from
    pub fn origin(&self) -> ConfigSource {
        match self {
            ResolutionSource::Platform { .. } => ConfigSource::Platform,
            ResolutionSource::LocalFile { path, .. } => ConfigSource::File(path.clone()),
        }
    }
}

fn parse_platform_object(variable: &str, payload: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| Error::malformed_platform_data(variable, e.to_string()))?;
    if !value.is_mapping() {
        return Err(Error::malformed_platform_data(
            variable,
            format!("Expected a JSON object, got {}", value.type_name()),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnvironment;
    use crate::error::ErrorKind;

    const APP_JSON: &str = r#"{"application":{"name":"test","version":1,"workspace":"Test","workspace_stub":"test"}}"#;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a.json"), false), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("a.JSON"), false), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("a.yml"), true), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("a.yaml"), true), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("a.yml"), false), None);
        assert_eq!(Format::from_path(Path::new("a.toml"), true), None);
        assert_eq!(Format::from_path(Path::new("json"), true), None);
    }

    #[test]
    fn test_parse_rejects_non_mapping_root() {
        let err = Format::Json.parse(Path::new("a.json"), "[1, 2]").unwrap_err();

        assert_eq!(err.kind, ErrorKind::ParseFailure);
        assert!(err.cause.unwrap().contains("got sequence"));
    }

    #[test]
    fn test_parse_empty_yaml_is_empty_mapping() {
        let value = Format::Yaml.parse(Path::new("a.yml"), "").unwrap();
        assert_eq!(value, Value::Mapping(IndexMap::new()));
    }

    #[test]
    fn test_parse_invalid_yaml_has_location() {
        let err = Format::Yaml
            .parse(Path::new("bad.yml"), "application:\n  name: [unclosed\n")
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::ParseFailure);
        assert_eq!(err.source_location.unwrap().file, "bad.yml");
    }

    #[test]
    fn test_platform_requires_both_variables() {
        let env = MapEnvironment::new().with(METADATA_VAR, APP_JSON);
        let none: [PathBuf; 0] = [];

        let err = ResolutionSource::detect(&env, &none, false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoConfigurationFound);
    }

    #[test]
    fn test_platform_empty_variable_counts_as_present() {
        let env = MapEnvironment::new()
            .with(METADATA_VAR, APP_JSON)
            .with(SERVICES_VAR, "");
        let none: [PathBuf; 0] = [];

        let err = ResolutionSource::detect(&env, &none, false).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MalformedPlatformData {
                variable: SERVICES_VAR.into()
            }
        );
    }

    #[test]
    fn test_platform_payload_must_be_object() {
        let err = ResolutionSource::from_platform("[]", "{}", None).unwrap_err();

        assert_eq!(
            err.kind,
            ErrorKind::MalformedPlatformData {
                variable: METADATA_VAR.into()
            }
        );
    }

    #[test]
    fn test_platform_port() {
        let source = ResolutionSource::from_platform(APP_JSON, "{}", Some("42600")).unwrap();
        assert!(matches!(
            source,
            ResolutionSource::Platform {
                port: Some(42600),
                ..
            }
        ));

        let source = ResolutionSource::from_platform(APP_JSON, "{}", None).unwrap();
        assert!(matches!(source, ResolutionSource::Platform { port: None, .. }));
        assert_eq!(source.origin(), ConfigSource::Platform);
    }

    #[test]
    fn test_platform_port_must_be_a_port_number() {
        let err = ResolutionSource::from_platform(APP_JSON, "{}", Some("eighty")).unwrap_err();
        assert_eq!(err.path, Some(PORT_VAR.into()));
        assert!(matches!(err.kind, ErrorKind::InvalidValue { .. }));

        assert!(ResolutionSource::from_platform(APP_JSON, "{}", Some("70000")).is_err());
    }

    #[test]
    fn test_first_existing_file_wins() {
        let dir = temp_dir("paasconf_test_source_first");
        let first = dir.join("first.json");
        let second = dir.join("second.json");
        std::fs::write(&first, APP_JSON).unwrap();
        std::fs::write(&second, "not json").unwrap();

        let paths = vec![dir.join("missing.json"), first.clone(), second];
        let source = ResolutionSource::from_override_paths(&paths, false).unwrap();

        assert_eq!(source.origin(), ConfigSource::File(first));
        assert!(matches!(
            source,
            ResolutionSource::LocalFile {
                format: Format::Json,
                ..
            }
        ));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unsupported_extension_stops_scan() {
        let dir = temp_dir("paasconf_test_source_unsupported");
        let ini = dir.join("app.ini");
        let json = dir.join("app.json");
        std::fs::write(&ini, "name = test").unwrap();
        std::fs::write(&json, APP_JSON).unwrap();

        let err = ResolutionSource::from_override_paths(&[ini, json], true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedFormat);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let dir = temp_dir("paasconf_test_source_io");
        let as_dir = dir.join("config.json");
        std::fs::create_dir_all(&as_dir).unwrap();

        let err = ResolutionSource::from_override_paths(&[as_dir], false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);

        std::fs::remove_dir_all(&dir).ok();
    }
}
