//! Error types for paasconf
//!
//! Every failure carries a kind, and optionally the config path it relates
//! to, the file position it was found at, the underlying cause and a help
//! message telling the user how to fix it.

use std::fmt;
use std::path::Path;

/// Result type alias for paasconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for paasconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Path in the config where the error occurred (e.g., "application.version")
    pub path: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl SourceLocation {
    /// A location naming only the file
    pub fn file(path: &Path) -> Self {
        Self {
            file: path.display().to_string(),
            line: None,
            column: None,
        }
    }

    /// Attach a 1-based line and column
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// None of the override paths exist
    #[error("No override configuration found")]
    NoConfigurationFound,
    /// The first existing override file has an extension we can't read
    #[error("Unsupported configuration file format")]
    UnsupportedFormat,
    /// The override file is not valid JSON/YAML
    #[error("Parse error")]
    ParseFailure,
    /// A platform environment payload is not a JSON object
    #[error("Malformed platform data in {variable}")]
    MalformedPlatformData { variable: String },
    /// Required top-level section is absent
    #[error("Missing required section: {0}")]
    MissingSection(String),
    /// Required key is absent from the application section
    #[error("Missing required key: {0}")]
    MissingKey(String),
    /// Requested service is not defined
    #[error("No such service: {0}")]
    ServiceNotFound(String),
    /// A value has the wrong shape
    #[error("Invalid value: expected {expected}, got {got}")]
    InvalidValue { expected: String, got: String },
    /// An existing file could not be read
    #[error("I/O error")]
    Io,
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source_location: None,
            help: None,
            cause: None,
        }
    }

    /// Create an error for an override scan that found nothing
    pub fn no_configuration_found(searched: &[impl AsRef<Path>]) -> Self {
        let cause = if searched.is_empty() {
            "No override paths were supplied".to_string()
        } else {
            let paths: Vec<String> = searched
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect();
            format!("Searched: {}", paths.join(", "))
        };
        Self {
            cause: Some(cause),
            help: Some(
                "Create one of the override files, or run on the platform with PM_METADATA and PM_SERVICES set"
                    .into(),
            ),
            ..Self::new(ErrorKind::NoConfigurationFound)
        }
    }

    /// Create an unsupported format error for a file
    pub fn unsupported_format(file: &Path, yaml_support: bool) -> Self {
        let help = if yaml_support {
            "Use a .json, .yml or .yaml override file"
        } else {
            "Use a .json override file, or enable YAML support to read .yml/.yaml files"
        };
        Self {
            source_location: Some(SourceLocation::file(file)),
            help: Some(help.into()),
            ..Self::new(ErrorKind::UnsupportedFormat)
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::ParseFailure)
        }
    }

    /// Create a parse error from a JSON parser failure
    pub fn json(file: &Path, err: &serde_json::Error) -> Self {
        let loc = if err.line() > 0 {
            SourceLocation::file(file).at(err.line(), err.column())
        } else {
            SourceLocation::file(file)
        };
        Self::parse(err.to_string()).with_source_location(loc)
    }

    /// Create a parse error from a YAML parser failure
    pub fn yaml(file: &Path, err: &serde_yaml::Error) -> Self {
        let loc = match err.location() {
            Some(l) => SourceLocation::file(file).at(l.line(), l.column()),
            None => SourceLocation::file(file),
        };
        Self::parse(err.to_string()).with_source_location(loc)
    }

    /// Create an error for a platform payload that isn't a JSON object
    pub fn malformed_platform_data(variable: impl Into<String>, message: impl Into<String>) -> Self {
        let var = variable.into();
        Self {
            help: Some(format!("{} must contain a JSON object", var)),
            cause: Some(message.into()),
            ..Self::new(ErrorKind::MalformedPlatformData { variable: var })
        }
    }

    /// Create a missing section error
    pub fn missing_section(section: impl Into<String>) -> Self {
        let s = section.into();
        Self {
            path: Some(s.clone()),
            help: Some(format!(
                "You must supply an '{}' section in your configuration",
                s
            )),
            ..Self::new(ErrorKind::MissingSection(s))
        }
    }

    /// Create a missing key error for a key of `section`
    pub fn missing_key(section: &str, key: impl Into<String>) -> Self {
        let k = key.into();
        Self {
            path: Some(format!("{}.{}", section, k)),
            help: Some(format!("Add '{}' to the {} section", k, section)),
            ..Self::new(ErrorKind::MissingKey(k))
        }
    }

    /// Create a service not found error
    pub fn service_not_found(name: impl Into<String>) -> Self {
        let n = name.into();
        Self {
            path: Some(format!("services.{}", n)),
            ..Self::new(ErrorKind::ServiceNotFound(n))
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        path: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        let expected = expected.into();
        Self {
            path: Some(path.into()),
            help: Some(format!("Ensure the value can be converted to {}", expected)),
            ..Self::new(ErrorKind::InvalidValue {
                expected,
                got: got.into(),
            })
        }
    }

    /// Create an I/O error for a file that exists but can't be read
    pub fn io(file: &Path, err: &std::io::Error) -> Self {
        Self {
            source_location: Some(SourceLocation::file(file)),
            cause: Some(err.to_string()),
            help: Some("Check that the override file is a readable UTF-8 text file".into()),
            ..Self::new(ErrorKind::Io)
        }
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{}", line)?;
                if let Some(column) = loc.column {
                    write!(f, ":{}", column)?;
                }
            }
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_key_error_display() {
        let err = Error::missing_key("application", "version");
        let display = format!("{}", err);

        assert_eq!(err.kind, ErrorKind::MissingKey("version".into()));
        assert!(display.contains("Missing required key: version"));
        assert!(display.contains("Path: application.version"));
        assert!(display.contains("Help:"));
    }

    #[test]
    fn test_missing_section_error() {
        let err = Error::missing_section("application");

        assert_eq!(err.kind, ErrorKind::MissingSection("application".into()));
        assert_eq!(err.path, Some("application".into()));
    }

    #[test]
    fn test_no_configuration_found_lists_paths() {
        let err = Error::no_configuration_found(&[
            PathBuf::from("/etc/app.json"),
            PathBuf::from("app.yml"),
        ]);
        let display = format!("{}", err);

        assert_eq!(err.kind, ErrorKind::NoConfigurationFound);
        assert!(display.contains("Searched: /etc/app.json, app.yml"));
    }

    #[test]
    fn test_no_configuration_found_empty() {
        let none: [PathBuf; 0] = [];
        let display = format!("{}", Error::no_configuration_found(&none));

        assert!(display.contains("No override paths were supplied"));
    }

    #[test]
    fn test_unsupported_format_help_depends_on_yaml_support() {
        let off = Error::unsupported_format(Path::new("app.yml"), false);
        let on = Error::unsupported_format(Path::new("app.toml"), true);

        assert!(off.help.unwrap().contains("enable YAML support"));
        assert!(!on.help.unwrap().contains("enable YAML support"));
        assert_eq!(on.source_location.unwrap().file, "app.toml");
    }

    #[test]
    fn test_json_error_has_position() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err();
        let err = Error::json(Path::new("app.json"), &err);
        let loc = err.source_location.clone().unwrap();

        assert_eq!(err.kind, ErrorKind::ParseFailure);
        assert_eq!(loc.file, "app.json");
        assert_eq!(loc.line, Some(2));
        assert!(format!("{}", err).contains("File: app.json:2"));
    }

    #[test]
    fn test_malformed_platform_data_names_variable() {
        let err = Error::malformed_platform_data("PM_METADATA", "expected an object");
        let display = format!("{}", err);

        assert!(display.contains("Malformed platform data in PM_METADATA"));
        assert!(display.contains("expected an object"));
    }

    #[test]
    fn test_service_not_found_error() {
        let err = Error::service_not_found("database");

        assert_eq!(err.kind, ErrorKind::ServiceNotFound("database".into()));
        assert!(format!("{}", err).contains("No such service: database"));
    }

    #[test]
    fn test_invalid_value_error_display() {
        let err = Error::invalid_value("port", "integer", "string (\"http\")");
        let display = format!("{}", err);

        assert!(display.contains("Invalid value: expected integer, got string (\"http\")"));
        assert!(display.contains("Path: port"));
    }

    #[test]
    fn test_with_help() {
        let err = Error::parse("bad input").with_help("Try fixing the syntax");
        let display = format!("{}", err);

        assert!(display.contains("Help: Try fixing the syntax"));
    }
}
