//! Error types shared by the checker, registry and explorer commands.

use std::path::PathBuf;

/// Errors surfaced by the command-line tools.
///
/// The differ and the dependency extractor never produce these; only the
/// I/O, parsing and subprocess plumbing around them does.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem I/O error on a specific path.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse/serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse/serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parse error in the tool configuration.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required environment variable is not set.
    #[error("environment variable with key {0:?} not found, please set it before running this tool")]
    MissingEnv(String),

    /// The rules engine subprocess failed or exited unexpectedly.
    #[error("{0}")]
    Engine(String),

    /// Semantic validation failure (catalog names, CLI inputs).
    #[error("{0}")]
    Validation(String),

    /// A git tag that does not follow the `<name>-<semver>` convention.
    #[error("tag {0} could not be matched to a rulesfile name-version")]
    Tag(String),

    /// No engine version requirement was declared in a rules file.
    #[error("requirements for rulesfile {0:?}: requirements not found")]
    RequirementsNotFound(PathBuf),

    /// A version string that is neither semver nor an integer.
    #[error("unable to parse version {value:?}: {source}")]
    InvalidVersion {
        value: String,
        #[source]
        source: semver::Error,
    },

    /// A looked-up item does not exist.
    #[error("{0}")]
    NotFound(String),
}

/// Result alias for tool operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Combine two optional errors into one.
///
/// When both are present their messages are joined with `", "`; otherwise
/// whichever is present passes through unchanged.
pub fn err_append(left: Option<Error>, right: Option<Error>) -> Option<Error> {
    match (left, right) {
        (None, r) => r,
        (l, None) => l,
        (Some(l), Some(r)) => Some(Error::Engine(format!("{}, {}", l, r))),
    }
}
