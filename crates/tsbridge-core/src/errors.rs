use std::path::PathBuf;

/// Parsing failure with a 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranspileError {
    #[error("unsupported construct in {declaration}: {detail}")]
    Unsupported { declaration: String, detail: String },

    #[error("invalid map key in {declaration}: {key} is not a scalar type")]
    InvalidMapKey { declaration: String, key: String },

    #[error("enum {declaration}: value of {member} does not fit in i64")]
    EnumOverflow { declaration: String, member: String },

    #[error("unknown target '{0}' (expected rust, proto or schema)")]
    UnknownTarget(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse error in {path}:{source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Transpile(#[from] TranspileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
