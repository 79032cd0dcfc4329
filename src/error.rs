//! Error taxonomy for opn.
//!
//! `InvalidArgument`, `UnsupportedPlatform` and `UnsupportedFeature` are raised
//! before anything is spawned. `SpawnFailure` and `NonzeroExit` come from the
//! process runner. `Aggregate` wraps every candidate failure of a fallback list.

use std::fmt;
use std::io;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, OpenError>;

/// Everything that can go wrong while opening a target.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    /// Bad target or app arguments (synchronous, nothing spawned)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The app registry has no entry for this OS / architecture
    #[error("`{key}` is not supported on {platform}")]
    UnsupportedPlatform { key: String, platform: String },

    /// The resolved app cannot provide the requested capability
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// The OS could not start the process
    #[error("cannot spawn `{command}`: {source}")]
    SpawnFailure {
        command: String,
        #[source]
        source: io::Error,
    },

    /// A waited process exited unsuccessfully (`code` is `None` when killed by a signal)
    #[error("`{command}` exited with {}", exit_code_label(.code))]
    NonzeroExit { command: String, code: Option<i32> },

    /// All candidates of a fallback list failed
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Waiting on or querying a process failed after it was spawned
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Config file could not be read, parsed or written
    #[error("config error: {0}")]
    Config(String),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

impl OpenError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::UnsupportedPlatform { .. } => "UnsupportedPlatform",
            Self::UnsupportedFeature(_) => "UnsupportedFeature",
            Self::SpawnFailure { .. } => "SpawnFailure",
            Self::NonzeroExit { .. } => "NonzeroExit",
            Self::Aggregate(_) => "AggregateFailure",
            Self::Io(_) => "Io",
            Self::Config(_) => "Config",
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// One error per failed candidate, in attempt order.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<OpenError>,
}

impl AggregateError {
    pub fn new(errors: Vec<OpenError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[OpenError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<OpenError> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no candidate app could be opened ({} attempts)",
            self.errors.len()
        )?;
        for (idx, err) in self.errors.iter().enumerate() {
            write!(f, "\n  {}. {}", idx + 1, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}
