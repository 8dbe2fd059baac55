use std::path::PathBuf;

use thiserror::Error;

use crate::flows::FlowTransitionError;

/// Raised when no parseable JSON can be located in an agent reply. Callers
/// recover with the domain heuristics in `extract`; this never reaches the
/// shopper as an error message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("no json structure found in agent output")]
    NoStructure,
    #[error("json parse failed after repair: {0}")]
    Parse(String),
    #[error("structure did not match expected shape: {0}")]
    Shape(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("could not create cart directory `{path}`: {source}")]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("could not write cart file `{path}`: {source}")]
    WriteFile { path: PathBuf, source: std::io::Error },
}

/// Failures that end a session step. Search and extraction problems are
/// degraded in place and never surface through this type.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
    #[error("terminal i/o failed: {0}")]
    Terminal(#[from] std::io::Error),
}
