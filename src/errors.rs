//! errors returned by rbhsearch

use std::path::PathBuf;

use thiserror::Error;

use crate::tasks::{ExecutionPhase, TaskFailure};

#[derive(Error, Debug)]
pub enum RbhError {
    /// the external aligner cannot be run, nothing is generated.
    #[error("could not find {tool}, make sure it is on your system path : {source}")]
    ToolNotFound {
        tool: String,
        #[source]
        source: which::Error,
    },

    #[error("io error on {path:?} : {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parameter : {0}")]
    InvalidParameter(String),

    /// two input files give the same genome id and would write the same outputs
    #[error("genome id {id} given by both {first:?} and {second:?}")]
    DuplicateGenome {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("parameters json : {0}")]
    Json(#[from] serde_json::Error),

    #[error("task summary : {0}")]
    Summary(#[from] csv::Error),

    #[error("{phase} phase stopped at first failure, {failure}")]
    FailFast {
        phase: ExecutionPhase,
        failure: TaskFailure,
    },

    #[error("{} failure(s) in {phase} phase, first one : {}", .failures.len(), .failures[0])]
    TaskFailures {
        phase: ExecutionPhase,
        failures: Vec<TaskFailure>,
    },
}

impl RbhError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RbhError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RbhError>;
