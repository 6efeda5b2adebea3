//! Error types.
//!
//! [`AzureError`] covers a single provider call. [`Error`] is what a run
//! returns; every variant of it is fatal. Recoverable conditions (a region
//! whose target vanished, a rejected subnet update) never become an
//! [`Error`], they are recorded as outcomes in the run report.

use thiserror::Error;

/// Failure of one call against the cloud provider.
#[derive(Debug, Error)]
pub enum AzureError {
    #[error("failed to execute `{cmd}`: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{cmd}` failed (exit code {code:?}): {stderr}")]
    Command {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("response too large: {len} bytes for `{cmd}`")]
    ResponseTooLarge { cmd: String, len: usize },

    #[error("invalid UTF-8 in output of `{cmd}`")]
    Utf8 { cmd: String },

    #[error("error parsing {what}: path={path} error={message}")]
    Parse {
        what: String,
        path: String,
        message: String,
    },

    #[error("request rejected: {0}")]
    Rejected(String),
}

impl AzureError {
    pub(crate) fn parse(
        what: impl Into<String>,
        err: serde_path_to_error::Error<serde_json::Error>,
    ) -> Self {
        AzureError::Parse {
            what: what.into(),
            path: err.path().to_string(),
            message: err.inner().to_string(),
        }
    }
}

/// A declared region target that could not be resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub region: String,
    pub target: String,
}

impl std::fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "region '{}': target {} not found", self.region, self.target)
    }
}

/// Fatal run errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no active Azure session, run `az login` first")]
    Connectivity(#[source] AzureError),

    #[error("subscription '{id}' is invalid or inaccessible")]
    Subscription {
        id: String,
        #[source]
        source: AzureError,
    },

    #[error("{} declared target(s) failed validation", .0.len())]
    TargetValidation(Vec<TargetFailure>),

    #[error("policy file {path}: {message}")]
    Policy { path: String, message: String },

    #[error("snapshot file {path}: {message}")]
    Snapshot { path: String, message: String },

    #[error("export to {path} failed: {message}")]
    Export { path: String, message: String },

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Azure(#[from] AzureError),
}
