//! Domain error types for launching Aerospike test containers.

use color_eyre::Report;
use thiserror::Error;

/// Result alias for operations that may return an [`AerospikeContainerError`].
pub type Result<T> = std::result::Result<T, AerospikeContainerError>;

/// Result alias for container lifecycle operations.
pub type LaunchResult<T> = std::result::Result<T, LaunchError>;

/// Result alias for configuration fallible operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level error exposed by the crate.
#[derive(Debug, Error)]
pub enum AerospikeContainerError {
    /// Indicates the container lifecycle failed.
    #[error("container launch failed")]
    Launch(#[from] LaunchError),
    /// Indicates configuration parsing or option application failed.
    #[error("configuration parsing failed")]
    Config(#[from] ConfigError),
}

/// Categorises lifecycle failures so callers can branch on structured errors.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum LaunchErrorKind {
    /// Represents errors without a more specific semantic meaning.
    #[default]
    Other,
    /// `AEROSPIKE_TC_*` configuration could not be loaded or converted.
    Configuration,
    /// A container option rejected the settings before launch.
    OptionApplication,
    /// The orchestration framework failed to create, start, or ready the container.
    Startup,
    /// The mapped service port could not be resolved.
    PortLookup,
    /// A command executed inside the container failed.
    Exec,
    /// A database client could not connect to the container.
    Connection,
    /// Stopping or removing the container failed.
    Teardown,
}

/// Captures container lifecycle failures.
#[derive(Debug, Error)]
#[error("{report}")]
pub struct LaunchError {
    kind: LaunchErrorKind,
    #[source]
    report: Report,
}

impl LaunchError {
    /// Constructs a new launch error with the provided kind and diagnostic
    /// report.
    #[must_use]
    pub const fn new(kind: LaunchErrorKind, report: Report) -> Self {
        Self { kind, report }
    }

    /// Wraps a failure to load environment configuration.
    #[must_use]
    pub fn configuration(err: ConfigError) -> Self {
        let ConfigError(report) = err;
        Self::new(LaunchErrorKind::Configuration, report)
    }

    /// Returns the semantic category for this failure.
    #[must_use]
    pub const fn kind(&self) -> LaunchErrorKind {
        self.kind
    }

    /// Extracts the underlying diagnostic report.
    pub fn into_report(self) -> Report {
        self.report
    }
}

impl From<Report> for LaunchError {
    fn from(report: Report) -> Self {
        Self::new(LaunchErrorKind::Other, report)
    }
}

impl From<ConfigError> for LaunchError {
    fn from(err: ConfigError) -> Self {
        let ConfigError(report) = err;
        Self::new(LaunchErrorKind::OptionApplication, report)
    }
}

impl From<AerospikeContainerError> for LaunchError {
    fn from(err: AerospikeContainerError) -> Self {
        match err {
            AerospikeContainerError::Launch(inner) => inner,
            AerospikeContainerError::Config(inner) => inner.into(),
        }
    }
}

/// Captures configuration failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ConfigError(#[from] Report);
