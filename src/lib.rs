//! Launches disposable Aerospike servers inside containers for integration
//! tests.
//!
//! The library arranges calls into `testcontainers`: it builds
//! [`ContainerSettings`] from composable [`ContainerOption`]s, starts the
//! container, and exposes the mapped endpoint until the caller terminates it.

mod container;
mod error;
mod observability;
mod options;
mod settings;
#[doc(hidden)]
pub mod test_support;

#[cfg(feature = "async-api")]
pub use container::AerospikeContainerAsync;
pub use container::{AerospikeConnection, AerospikeContainer};
pub use error::{
    AerospikeContainerError, ConfigError, ConfigResult, LaunchError, LaunchErrorKind,
    LaunchResult, Result,
};
pub use options::{
    ContainerOption, with_community_edition, with_enterprise_edition, with_env, with_image,
    with_log_level, with_namespace, with_startup_timeout, with_ttl_support,
};
pub use settings::{
    AdminCommand, COMMUNITY_IMAGE, ContainerSettings, DEFAULT_NAMESPACE, DEFAULT_NSUP_PERIOD,
    DEFAULT_STARTUP_TIMEOUT, ENTERPRISE_IMAGE, LOG_LEVEL_ENV, LifecycleHook, NAMESPACE_ENV,
    SERVICE_PORT,
};

use color_eyre::eyre::eyre;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::time::Duration;

/// Captures container overrides supplied via `AEROSPIKE_TC_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, OrthoConfig, Default)]
#[ortho_config(prefix = "AEROSPIKE_TC")]
///
/// # Examples
/// ```
/// use aerospike_testcontainer::AerospikeEnvCfg;
///
/// let cfg = AerospikeEnvCfg::default();
/// assert!(cfg.image.is_none());
/// ```
pub struct AerospikeEnvCfg {
    /// Image reference replacing the community default.
    pub image: Option<String>,
    /// Namespace created when the server starts.
    pub namespace: Option<String>,
    /// Server log verbosity.
    pub log_level: Option<String>,
    /// Namespace for which expiry sweeping is enabled; empty selects `test`.
    pub ttl_namespace: Option<String>,
    /// Readiness timeout in seconds.
    pub startup_timeout_secs: Option<u64>,
}

impl AerospikeEnvCfg {
    /// Loads configuration from environment variables without parsing CLI arguments.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when a variable cannot be parsed, for
    /// example a non-numeric `AEROSPIKE_TC_STARTUP_TIMEOUT_SECS`.
    pub fn load() -> ConfigResult<Self> {
        let args = [OsString::from("aerospike-testcontainer")];
        Self::load_from_iter(args).map_err(|err| ConfigError::from(eyre!(err)))
    }

    /// Converts the configuration into the equivalent container options.
    ///
    /// Unset fields produce no option, so the defaults stay in force.
    #[must_use]
    pub fn options(&self) -> Vec<ContainerOption> {
        let mut options = Vec::new();
        if let Some(ref image) = self.image {
            options.push(with_image(image.clone()));
        }
        if let Some(ref namespace) = self.namespace {
            options.push(with_namespace(namespace.clone()));
        }
        if let Some(ref level) = self.log_level {
            options.push(with_log_level(level.clone()));
        }
        if let Some(ref namespace) = self.ttl_namespace {
            options.push(with_ttl_support(Some(namespace.as_str())));
        }
        if let Some(secs) = self.startup_timeout_secs {
            options.push(with_startup_timeout(Duration::from_secs(secs)));
        }
        options
    }

    /// Builds [`ContainerSettings`] by layering this configuration over the defaults.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when an option rejects the settings.
    pub fn to_settings(&self) -> ConfigResult<ContainerSettings> {
        let mut settings = ContainerSettings::default();
        for option in self.options() {
            option.apply(&mut settings)?;
        }
        Ok(settings)
    }
}
