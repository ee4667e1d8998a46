//! Lifecycle wrapper that runs a disposable Aerospike server for tests.
//!
//! The container starts during [`AerospikeContainer::start`] and is removed by
//! [`AerospikeContainer::terminate`]. Creation, port mapping, readiness
//! polling, and post-start hooks are delegated to `testcontainers`.
//!
//! # Synchronous API
//!
//! ```no_run
//! use aerospike_testcontainer::{AerospikeContainer, with_namespace};
//!
//! # fn main() -> aerospike_testcontainer::LaunchResult<()> {
//! let container = AerospikeContainer::start([with_namespace("inventory")])?;
//! let address = container.connection()?.address();
//! // Connect an Aerospike client to `address` here.
//! container.terminate()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Async API
//!
//! Inside an existing runtime (e.g., `#[tokio::test]`), use
//! `AerospikeContainerAsync` so the blocking runner does not nest runtimes:
//!
//! ```ignore
//! use aerospike_testcontainer::{AerospikeContainerAsync, with_namespace};
//!
//! #[tokio::test]
//! async fn writes_records() -> aerospike_testcontainer::LaunchResult<()> {
//!     let container = AerospikeContainerAsync::start([with_namespace("inventory")]).await?;
//!     let port = container.service_port().await?;
//!     container.terminate().await?;
//!     Ok(())
//! }
//! ```
//!
//! The async API requires the `async-api` feature flag.

#[cfg(feature = "async-api")]
mod async_api;
mod connection;

#[cfg(feature = "async-api")]
pub use self::async_api::AerospikeContainerAsync;
pub use self::connection::AerospikeConnection;

use color_eyre::eyre::{WrapErr, eyre};
use testcontainers::core::{CmdWaitFor, ExecCommand};
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, ImageExt};
use tracing::{info, info_span, warn};

use crate::AerospikeEnvCfg;
use crate::error::{LaunchError, LaunchErrorKind, LaunchResult};
use crate::observability::LOG_TARGET;
use crate::options::ContainerOption;
use crate::settings::{ContainerSettings, SERVICE_PORT};

/// Running Aerospike container owned by the caller.
///
/// Call [`terminate`](Self::terminate) to stop and remove it. A handle that is
/// dropped without terminating still removes the container, but the failure
/// is only logged.
#[derive(Debug)]
pub struct AerospikeContainer {
    container: Option<Container<ContainerSettings>>,
    settings: ContainerSettings,
    // Keeps the container span alive for the lifetime of the handle.
    _container_span: tracing::Span,
}

impl AerospikeContainer {
    /// Starts a container from the default settings customised by `options`.
    ///
    /// Options are applied strictly in the order given. The call blocks until
    /// the readiness conditions hold and all post-start hooks have run.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind
    /// [`OptionApplication`](LaunchErrorKind::OptionApplication) when an option
    /// fails, or [`Startup`](LaunchErrorKind::Startup) when the framework
    /// cannot create or ready the container.
    pub fn start<I>(options: I) -> LaunchResult<Self>
    where
        I: IntoIterator<Item = ContainerOption>,
    {
        let settings = apply_options(ContainerSettings::default(), options)?;
        Self::start_with_settings(settings)
    }

    /// Starts a container seeded from `AEROSPIKE_TC_*` environment variables,
    /// then customised by `options`.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind
    /// [`Configuration`](LaunchErrorKind::Configuration) when the environment
    /// cannot be parsed, otherwise the errors of [`start`](Self::start).
    pub fn start_from_env<I>(options: I) -> LaunchResult<Self>
    where
        I: IntoIterator<Item = ContainerOption>,
    {
        let base = settings_from_env()?;
        let settings = apply_options(base, options)?;
        Self::start_with_settings(settings)
    }

    /// Starts a container from fully prepared settings.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind [`Startup`](LaunchErrorKind::Startup)
    /// when the framework cannot create or ready the container.
    pub fn start_with_settings(settings: ContainerSettings) -> LaunchResult<Self> {
        let span = info_span!(
            target: LOG_TARGET,
            "aerospike_container",
            image = %settings.image
        );
        let container = {
            let _entered = span.enter();
            info!(
                target: LOG_TARGET,
                namespace = settings.namespace(),
                hooks = settings.hooks.len(),
                "starting Aerospike container"
            );
            let request = settings.clone().with_startup_timeout(settings.startup_timeout);
            let started = request
                .start()
                .wrap_err_with(|| format!("failed to start Aerospike from {}", settings.image))
                .map_err(|report| LaunchError::new(LaunchErrorKind::Startup, report))?;
            info!(target: LOG_TARGET, id = started.id(), "Aerospike container ready");
            started
        };

        Ok(Self {
            container: Some(container),
            settings,
            _container_span: span,
        })
    }

    /// Returns the settings the container was launched with.
    #[must_use]
    pub const fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    /// Borrows the underlying framework container.
    ///
    /// Gives access to the lifecycle operations this wrapper does not
    /// re-expose, such as `stop`, `start`, log streams, and other port
    /// lookups.
    ///
    /// # Errors
    /// Returns an error when the handle no longer owns a container.
    pub fn container(&self) -> LaunchResult<&Container<ContainerSettings>> {
        self.inner()
    }

    /// Returns the container identifier assigned by the runtime.
    ///
    /// # Errors
    /// Returns an error when the handle no longer owns a container.
    pub fn id(&self) -> LaunchResult<&str> {
        Ok(self.inner()?.id())
    }

    /// Resolves the host address on which the mapped ports are reachable.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind
    /// [`PortLookup`](LaunchErrorKind::PortLookup) when the framework cannot
    /// report the host.
    pub fn host(&self) -> LaunchResult<String> {
        self.inner()?
            .get_host()
            .map(|host| host.to_string())
            .wrap_err("failed to fetch Aerospike host")
            .map_err(|report| LaunchError::new(LaunchErrorKind::PortLookup, report))
    }

    /// Resolves the host port mapped to the internal service port.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind
    /// [`PortLookup`](LaunchErrorKind::PortLookup) when no mapping is reported,
    /// for example because the container stopped.
    pub fn service_port(&self) -> LaunchResult<u16> {
        self.inner()?
            .get_host_port_ipv4(SERVICE_PORT)
            .wrap_err("failed to fetch Aerospike port")
            .map_err(|report| LaunchError::new(LaunchErrorKind::PortLookup, report))
    }

    /// Captures the endpoint and namespace a client needs to connect.
    ///
    /// # Errors
    /// Propagates failures from [`host`](Self::host) and
    /// [`service_port`](Self::service_port).
    pub fn connection(&self) -> LaunchResult<AerospikeConnection> {
        Ok(AerospikeConnection::new(
            self.host()?,
            self.service_port()?,
            self.settings.namespace(),
        ))
    }

    /// Runs `args` inside the container and returns its standard output.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind [`Exec`](LaunchErrorKind::Exec) when
    /// the command cannot be run, exits with a non-zero status, or reports no
    /// exit status.
    pub fn exec<I, S>(&self, args: I) -> LaunchResult<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();
        let rendered = argv.join(" ");
        let mut result = self
            .inner()?
            .exec(exec_command(argv))
            .wrap_err_with(|| format!("failed to run `{rendered}`"))
            .map_err(exec_error)?;
        let stdout = result
            .stdout_to_vec()
            .wrap_err_with(|| format!("failed to read output of `{rendered}`"))
            .map_err(exec_error)?;
        let exit_code = result
            .exit_code()
            .wrap_err_with(|| format!("failed to read exit code of `{rendered}`"))
            .map_err(exec_error)?;
        ensure_success(&rendered, exit_code)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Stops and removes the container.
    ///
    /// Consuming the handle guarantees termination happens at most once.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind
    /// [`Teardown`](LaunchErrorKind::Teardown) when the runtime refuses to
    /// remove the container. No retry is made.
    pub fn terminate(mut self) -> LaunchResult<()> {
        let Some(container) = self.container.take() else {
            return Ok(());
        };
        let id = container.id().to_owned();
        container
            .rm()
            .wrap_err_with(|| format!("failed to remove Aerospike container {id}"))
            .map_err(|report| LaunchError::new(LaunchErrorKind::Teardown, report))?;
        info!(target: LOG_TARGET, id = %id, "Aerospike container terminated");
        Ok(())
    }

    fn inner(&self) -> LaunchResult<&Container<ContainerSettings>> {
        self.container
            .as_ref()
            .ok_or_else(|| LaunchError::from(eyre!("Aerospike container already terminated")))
    }
}

impl Drop for AerospikeContainer {
    fn drop(&mut self) {
        if let Some(container) = self.container.take() {
            warn!(
                target: LOG_TARGET,
                id = container.id(),
                "Aerospike container dropped without terminate; removing it during drop"
            );
            drop(container);
        }
    }
}

/// Applies `options` to `settings` in call order.
pub(crate) fn apply_options<I>(
    mut settings: ContainerSettings,
    options: I,
) -> LaunchResult<ContainerSettings>
where
    I: IntoIterator<Item = ContainerOption>,
{
    for option in options {
        option
            .apply(&mut settings)
            .wrap_err("failed to apply option")
            .map_err(|report| LaunchError::new(LaunchErrorKind::OptionApplication, report))?;
    }
    Ok(settings)
}

/// Loads `AEROSPIKE_TC_*` overrides and layers them over the defaults.
fn settings_from_env() -> LaunchResult<ContainerSettings> {
    AerospikeEnvCfg::load()
        .and_then(|cfg| cfg.to_settings())
        .map_err(LaunchError::configuration)
}

/// Builds an exec request that only resolves once the command has exited.
pub(crate) fn exec_command(argv: Vec<String>) -> ExecCommand {
    ExecCommand::new(argv).with_cmd_ready_condition(CmdWaitFor::exit())
}

const fn exec_error(report: color_eyre::Report) -> LaunchError {
    LaunchError::new(LaunchErrorKind::Exec, report)
}

fn ensure_success(command: &str, exit_code: Option<i64>) -> LaunchResult<()> {
    match exit_code {
        Some(0) => Ok(()),
        Some(code) => Err(exec_error(eyre!("`{command}` exited with status {code}"))),
        None => Err(exec_error(eyre!("`{command}` did not report an exit status"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, LaunchErrorKind};
    use crate::options::{with_image, with_namespace};
    use crate::settings::NAMESPACE_ENV;
    use serial_test::serial;

    #[test]
    fn apply_options_preserves_call_order() -> color_eyre::Result<()> {
        let settings = apply_options(
            ContainerSettings::default(),
            [with_namespace("one"), with_namespace("two")],
        )?;
        assert_eq!(settings.env_var(NAMESPACE_ENV), Some("two"));
        Ok(())
    }

    #[test]
    fn option_failure_stops_before_later_options() {
        let failing = ContainerOption::new("broken", |_settings: &mut ContainerSettings| {
            Err(ConfigError::from(eyre!("nope")))
        });
        let err = apply_options(
            ContainerSettings::default(),
            [failing, with_image("never-applied:1")],
        )
        .expect_err("broken option should abort");

        assert_eq!(err.kind(), LaunchErrorKind::OptionApplication);
        assert_eq!(err.to_string(), "failed to apply option");
    }

    #[test]
    fn failed_option_aborts_start_before_contacting_docker() {
        let failing = ContainerOption::new("broken", |_settings: &mut ContainerSettings| {
            Err(ConfigError::from(eyre!("nope")))
        });
        let err = AerospikeContainer::start([failing]).expect_err("start should fail");
        assert_eq!(err.kind(), LaunchErrorKind::OptionApplication);
    }

    #[test]
    fn non_zero_exit_codes_are_errors() {
        assert!(ensure_success("asinfo -v status", Some(0)).is_ok());

        let err = ensure_success("asinfo -v status", Some(2))
            .expect_err("status 2 should fail");
        assert_eq!(err.kind(), LaunchErrorKind::Exec);
        assert!(err.to_string().contains("exited with status 2"));
    }

    #[test]
    fn missing_exit_status_is_an_error() {
        let err = ensure_success("asinfo -v status", None)
            .expect_err("an unknown status must not pass as success");

        assert_eq!(err.kind(), LaunchErrorKind::Exec);
        assert!(err.to_string().contains("did not report an exit status"));
    }

    #[test]
    fn exec_requests_wait_for_the_command_to_exit() {
        let argv = vec!["asinfo".to_owned(), "-v".to_owned(), "status".to_owned()];
        let command = exec_command(argv);
        let rendered = format!("{command:?}");

        assert!(!rendered.contains("Nothing"), "exec does not wait: {rendered}");
        assert!(rendered.contains("Exit"), "exec does not wait: {rendered}");
    }

    #[test]
    #[serial]
    fn unparsable_environment_fails_as_configuration() {
        temp_env::with_var("AEROSPIKE_TC_STARTUP_TIMEOUT_SECS", Some("soon"), || {
            let err = settings_from_env().expect_err("a non-numeric timeout should fail");
            assert_eq!(err.kind(), LaunchErrorKind::Configuration);
        });
    }
}
