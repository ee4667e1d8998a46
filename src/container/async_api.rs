//! Async variant of the container handle for callers already on a Tokio runtime.

use color_eyre::eyre::{WrapErr, eyre};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use tracing::{Instrument, info, info_span, warn};

use super::{AerospikeConnection, apply_options, ensure_success, exec_command, exec_error};
use crate::error::{LaunchError, LaunchErrorKind, LaunchResult};
use crate::observability::LOG_TARGET;
use crate::options::ContainerOption;
use crate::settings::{ContainerSettings, SERVICE_PORT};

/// Running Aerospike container driven from async code.
///
/// Mirrors [`AerospikeContainer`](super::AerospikeContainer) but runs every
/// framework call on the caller's runtime.
#[derive(Debug)]
pub struct AerospikeContainerAsync {
    container: Option<ContainerAsync<ContainerSettings>>,
    settings: ContainerSettings,
}

impl AerospikeContainerAsync {
    /// Starts a container from the default settings customised by `options`.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] when an option fails or when the container
    /// cannot be started.
    pub async fn start<I>(options: I) -> LaunchResult<Self>
    where
        I: IntoIterator<Item = ContainerOption>,
    {
        let settings = apply_options(ContainerSettings::default(), options)?;
        Self::start_with_settings(settings).await
    }

    /// Starts a container from fully prepared settings.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind [`Startup`](LaunchErrorKind::Startup)
    /// when the framework cannot create or ready the container.
    pub async fn start_with_settings(settings: ContainerSettings) -> LaunchResult<Self> {
        let span = info_span!(
            target: LOG_TARGET,
            "aerospike_container",
            image = %settings.image
        );
        let request = settings.clone().with_startup_timeout(settings.startup_timeout);
        let container = async {
            info!(
                target: LOG_TARGET,
                namespace = settings.namespace(),
                hooks = settings.hooks.len(),
                "starting Aerospike container"
            );
            let started = request
                .start()
                .await
                .wrap_err_with(|| format!("failed to start Aerospike from {}", settings.image))
                .map_err(|report| LaunchError::new(LaunchErrorKind::Startup, report))?;
            info!(target: LOG_TARGET, id = started.id(), "Aerospike container ready");
            Ok::<_, LaunchError>(started)
        }
        .instrument(span)
        .await?;

        Ok(Self {
            container: Some(container),
            settings,
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
    /// re-expose, such as `stop`, `start`, and log streams.
    ///
    /// # Errors
    /// Returns an error when the handle no longer owns a container.
    pub fn container(&self) -> LaunchResult<&ContainerAsync<ContainerSettings>> {
        self.inner()
    }

    /// Resolves the host address on which the mapped ports are reachable.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind
    /// [`PortLookup`](LaunchErrorKind::PortLookup) when the framework cannot
    /// report the host.
    pub async fn host(&self) -> LaunchResult<String> {
        self.inner()?
            .get_host()
            .await
            .map(|host| host.to_string())
            .wrap_err("failed to fetch Aerospike host")
            .map_err(|report| LaunchError::new(LaunchErrorKind::PortLookup, report))
    }

    /// Resolves the host port mapped to the internal service port.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind
    /// [`PortLookup`](LaunchErrorKind::PortLookup) when no mapping is reported.
    pub async fn service_port(&self) -> LaunchResult<u16> {
        self.inner()?
            .get_host_port_ipv4(SERVICE_PORT)
            .await
            .wrap_err("failed to fetch Aerospike port")
            .map_err(|report| LaunchError::new(LaunchErrorKind::PortLookup, report))
    }

    /// Captures the endpoint and namespace a client needs to connect.
    ///
    /// # Errors
    /// Propagates failures from [`host`](Self::host) and
    /// [`service_port`](Self::service_port).
    pub async fn connection(&self) -> LaunchResult<AerospikeConnection> {
        Ok(AerospikeConnection::new(
            self.host().await?,
            self.service_port().await?,
            self.settings.namespace(),
        ))
    }

    /// Runs `args` inside the container and returns its standard output.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind [`Exec`](LaunchErrorKind::Exec) when
    /// the command cannot be run, exits with a non-zero status, or reports no
    /// exit status.
    pub async fn exec<I, S>(&self, args: I) -> LaunchResult<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();
        let rendered = argv.join(" ");
        let mut result = self
            .inner()?
            .exec(exec_command(argv))
            .await
            .wrap_err_with(|| format!("failed to run `{rendered}`"))
            .map_err(exec_error)?;
        let stdout = result
            .stdout_to_vec()
            .await
            .wrap_err_with(|| format!("failed to read output of `{rendered}`"))
            .map_err(exec_error)?;
        let exit_code = result
            .exit_code()
            .await
            .wrap_err_with(|| format!("failed to read exit code of `{rendered}`"))
            .map_err(exec_error)?;
        ensure_success(&rendered, exit_code)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Stops and removes the container.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind
    /// [`Teardown`](LaunchErrorKind::Teardown) when the runtime refuses to
    /// remove the container.
    pub async fn terminate(mut self) -> LaunchResult<()> {
        let Some(container) = self.container.take() else {
            return Ok(());
        };
        let id = container.id().to_owned();
        container
            .rm()
            .await
            .wrap_err_with(|| format!("failed to remove Aerospike container {id}"))
            .map_err(|report| LaunchError::new(LaunchErrorKind::Teardown, report))?;
        info!(target: LOG_TARGET, id = %id, "Aerospike container terminated");
        Ok(())
    }

    fn inner(&self) -> LaunchResult<&ContainerAsync<ContainerSettings>> {
        self.container
            .as_ref()
            .ok_or_else(|| LaunchError::from(eyre!("Aerospike container already terminated")))
    }
}

impl Drop for AerospikeContainerAsync {
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
