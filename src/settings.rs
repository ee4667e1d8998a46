//! Container settings describing a disposable Aerospike instance.
//!
//! [`ContainerSettings`] is the mutable record that container options act on
//! before launch. It implements [`testcontainers::Image`], so once the options
//! have been applied the settings are handed straight to the orchestration
//! framework, which owns port mapping, readiness polling, and hook execution.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use testcontainers::core::{CmdWaitFor, ContainerPort, ContainerState, ExecCommand, WaitFor};
use testcontainers::{Image, TestcontainersError};

/// Image reference used when no image option is supplied.
pub const COMMUNITY_IMAGE: &str = "aerospike/aerospike-server:8.0";

/// Image reference for the enterprise edition of the server.
pub const ENTERPRISE_IMAGE: &str = "aerospike/aerospike-server-enterprise:8.0";

/// Internal port on which the Aerospike service listens.
pub const SERVICE_PORT: ContainerPort = ContainerPort::Tcp(3000);

/// Environment variable naming the namespace created at startup.
pub const NAMESPACE_ENV: &str = "NAMESPACE";

/// Environment variable controlling server log verbosity.
pub const LOG_LEVEL_ENV: &str = "AEROSPIKE_LOG_LEVEL";

/// Namespace the server image creates when `NAMESPACE` is unset.
pub const DEFAULT_NAMESPACE: &str = "test";

/// Sweep period, in seconds, applied when time-to-live support is enabled.
pub const DEFAULT_NSUP_PERIOD: u32 = 10;

/// Upper bound on how long readiness polling may take.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(120);

const DEFAULT_TAG: &str = "latest";
const READY_MESSAGE: &str = "service ready: soon there will be cake!";

/// Configuration record for one container launch.
///
/// Built once per launch, mutated by container options in call order, and
/// consumed when the container starts.
///
/// # Examples
/// ```
/// use aerospike_testcontainer::{COMMUNITY_IMAGE, ContainerSettings};
///
/// let settings = ContainerSettings::default();
/// assert_eq!(settings.image, COMMUNITY_IMAGE);
/// assert!(settings.env.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ContainerSettings {
    /// Image reference in `repository[:tag]` form, stored verbatim.
    pub image: String,
    /// Internal ports the framework maps to the host.
    pub exposed_ports: Vec<ContainerPort>,
    /// Environment passed to the container. Keys are unique; later writes win.
    pub env: BTreeMap<String, String>,
    /// Conditions the framework polls before the container counts as ready.
    pub ready_conditions: Vec<WaitFor>,
    /// Maximum time allowed for the container to become ready.
    pub startup_timeout: Duration,
    /// Hooks executed in insertion order at their lifecycle point.
    pub hooks: Vec<LifecycleHook>,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            image: COMMUNITY_IMAGE.to_owned(),
            exposed_ports: vec![SERVICE_PORT],
            env: BTreeMap::new(),
            ready_conditions: vec![WaitFor::message_on_stdout(READY_MESSAGE)],
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            hooks: Vec::new(),
        }
    }
}

impl ContainerSettings {
    /// Returns the value recorded for `key`, if any.
    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    /// Inserts or overwrites an environment entry.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    /// Returns the namespace the server will create, falling back to the
    /// image default when none was configured.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.env_var(NAMESPACE_ENV).unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Iterates over commands scheduled to run once the container is ready.
    pub fn post_start_commands(&self) -> impl Iterator<Item = &AdminCommand> {
        self.hooks.iter().map(|hook| match hook {
            LifecycleHook::PostStart(command) => command,
        })
    }
}

impl Image for ContainerSettings {
    fn name(&self) -> &str {
        split_image_reference(&self.image).0
    }

    fn tag(&self) -> &str {
        split_image_reference(&self.image).1
    }

    fn ready_conditions(&self) -> Vec<WaitFor> {
        self.ready_conditions.clone()
    }

    fn env_vars(
        &self,
    ) -> impl IntoIterator<
        Item = (
            impl Into<std::borrow::Cow<'_, str>>,
            impl Into<std::borrow::Cow<'_, str>>,
        ),
    > {
        &self.env
    }

    fn expose_ports(&self) -> &[ContainerPort] {
        &self.exposed_ports
    }

    fn exec_after_start(
        &self,
        _cs: ContainerState,
    ) -> Result<Vec<ExecCommand>, TestcontainersError> {
        Ok(self
            .post_start_commands()
            .map(AdminCommand::to_exec_command)
            .collect())
    }
}

/// Splits an image reference into repository and tag.
///
/// A colon that belongs to a registry `host:port` is not a tag separator, so
/// the tag is only taken from the final path segment.
pub(crate) fn split_image_reference(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((name, tag)) if !name.is_empty() && !tag.is_empty() && !tag.contains('/') => {
            (name, tag)
        }
        _ => (image, DEFAULT_TAG),
    }
}

/// Work scheduled at a defined point of the container lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LifecycleHook {
    /// Runs after the readiness conditions have been met.
    PostStart(AdminCommand),
}

/// Administrative command executed inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCommand {
    args: Vec<String>,
}

impl AdminCommand {
    /// Builds a command from its argument vector.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the `asinfo` call that enables expiry sweeping for `namespace`.
    ///
    /// Records carrying an explicit TTL only expire once the namespace
    /// supervisor runs, which requires a non-zero `nsup-period`.
    ///
    /// # Examples
    /// ```
    /// use aerospike_testcontainer::AdminCommand;
    ///
    /// let command = AdminCommand::enable_ttl("test", 10);
    /// assert_eq!(
    ///     command.to_string(),
    ///     "asinfo -v set-config:context=namespace;id=test;nsup-period=10"
    /// );
    /// ```
    #[must_use]
    pub fn enable_ttl(namespace: &str, nsup_period: u32) -> Self {
        Self::new([
            "asinfo".to_owned(),
            "-v".to_owned(),
            format!("set-config:context=namespace;id={namespace};nsup-period={nsup_period}"),
        ])
    }

    /// Returns the argument vector.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Hooks block the launch until the command exits, and a non-zero status
    /// fails the start.
    pub(crate) fn to_exec_command(&self) -> ExecCommand {
        ExecCommand::new(self.args.iter().cloned())
            .with_cmd_ready_condition(CmdWaitFor::exit_code(0))
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}
