//! Composable options that customise [`ContainerSettings`] before launch.
//!
//! Each option wraps a function over a shared mutable settings record. The
//! launcher applies options strictly in the order they are supplied, so later
//! options targeting the same field override earlier ones.
//!
//! # Examples
//! ```
//! use aerospike_testcontainer::{ContainerSettings, with_log_level, with_namespace};
//!
//! # fn main() -> aerospike_testcontainer::ConfigResult<()> {
//! let mut settings = ContainerSettings::default();
//! for option in [with_namespace("inventory"), with_log_level("debug")] {
//!     option.apply(&mut settings)?;
//! }
//! assert_eq!(settings.env_var("NAMESPACE"), Some("inventory"));
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use color_eyre::eyre::WrapErr;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::observability::LOG_TARGET;
use crate::settings::{
    AdminCommand, COMMUNITY_IMAGE, ContainerSettings, DEFAULT_NAMESPACE, DEFAULT_NSUP_PERIOD,
    ENTERPRISE_IMAGE, LOG_LEVEL_ENV, LifecycleHook, NAMESPACE_ENV,
};

type ApplyFn = dyn Fn(&mut ContainerSettings) -> ConfigResult<()> + Send + Sync;

/// Named mutation applied to [`ContainerSettings`] before the container starts.
pub struct ContainerOption {
    name: Cow<'static, str>,
    apply: Box<ApplyFn>,
}

impl fmt::Debug for ContainerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerOption")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ContainerOption {
    /// Wraps `apply` as an option called `name`.
    ///
    /// Custom options may reject the settings by returning a
    /// [`ConfigError`]; the launcher then aborts before any container is
    /// created.
    ///
    /// # Examples
    /// ```
    /// use aerospike_testcontainer::{ContainerOption, ContainerSettings};
    ///
    /// let option = ContainerOption::new("feature-key", |settings: &mut ContainerSettings| {
    ///     settings.set_env("FEATURE_KEY_FILE", "/etc/aerospike/features.conf");
    ///     Ok(())
    /// });
    /// assert_eq!(option.name(), "feature-key");
    /// ```
    pub fn new<F>(name: impl Into<Cow<'static, str>>, apply: F) -> Self
    where
        F: Fn(&mut ContainerSettings) -> ConfigResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Box::new(apply),
        }
    }

    /// Returns the option's name as used in logs and error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the option to `settings`.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] naming this option when the wrapped function
    /// fails.
    pub fn apply(&self, settings: &mut ContainerSettings) -> ConfigResult<()> {
        debug!(target: LOG_TARGET, option = %self.name, "applying container option");
        (self.apply)(settings)
            .wrap_err_with(|| format!("container option `{}` failed", self.name))
            .map_err(ConfigError::from)
    }
}

/// Overwrites the image reference with `image`, verbatim.
#[must_use]
pub fn with_image(image: impl Into<String>) -> ContainerOption {
    let reference = image.into();
    ContainerOption::new("image", move |settings| {
        settings.image.clone_from(&reference);
        Ok(())
    })
}

/// Selects the community edition image.
#[must_use]
pub fn with_community_edition() -> ContainerOption {
    with_image(COMMUNITY_IMAGE)
}

/// Selects the enterprise edition image.
#[must_use]
pub fn with_enterprise_edition() -> ContainerOption {
    with_image(ENTERPRISE_IMAGE)
}

/// Sets the namespace the server creates at startup.
///
/// Any string is passed through unchanged, including empty strings and
/// control characters. The server image defaults to `test` when unset.
#[must_use]
pub fn with_namespace(namespace: impl Into<String>) -> ContainerOption {
    env_option("namespace", NAMESPACE_ENV, namespace.into())
}

/// Sets the server log verbosity. Levels are not validated.
#[must_use]
pub fn with_log_level(level: impl Into<String>) -> ContainerOption {
    env_option("log_level", LOG_LEVEL_ENV, level.into())
}

/// Sets an arbitrary environment entry on the container.
#[must_use]
pub fn with_env(key: impl Into<String>, value: impl Into<String>) -> ContainerOption {
    let name = key.into();
    let contents = value.into();
    ContainerOption::new(format!("env:{name}"), move |settings| {
        settings.set_env(name.clone(), contents.clone());
        Ok(())
    })
}

/// Bounds how long the framework waits for the container to become ready.
#[must_use]
pub fn with_startup_timeout(timeout: Duration) -> ContainerOption {
    ContainerOption::new("startup_timeout", move |settings| {
        settings.startup_timeout = timeout;
        Ok(())
    })
}

/// Enables record expiry sweeping for `namespace` once the server is running.
///
/// Registers a post-start hook that sets `nsup-period` through `asinfo`;
/// without it records written with an explicit TTL never expire. An absent or
/// empty namespace targets `test`.
///
/// # Examples
/// ```
/// use aerospike_testcontainer::{ContainerSettings, with_ttl_support};
///
/// # fn main() -> aerospike_testcontainer::ConfigResult<()> {
/// let mut settings = ContainerSettings::default();
/// with_ttl_support(None).apply(&mut settings)?;
/// let command = settings.post_start_commands().next().map(ToString::to_string);
/// assert_eq!(
///     command.as_deref(),
///     Some("asinfo -v set-config:context=namespace;id=test;nsup-period=10")
/// );
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn with_ttl_support(namespace: Option<&str>) -> ContainerOption {
    let target = namespace.filter(|ns| !ns.is_empty()).map_or_else(
        || {
            debug!(
                target: LOG_TARGET,
                namespace = DEFAULT_NAMESPACE,
                "no namespace supplied for TTL support; using default"
            );
            DEFAULT_NAMESPACE.to_owned()
        },
        str::to_owned,
    );
    ContainerOption::new("ttl_support", move |settings| {
        settings.hooks.push(LifecycleHook::PostStart(AdminCommand::enable_ttl(
            &target,
            DEFAULT_NSUP_PERIOD,
        )));
        Ok(())
    })
}

fn env_option(name: &'static str, key: &'static str, value: String) -> ContainerOption {
    ContainerOption::new(name, move |settings| {
        settings.set_env(key, value.clone());
        Ok(())
    })
}
