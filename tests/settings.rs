//! Validates translating `AEROSPIKE_TC_*` environment settings into container settings.

use std::time::Duration;

use aerospike_testcontainer::{
    AdminCommand, AerospikeEnvCfg, COMMUNITY_IMAGE, DEFAULT_STARTUP_TIMEOUT, LOG_LEVEL_ENV,
    NAMESPACE_ENV,
};
use rstest::rstest;
use serial_test::serial;

const VARS: [&str; 5] = [
    "AEROSPIKE_TC_IMAGE",
    "AEROSPIKE_TC_NAMESPACE",
    "AEROSPIKE_TC_LOG_LEVEL",
    "AEROSPIKE_TC_TTL_NAMESPACE",
    "AEROSPIKE_TC_STARTUP_TIMEOUT_SECS",
];

/// Clears every recognised variable except those in `overrides`.
fn env_with(
    overrides: &[(&'static str, &'static str)],
) -> Vec<(&'static str, Option<&'static str>)> {
    VARS.iter()
        .map(|key| {
            let value = overrides
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| *value);
            (*key, value)
        })
        .collect()
}

#[rstest]
fn to_settings_roundtrip() -> color_eyre::Result<()> {
    let cfg = AerospikeEnvCfg {
        image: Some("aerospike/aerospike-server:7.2".into()),
        namespace: Some("inventory".into()),
        log_level: Some("debug".into()),
        ttl_namespace: Some("inventory".into()),
        startup_timeout_secs: Some(30),
    };
    let settings = cfg.to_settings()?;

    assert_eq!(settings.image, "aerospike/aerospike-server:7.2");
    assert_eq!(settings.env_var(NAMESPACE_ENV), Some("inventory"));
    assert_eq!(settings.env_var(LOG_LEVEL_ENV), Some("debug"));
    assert_eq!(settings.startup_timeout, Duration::from_secs(30));
    assert_eq!(
        settings.post_start_commands().collect::<Vec<_>>(),
        vec![&AdminCommand::enable_ttl("inventory", 10)]
    );
    Ok(())
}

#[rstest]
fn default_config_keeps_defaults() -> color_eyre::Result<()> {
    let settings = AerospikeEnvCfg::default().to_settings()?;

    assert_eq!(settings.image, COMMUNITY_IMAGE);
    assert!(settings.env.is_empty());
    assert_eq!(settings.startup_timeout, DEFAULT_STARTUP_TIMEOUT);
    Ok(())
}

#[rstest]
fn empty_ttl_namespace_targets_default() -> color_eyre::Result<()> {
    let cfg = AerospikeEnvCfg {
        ttl_namespace: Some(String::new()),
        ..AerospikeEnvCfg::default()
    };
    let settings = cfg.to_settings()?;

    assert_eq!(
        settings.post_start_commands().collect::<Vec<_>>(),
        vec![&AdminCommand::enable_ttl("test", 10)]
    );
    Ok(())
}

#[rstest]
#[serial]
fn load_reads_prefixed_environment() -> color_eyre::Result<()> {
    let vars = env_with(&[
        ("AEROSPIKE_TC_IMAGE", "aerospike/aerospike-server:7.2"),
        ("AEROSPIKE_TC_NAMESPACE", "from-env"),
        ("AEROSPIKE_TC_STARTUP_TIMEOUT_SECS", "45"),
    ]);

    let cfg = temp_env::with_vars(vars, AerospikeEnvCfg::load)?;

    assert_eq!(cfg.image.as_deref(), Some("aerospike/aerospike-server:7.2"));
    assert_eq!(cfg.namespace.as_deref(), Some("from-env"));
    assert_eq!(cfg.startup_timeout_secs, Some(45));
    assert!(cfg.log_level.is_none());
    Ok(())
}

#[rstest]
#[serial]
fn load_without_variables_is_empty() -> color_eyre::Result<()> {
    let cfg = temp_env::with_vars(env_with(&[]), AerospikeEnvCfg::load)?;

    assert!(cfg.image.is_none());
    assert!(cfg.namespace.is_none());
    assert!(cfg.ttl_namespace.is_none());
    Ok(())
}

#[rstest]
#[serial]
fn load_rejects_non_numeric_timeout() {
    let vars = env_with(&[("AEROSPIKE_TC_STARTUP_TIMEOUT_SECS", "soon")]);

    let outcome = temp_env::with_vars(vars, AerospikeEnvCfg::load);

    assert!(outcome.is_err(), "non-numeric timeout should be rejected");
}
