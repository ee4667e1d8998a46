//! Docker-backed lifecycle tests for `AerospikeContainer`.
//!
//! Each scenario soft-skips when no container runtime is reachable. Run with
//! `cargo test --features docker-tests --test aerospike_lifecycle`.

use aerospike_testcontainer::test_support::{
    aerospike_container, capture_warn_logs, start_or_skip,
};
use aerospike_testcontainer::{
    AerospikeContainer, ContainerSettings, LOG_LEVEL_ENV, LaunchErrorKind, SERVICE_PORT,
    with_image, with_log_level, with_namespace, with_ttl_support,
};
use color_eyre::eyre::eyre;
use rstest::rstest;
use serial_test::serial;

fn namespaces(container: &AerospikeContainer) -> color_eyre::Result<Vec<String>> {
    let output = container.exec(["asinfo", "-v", "namespaces"])?;
    Ok(output
        .trim()
        .split(';')
        .map(str::to_owned)
        .collect())
}

#[rstest]
#[serial]
fn starts_with_custom_namespace() -> color_eyre::Result<()> {
    let Some(container) = start_or_skip([with_namespace("namespace")])? else {
        return Ok(());
    };

    let connection = container.connection()?;
    assert!(!connection.host().is_empty());
    assert!(connection.port() > 0);
    assert_eq!(connection.namespace(), "namespace");
    assert!(namespaces(&container)?.contains(&"namespace".to_owned()));

    container.terminate()?;
    Ok(())
}

#[rstest]
#[serial]
fn starts_with_custom_image() -> color_eyre::Result<()> {
    let custom_image = "aerospike/aerospike-server:7.2";
    let options = [with_image(custom_image), with_namespace("test")];
    let Some(container) = start_or_skip(options)? else {
        return Ok(());
    };

    assert_eq!(container.settings().image, custom_image);
    assert!(container.service_port()? > 0);
    assert!(namespaces(&container)?.contains(&"test".to_owned()));

    container.terminate()?;
    Ok(())
}

#[rstest]
#[serial]
fn starts_with_log_level() -> color_eyre::Result<()> {
    let options = [with_namespace("test"), with_log_level("debug")];
    let Some(container) = start_or_skip(options)? else {
        return Ok(());
    };

    assert_eq!(container.settings().env_var(LOG_LEVEL_ENV), Some("debug"));
    assert!(container.service_port()? > 0);

    container.terminate()?;
    Ok(())
}

#[rstest]
#[serial]
fn ttl_support_sets_nsup_period() -> color_eyre::Result<()> {
    let options = [with_namespace("test"), with_ttl_support(None)];
    let Some(container) = start_or_skip(options)? else {
        return Ok(());
    };

    // Launch returns only after the hook has exited, so no polling is needed.
    let config = container.exec(["asinfo", "-v", "get-config:context=namespace;id=test"])?;
    assert!(
        config.split(';').any(|entry| entry.trim() == "nsup-period=10"),
        "nsup-period not applied: {config}"
    );

    container.terminate()?;
    Ok(())
}

#[rstest]
#[serial]
fn failing_exec_reports_exit_status(
    aerospike_container: Option<AerospikeContainer>,
) -> color_eyre::Result<()> {
    let Some(container) = aerospike_container else {
        return Ok(());
    };

    let err = container
        .exec(["sh", "-c", "exit 3"])
        .expect_err("non-zero exit should be reported");
    assert_eq!(err.kind(), LaunchErrorKind::Exec);
    assert!(err.to_string().contains("exited with status 3"), "{err}");

    container.terminate()?;
    Ok(())
}

#[rstest]
#[serial]
fn framework_container_is_reachable_through_the_handle(
    aerospike_container: Option<AerospikeContainer>,
) -> color_eyre::Result<()> {
    let Some(container) = aerospike_container else {
        return Ok(());
    };

    let inner = container.container()?;
    assert_eq!(inner.id(), container.id()?);
    assert_eq!(
        inner.get_host_port_ipv4(SERVICE_PORT)?,
        container.service_port()?
    );
    let logs = String::from_utf8_lossy(&inner.stdout_to_vec()?).into_owned();
    assert!(logs.contains("service ready"), "server log lacks readiness line");

    container.terminate()?;
    Ok(())
}

#[rstest]
#[serial]
fn dropping_without_terminate_warns(aerospike_container: Option<AerospikeContainer>) {
    let Some(container) = aerospike_container else {
        return;
    };

    let (logs, ()) = capture_warn_logs(|| drop(container));
    assert!(
        logs.iter().any(|line| line.contains("dropped without terminate")),
        "expected drop warning, got {logs:?}"
    );
}

#[rstest]
#[serial]
fn unknown_image_fails_to_start() -> color_eyre::Result<()> {
    let settings = ContainerSettings {
        image: "aerospike/this-image-does-not-exist:0.0".to_owned(),
        ..ContainerSettings::default()
    };

    match AerospikeContainer::start_with_settings(settings) {
        Ok(container) => {
            container.terminate()?;
            Err(eyre!("a missing image should not start"))
        }
        Err(err) => {
            assert_eq!(err.kind(), LaunchErrorKind::Startup);
            Ok(())
        }
    }
}
