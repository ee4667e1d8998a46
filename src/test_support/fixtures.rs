//! Shared fixtures for tests that need a running container.

use rstest::fixture;

use super::skip::{format_skip_reason, launch_skip_message};
use crate::container::AerospikeContainer;
use crate::error::LaunchResult;
use crate::options::ContainerOption;

/// Starts a container, converting runtime-unavailable failures into `None`.
///
/// A skip notice is written to standard error so the test output records
/// why the scenario did not run.
///
/// # Errors
/// Returns the launch error when it is not attributable to a missing
/// container runtime.
///
/// # Examples
/// ```no_run
/// use aerospike_testcontainer::{test_support::start_or_skip, with_namespace};
///
/// # fn main() -> aerospike_testcontainer::LaunchResult<()> {
/// let Some(container) = start_or_skip([with_namespace("inventory")])? else {
///     return Ok(());
/// };
/// container.terminate()?;
/// # Ok(())
/// # }
/// ```
pub fn start_or_skip<I>(options: I) -> LaunchResult<Option<AerospikeContainer>>
where
    I: IntoIterator<Item = ContainerOption>,
{
    skip_unavailable_runtime(AerospikeContainer::start(options))
}

/// Converts a launch outcome into `None` when the container runtime is
/// unreachable, reporting the skip on standard error.
///
/// Suites that launch through another entry point, such as the async handle,
/// use this to share the skip heuristics of [`start_or_skip`].
///
/// # Errors
/// Returns the launch error when it is not attributable to a missing
/// container runtime.
pub fn skip_unavailable_runtime<T>(outcome: LaunchResult<T>) -> LaunchResult<Option<T>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(err) => launch_skip_message(&err).map_or(Err(err), |message| {
            report_skip(&message);
            Ok(None)
        }),
    }
}

#[expect(clippy::print_stderr, reason = "skip notices belong in test output")]
fn report_skip(message: &str) {
    eprintln!("{message}");
}

/// `rstest` fixture that yields a running container with default settings.
///
/// Yields `None` when no container runtime is reachable.
///
/// # Panics
/// Panics with a skip-prefixed message when the container fails to start for
/// any other reason.
#[fixture]
pub fn aerospike_container() -> Option<AerospikeContainer> {
    start_or_skip([]).unwrap_or_else(|err| {
        panic!(
            "{}",
            format_skip_reason(format!("Aerospike container failed to start: {err:?}"))
        )
    })
}
