//! Internal helpers re-exported for integration tests.
//!
//! Docker-backed suites share the skip heuristics below so an
//! unreachable daemon turns into a soft skip rather than a failure, and the
//! logging helpers let tests assert on the crate's tracing output.

mod fixtures;
mod logging;
mod skip;

pub use fixtures::{aerospike_container, skip_unavailable_runtime, start_or_skip};
pub use logging::{capture_debug_logs, capture_info_logs, capture_warn_logs};
pub use skip::{
    SKIP_AEROSPIKE_PREFIX, docker_skip_message, format_skip_reason, launch_skip_message,
};
