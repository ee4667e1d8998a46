//! Shared skip heuristics for Docker-backed tests.
//!
//! These helpers centralise the failure signatures that should result in a
//! soft skip rather than a hard assertion failure when no container runtime
//! is reachable from the test host.

use crate::error::{LaunchError, LaunchErrorKind};

/// Prefix used by panic and warning messages that tests convert into skips.
pub const SKIP_AEROSPIKE_PREFIX: &str = "SKIP-AEROSPIKE-CONTAINER";

/// Message substrings that signal an unavailable container runtime.
const DEFAULT_SKIP_CONDITIONS: &[(&str, &str)] = &[
    (
        "Cannot connect to the Docker daemon",
        "Docker daemon is not running",
    ),
    ("docker.sock", "Docker socket is unavailable"),
    (
        "failed to initialize a docker client",
        "Docker client could not be created",
    ),
    ("Socket not found", "Docker socket is unavailable"),
    ("Connection refused", "Docker daemon refused the connection"),
    (
        "toomanyrequests",
        "registry rate limit exceeded whilst pulling the Aerospike image",
    ),
    (
        "Permission denied",
        "test user lacks access to the Docker socket",
    ),
];

/// Formats a skip message when any known condition appears in `message` or
/// `debug`.
#[must_use]
pub fn docker_skip_message(message: &str, debug: Option<&str>) -> Option<String> {
    let message_lc = message.to_ascii_lowercase();
    let debug_lc = debug.map_or_else(String::new, str::to_ascii_lowercase);
    DEFAULT_SKIP_CONDITIONS
        .iter()
        .find(|(needle, _)| {
            let needle_lc = needle.to_ascii_lowercase();
            message_lc.contains(&needle_lc) || debug_lc.contains(&needle_lc)
        })
        .map(|(_, reason)| format!("{SKIP_AEROSPIKE_PREFIX}: {reason}: {message}"))
}

/// Returns a skip message for startup failures caused by the environment.
///
/// Only [`Startup`](LaunchErrorKind::Startup) failures qualify; option and
/// lookup errors always indicate a real defect.
#[must_use]
pub fn launch_skip_message(err: &LaunchError) -> Option<String> {
    if err.kind() != LaunchErrorKind::Startup {
        return None;
    }
    docker_skip_message(&err.to_string(), Some(&format!("{err:?}")))
}

/// Prefixes `reason` with the shared skip marker.
#[must_use]
pub fn format_skip_reason(reason: impl AsRef<str>) -> String {
    format!("{SKIP_AEROSPIKE_PREFIX}: {}", reason.as_ref())
}
