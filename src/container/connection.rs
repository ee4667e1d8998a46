//! Connection metadata for a running container, including optional client support.
#[cfg(feature = "client-support")]
use color_eyre::eyre::eyre;
use serde::Serialize;

#[cfg(feature = "client-support")]
use crate::error::{LaunchError, LaunchErrorKind, LaunchResult};

/// Endpoint and namespace a client needs to reach the container.
///
/// Enable the `client-support` feature to open an Aerospike client directly.
///
/// # Examples
/// ```no_run
/// use aerospike_testcontainer::AerospikeContainer;
///
/// # fn main() -> aerospike_testcontainer::LaunchResult<()> {
/// let container = AerospikeContainer::start([])?;
/// let connection = container.connection()?;
/// assert_eq!(connection.namespace(), "test");
/// # container.terminate()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AerospikeConnection {
    host: String,
    port: u16,
    namespace: String,
}

impl AerospikeConnection {
    pub(crate) fn new(host: String, port: u16, namespace: &str) -> Self {
        Self {
            host,
            port,
            namespace: namespace.to_owned(),
        }
    }

    /// Returns the host on which the service port is mapped.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the mapped service port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the namespace created when the server started.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the `host:port` seed address accepted by Aerospike clients.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Opens an Aerospike client against this endpoint.
    ///
    /// # Errors
    /// Returns a [`LaunchError`] of kind
    /// [`Connection`](LaunchErrorKind::Connection) when the client cannot
    /// reach the cluster.
    #[cfg(feature = "client-support")]
    pub fn client(&self) -> LaunchResult<aerospike::Client> {
        let address = self.address();
        let policy = aerospike::ClientPolicy::default();
        aerospike::Client::new(&policy, &address).map_err(|err| {
            LaunchError::new(
                LaunchErrorKind::Connection,
                eyre!("failed to connect to Aerospike at {address}: {err}"),
            )
        })
    }
}
