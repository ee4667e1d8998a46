//! Launches a disposable Aerospike container and keeps it running until
//! standard input closes.
//!
//! Settings are seeded from `AEROSPIKE_TC_*` environment variables and then
//! overridden by command-line flags. The mapped endpoint is written to
//! standard output, either as `host:port` or as JSON with `--json`, so shell
//! scripts can connect clients while the container runs.

use std::io::{self, Write};

use aerospike_testcontainer::{
    AerospikeConnection, AerospikeContainer, ContainerOption, with_enterprise_edition, with_image,
    with_log_level, with_namespace, with_ttl_support,
};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

/// Command-line flags for the container launcher.
#[derive(Debug, Parser)]
#[command(name = "aerospike_testcontainer", version, about)]
struct Cli {
    /// Image reference to run instead of the community default.
    #[arg(long, conflicts_with = "enterprise")]
    image: Option<String>,
    /// Run the enterprise edition image.
    #[arg(long)]
    enterprise: bool,
    /// Namespace created when the server starts.
    #[arg(long)]
    namespace: Option<String>,
    /// Server log verbosity.
    #[arg(long)]
    log_level: Option<String>,
    /// Enable expiry sweeping for this namespace (empty selects `test`).
    #[arg(long)]
    ttl_namespace: Option<String>,
    /// Print the endpoint as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn options(&self) -> Vec<ContainerOption> {
        let mut options = Vec::new();
        if let Some(ref image) = self.image {
            options.push(with_image(image.clone()));
        }
        if self.enterprise {
            options.push(with_enterprise_edition());
        }
        if let Some(ref namespace) = self.namespace {
            options.push(with_namespace(namespace.clone()));
        }
        if let Some(ref level) = self.log_level {
            options.push(with_log_level(level.clone()));
        }
        if let Some(ref namespace) = self.ttl_namespace {
            options.push(with_ttl_support(Some(namespace.as_str())));
        }
        options
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let container = AerospikeContainer::start_from_env(cli.options())?;
    let connection = container.connection()?;
    report_endpoint(&connection, cli.json)?;

    tracing::info!("container running; close standard input to terminate it");
    io::copy(&mut io::stdin().lock(), &mut io::sink())
        .wrap_err("failed to wait on standard input")?;

    container.terminate()?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn report_endpoint(connection: &AerospikeConnection, json: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer(&mut stdout, connection)
            .wrap_err("failed to serialise connection details")?;
        writeln!(stdout)?;
    } else {
        writeln!(stdout, "{}", connection.address())?;
    }
    stdout.flush()?;
    Ok(())
}
