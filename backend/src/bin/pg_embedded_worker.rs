//! Worker process that `pg_embedded_setup_unpriv` runs to manage the embedded
//! test cluster when the test suite itself runs as root.
//!
//! ```text
//! pg-embedded-worker setup /tmp/pg-worker/settings.json
//! ```
//!
//! The JSON file is a [`WorkerPayload`] written by the bootstrapper. Point
//! `PG_EMBEDDED_WORKER` at this binary before running the Diesel suites as
//! root.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use pg_embedded_setup_unpriv::worker::WorkerPayload;
use postgresql_embedded::PostgreSQL;

/// Cluster lifecycle step requested by the bootstrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ClusterStep {
    Setup,
    Start,
    Stop,
}

#[derive(Debug, Parser)]
#[command(name = "pg-embedded-worker", about = "Run one embedded PostgreSQL lifecycle step")]
struct WorkerArgs {
    #[arg(value_enum)]
    step: ClusterStep,
    /// JSON payload describing the cluster settings and environment.
    payload: PathBuf,
}

fn read_payload(path: &Path) -> Result<WorkerPayload> {
    let raw = std::fs::read(path)
        .wrap_err_with(|| format!("reading worker payload {}", path.display()))?;
    serde_json::from_slice(&raw)
        .wrap_err_with(|| format!("parsing worker payload {}", path.display()))
}

fn run(args: WorkerArgs) -> Result<()> {
    let payload = read_payload(&args.payload)?;
    let settings = payload
        .settings
        .into_settings()
        .wrap_err("rebuilding cluster settings")?;
    for (key, value) in payload.environment {
        // SAFETY: the worker is single-threaded until the runtime below starts.
        unsafe {
            match value {
                Some(value) => std::env::set_var(&key, value.expose()),
                None => std::env::remove_var(&key),
            }
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("building worker runtime")?;
    let mut cluster = PostgreSQL::new(settings);
    runtime
        .block_on(async {
            match args.step {
                ClusterStep::Setup => cluster.setup().await,
                ClusterStep::Start => cluster.start().await,
                ClusterStep::Stop => cluster.stop().await,
            }
        })
        .wrap_err_with(|| format!("cluster step {:?} failed", args.step))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    run(WorkerArgs::parse())
}
