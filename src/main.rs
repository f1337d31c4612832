use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use jobfeed::aggregate::{self, Aggregation};
use jobfeed::config::Config;
use jobfeed::feed::FeedClient;
use jobfeed::gateway::{self, GatewayState};
use jobfeed::model::Source;
use jobfeed::snapshot::{render_json, FileSnapshotSink, PartitionKey, SnapshotSink};
use jobfeed::sources::{adapter_for, all_adapters};

#[derive(Parser, Debug)]
#[command(name = "jobfeed", about = "Aggregates remote-job feeds into one normalized schema")]
struct Args {
    /// Configuration file (missing file means defaults)
    #[arg(long, value_name = "FILE", default_value = "jobfeed.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one source and print its postings as JSON
    Fetch {
        /// Source name, e.g. `remoteok` (aliases like `remoteokjobs` work too)
        source: String,

        /// Also write a snapshot file
        #[arg(long)]
        snapshot: bool,
    },
    /// Fetch every source and print a summary line per source
    All {
        /// Also write a snapshot file per successful source
        #[arg(long)]
        snapshot: bool,
    },
    /// List the known source names
    Sources,
    /// Run the HTTP gateway
    Serve {
        /// Listen port (overrides the config file and `PORT`)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from '{}'", args.config.display()))?;

    match args.command {
        Command::Sources => {
            for source in Source::ALL {
                println!("{source}");
            }
            Ok(())
        }
        Command::Fetch { source, snapshot } => fetch_one(&config, &source, snapshot).await,
        Command::All { snapshot } => fetch_all(&config, snapshot).await,
        Command::Serve { port } => {
            let port =
                port.unwrap_or_else(|| config.resolve_port(std::env::var("PORT").ok().as_deref()));
            let client = FeedClient::from_config(&config).context("Failed to build HTTP client")?;
            let sink = config
                .snapshot_on_request
                .then(|| Arc::new(FileSnapshotSink::new(&config.snapshot_dir)) as Arc<dyn SnapshotSink>);
            let state = Arc::new(GatewayState {
                client,
                config: Arc::new(config),
                sink,
            });
            gateway::serve(state, port)
                .await
                .with_context(|| format!("Gateway failed on port {port}"))
        }
    }
}

async fn fetch_one(config: &Config, name: &str, snapshot: bool) -> Result<()> {
    let source: Source = name.parse()?;
    let client = FeedClient::from_config(config).context("Failed to build HTTP client")?;
    let adapter = adapter_for(source, config);

    let result = aggregate::run(adapter.as_ref(), &client).await;
    if let Some(reason) = &result.failure {
        anyhow::bail!("{source}: {reason}");
    }

    let json = render_json(&result.postings).context("Failed to serialize postings")?;
    println!("{}", String::from_utf8_lossy(&json));

    if snapshot {
        write_snapshot(config, &result).await?;
    }
    Ok(())
}

async fn fetch_all(config: &Config, snapshot: bool) -> Result<()> {
    let client = FeedClient::from_config(config).context("Failed to build HTTP client")?;
    let adapters = all_adapters(config);
    let results = aggregate::run_all(&adapters, &client).await;

    for result in &results {
        match &result.failure {
            None => println!(
                "{:<14} ok      {:>5} postings  {} skipped sub-feeds",
                result.source,
                result.postings.len(),
                result.skipped.len()
            ),
            Some(reason) => println!("{:<14} FAILED  {reason}", result.source),
        }
        if snapshot && result.ok() {
            write_snapshot(config, result).await?;
        }
    }

    let failed = results.iter().filter(|r| !r.ok()).count();
    if failed == results.len() {
        anyhow::bail!("All {failed} sources failed");
    }
    Ok(())
}

async fn write_snapshot(config: &Config, result: &Aggregation) -> Result<()> {
    let sink = FileSnapshotSink::new(&config.snapshot_dir);
    let partition = PartitionKey::now(config.snapshot_hourly);
    let path = sink
        .write(result.source, &partition, &result.postings)
        .await
        .with_context(|| format!("Failed to write {} snapshot", result.source))?;
    eprintln!("Snapshot written: {}", path.display());
    Ok(())
}
