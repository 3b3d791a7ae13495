use std::time::Duration;

use clap::{Parser, Subcommand};
use terra_core::config::AppConfig;
use terra_core::ids::VersionId;
use terra_worker::{AppContext, IngestPool, ReviewQueue};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "terra-worker")]
#[command(about = "Ingestion pipeline runner and AI review run queue")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Polls the AI review run queue forever.
    Serve {
        #[arg(long, default_value_t = 5)]
        poll_interval_secs: u64,
    },
    /// Runs the ingestion pipeline once for a single version and exits.
    Ingest {
        #[arg(long)]
        version_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let cx = AppContext::build(config)?;

    match cli.command {
        Command::Serve { poll_interval_secs } => {
            let queue = ReviewQueue::new(cx.db.clone(), cx.model_client.clone(), cx.config.ai.clone(), Duration::from_secs(poll_interval_secs));
            queue.run_forever().await;
            Ok(())
        }
        Command::Ingest { version_id } => {
            let pool = IngestPool::new(cx.pipeline_cx.clone(), 1);
            pool.dispatch(VersionId(version_id)).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clap_parses_ingest_with_version_id() {
        let cli = Cli::try_parse_from(["terra-worker", "ingest", "--version-id", "7"]).expect("parse ingest");
        assert!(matches!(cli.command, Command::Ingest { version_id: 7 }));
    }

    #[test]
    fn clap_parses_serve_with_default_poll_interval() {
        let cli = Cli::try_parse_from(["terra-worker", "serve"]).expect("parse serve");
        assert!(matches!(cli.command, Command::Serve { poll_interval_secs: 5 }));
    }

    #[test]
    fn clap_rejects_ingest_without_version_id() {
        assert!(Cli::try_parse_from(["terra-worker", "ingest"]).is_err());
    }
}
