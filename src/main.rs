use anyhow::Result;
use clap::Parser;
use dream_visualizer::config::Config;
use dream_visualizer::pipeline::{DreamPipeline, PipelineServices, PipelineSettings};
use dream_visualizer::server::{self, AppState, ServerSettings};
use dream_visualizer::storage;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "dream-visualizer")]
#[command(about = "Serve the dream transcription, visualization, and interpretation API")]
struct CliArgs {
    /// Port to listen on (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Use mock providers; no API keys required (same as DRY_RUN=true).
    #[arg(long)]
    dry_run: bool,
}

impl CliArgs {
    /// Environment lookup with command-line flags taking precedence.
    fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "PORT" if self.port.is_some() => self.port.map(|p| p.to_string()),
            "DRY_RUN" if self.dry_run => Some("true".to_string()),
            _ => std::env::var(key).ok(),
        }
    }
}

async fn start(args: &CliArgs) -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_lookup(|key| args.lookup(key))?;

    if config.dry_run {
        info!("DRY RUN MODE: provider calls are served by mocks");
    }

    let storage = storage::from_config(&config).await?;
    let services = PipelineServices::from_config(&config, storage)?;
    let pipeline = DreamPipeline::with_services(services, PipelineSettings::from_config(&config));
    let state = AppState::new(pipeline, ServerSettings::from_config(&config));

    server::serve(&config, state).await
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dream_visualizer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting dream-visualizer");

    let args = CliArgs::parse();

    match start(&args).await {
        Ok(()) => {
            info!("Server stopped");
            Ok(())
        }
        Err(e) => {
            error!("Server failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn test_cli_flags_override_environment() {
        let args = CliArgs::parse_from(["dream-visualizer", "--port", "8080", "--dry-run"]);
        assert_eq!(args.lookup("PORT").as_deref(), Some("8080"));
        assert_eq!(args.lookup("DRY_RUN").as_deref(), Some("true"));
    }

    #[test]
    fn test_cli_defaults() {
        let args = CliArgs::parse_from(["dream-visualizer"]);
        assert_eq!(args.port, None);
        assert!(!args.dry_run);
    }
}
