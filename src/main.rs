pub mod types;
pub mod config;
pub mod topology;
pub mod data;
pub mod join;
pub mod scale;
pub mod legend;
pub mod tooltip;
pub mod processing;
pub mod render;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the choropleth to SVG and HTML
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Render the choropleth, then serve it with a county hover API
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

/// Loads both datasets, expands the county features and runs the render pass.
async fn build_map(
    app_config: &config::AppConfig,
) -> anyhow::Result<(Vec<types::EducationRecord>, Vec<types::County>, processing::Choropleth)> {
    let slots = data::load_data(app_config).await;
    let (records, topology) = slots.require_ready()?;

    let counties = topology
        .features(&app_config.input.counties_object)
        .context("Failed to expand county features")?;
    info!(features = counties.len(), "expanded county features");

    let map = processing::process_data(app_config, records, &counties)?;
    render::write_output(app_config, &map)?;
    Ok((records.to_vec(), counties, map))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            info!(config = ?config, "generating map");
            let app_config = config::AppConfig::load_from_file(config)?;
            build_map(&app_config).await?;
            info!(dir = ?app_config.output.dir, "generation complete");
        }
        Commands::Serve { config } => {
            info!(config = ?config, "serving map");
            let app_config = config::AppConfig::load_from_file(config)?;
            let (records, counties, map) = build_map(&app_config).await?;
            let state = server::AppState::new(&records, counties, map);
            server::start_server(&app_config, state).await?;
        }
    }

    Ok(())
}
