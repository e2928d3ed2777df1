use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use url::Url;

use ecomap_core::cluster::ClusterRenderEngine;
use ecomap_core::config::AppConfig;
use ecomap_core::fetch::HttpPageFetcher;
use ecomap_core::filters::{ContainerCategory, ContainerFilters};
use ecomap_core::types::ClusterStyle;
use ecomap_core::{LocationGroupingIndex, PaginatedAggregator};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all resources for the given filters and print the clusters the
    /// map would draw for the configured viewport
    Snapshot {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Free-text location filter
        #[arg(short, long, default_value = "")]
        location: String,
        /// Container category filter (general, paper, plastic, metal, glass,
        /// organic, hazardous)
        #[arg(long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Snapshot {
            config,
            location,
            category,
        } => {
            let app_config = AppConfig::load_from_file(config)?;
            snapshot(&app_config, location, category.as_deref()).await?;
        }
    }

    Ok(())
}

async fn snapshot(config: &AppConfig, location: &str, category: Option<&str>) -> Result<()> {
    let endpoint = Url::parse(&config.provider.endpoint)
        .with_context(|| format!("Invalid provider endpoint: {}", config.provider.endpoint))?;

    let filters = ContainerFilters {
        location: location.to_string(),
        category: category.and_then(ContainerCategory::parse),
        ..ContainerFilters::default()
    };

    // Explicitly wired transport; the fetcher owns its client and endpoint.
    let fetcher = HttpPageFetcher::new(reqwest::Client::new(), endpoint);
    let aggregator = PaginatedAggregator::new(fetcher);

    let aggregation = aggregator
        .fetch_all(&filters, config.provider.page_size)
        .await
        .context("Failed to aggregate resources")?;

    println!(
        "Fetched {} of {} resources{}",
        aggregation.items.len(),
        aggregation.reported_total,
        if aggregation.is_complete() {
            String::new()
        } else {
            format!(
                " ({} pages dropped, results may be incomplete)",
                aggregation.failed_pages
            )
        }
    );

    let mut index = LocationGroupingIndex::new();
    index.extend(aggregation.items);
    println!("{} distinct locations", index.len());

    let mut engine = ClusterRenderEngine::new();
    engine.set_source(index.groups().to_vec());

    let viewport = config.map.viewport();
    let clusters = engine.clusters_for(&viewport, config.map.cluster_distance);

    println!("{} clusters at zoom {}:", clusters.len(), viewport.zoom);
    for cluster in clusters {
        match &cluster.style {
            ClusterStyle::Badge { count } => println!(
                "  badge x{count} at ({:.0}, {:.0})",
                cluster.anchor.x, cluster.anchor.y
            ),
            ClusterStyle::Icon { category, .. } => println!(
                "  {category} icon at ({:.0}, {:.0})",
                cluster.anchor.x, cluster.anchor.y
            ),
        }
    }

    Ok(())
}
