use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shelfcast::build::{DEFAULT_MAX_FEATURES, DEFAULT_MIN_INTERACTIONS};
use shelfcast::{
    build_artifacts, init_logging, BuildOptions, Method, ServingConfig, ServingContext, DEFAULT_CATEGORY_LIMIT,
};
use std::path::PathBuf;

/// Product recommendations and demand forecasts from pre-built artifacts
#[derive(Debug, Parser)]
#[command(name = "shelfcast", version, about)]
struct Cli {
    /// Config file (defaults to $SHELFCAST_CONFIG, then ./shelfcast.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Artifact directory, overriding config and environment
    #[arg(long, global = true)]
    artifact_dir: Option<PathBuf>,

    /// Interaction log, overriding config and environment
    #[arg(long, global = true)]
    reviews_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the recommendation artifacts from raw data
    BuildIndex(BuildArgs),
    #[command(flatten)]
    Query(Query),
}

#[derive(Debug, clap::Args)]
struct BuildArgs {
    /// Interaction log (CSV or JSON lines)
    #[arg(long)]
    reviews: PathBuf,
    /// Product metadata (JSON lines)
    #[arg(long)]
    metadata: PathBuf,
    /// Output artifact directory
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value_t = DEFAULT_MIN_INTERACTIONS)]
    min_interactions: usize,
    #[arg(long, default_value_t = DEFAULT_MAX_FEATURES)]
    max_features: usize,
}

#[derive(Debug, Subcommand)]
enum Query {
    /// Which artifacts are loaded
    Stats,
    /// Products similar to a product
    Recommend {
        /// collaborative, content or hybrid
        method: Method,
        product_id: String,
        #[arg(short, default_value_t = 6)]
        n: usize,
        /// Collaborative weight for hybrid blending
        #[arg(long)]
        cf_weight: Option<f32>,
    },
    /// Summary of the weekly demand data
    DemandStats,
    /// Products with the highest total demand
    Top {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Demand history and trend of one product
    Demand { product_id: String },
    /// Forecast weekly demand
    Forecast {
        product_id: String,
        #[arg(long, default_value_t = 8)]
        weeks: usize,
    },
    /// Score the forecaster on the last weeks of a product
    Backtest {
        product_id: String,
        #[arg(long, default_value_t = 4)]
        holdout: usize,
    },
    /// Store-wide demand per week
    Trend,
    /// Demand per top-level category
    Categories {
        #[arg(long, default_value_t = DEFAULT_CATEGORY_LIMIT)]
        limit: usize,
    },
    /// Metadata of one product
    Product { product_id: String },
    /// Recommendable products with images
    Products {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Search titles and categories
    Search {
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ServingConfig> {
    let mut config = ServingConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = &cli.artifact_dir {
        config.artifact_dir = dir.clone();
    }
    if let Some(path) = &cli.reviews_path {
        config.reviews_path = path.clone();
    }
    Ok(config)
}

fn run_query(context: &ServingContext, query: Query) -> Result<()> {
    match query {
        Query::Stats => print_json(&context.stats()),
        Query::Recommend {
            method,
            product_id,
            n,
            cf_weight,
        } => print_json(&context.recommend(method, &product_id, n, cf_weight)?),
        Query::DemandStats => print_json(&context.demand_stats()?),
        Query::Top { limit } => print_json(&context.top_products(limit)?),
        Query::Demand { product_id } => print_json(&context.product_demand(&product_id)?),
        Query::Forecast { product_id, weeks } => print_json(&context.forecast(&product_id, weeks)?),
        Query::Backtest { product_id, holdout } => print_json(&context.backtest(&product_id, holdout)?),
        Query::Trend => print_json(&context.overall_trend()?),
        Query::Categories { limit } => print_json(&context.category_demand(limit)?),
        Query::Product { product_id } => print_json(&context.product(&product_id)?),
        Query::Products { limit, offset } => print_json(&context.products(limit, offset)?),
        Query::Search { query, limit } => print_json(&context.search(&query, limit)?),
    }
}

fn main() -> Result<()> {
    init_logging("info");
    let cli = Cli::parse();
    let config = load_config(&cli);

    match cli.command {
        Command::BuildIndex(args) => {
            let summary = build_artifacts(&BuildOptions {
                reviews_path: args.reviews,
                metadata_path: args.metadata,
                out_dir: args.out,
                min_interactions: args.min_interactions,
                max_features: args.max_features,
            })?;
            print_json(&summary)
        }
        Command::Query(query) => {
            let context = ServingContext::load(config?)?;
            run_query(&context, query)
        }
    }
}
