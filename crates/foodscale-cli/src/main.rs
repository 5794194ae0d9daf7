//! foodscale CLI: food volume and weight estimation from the command line.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use foodscale::{
    ErrorResponse, EstimateConfig, EstimateError, EstimateParams, EstimateRequest, Estimator,
    FoodCatalog, FoodImage,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "foodscale")]
#[command(about = "Estimate food volume and weight from a photo with a reference plate")]
#[command(version)]
struct Cli {
    /// Estimation configuration (JSON); defaults apply to omitted fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Food catalog (JSON, schema foodscale.catalog.v1) replacing the built-in one.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate from an image file.
    Estimate(CliEstimateArgs),

    /// Answer a wire request (JSON file with `img`, `food_type`, `plate_diameter`).
    Predict(CliPredictArgs),

    /// Print the food catalog.
    CatalogInfo(CliCatalogArgs),

    /// Print the liveness report.
    Health,
}

#[derive(Debug, Clone, Args)]
struct CliEstimateArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Declared food type (case-insensitive catalog lookup).
    #[arg(long)]
    food_type: Option<String>,

    /// Reference plate diameter in centimetres.
    #[arg(long)]
    plate_diameter: Option<f64>,

    /// Path to write the result (JSON); stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliCatalogArgs {
    /// Print the catalog as loadable JSON (schema foodscale.catalog.v1).
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Args)]
struct CliPredictArgs {
    /// Path to the request body (JSON).
    #[arg(long)]
    request: PathBuf,

    /// Path to write the response (JSON); stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let estimator = build_estimator(cli.config.as_deref(), cli.catalog.as_deref())?;

    match cli.command {
        Commands::Estimate(args) => run_estimate(&estimator, &args),
        Commands::Predict(args) => run_predict(&estimator, &args),
        Commands::CatalogInfo(args) => run_catalog_info(&estimator, &args),
        Commands::Health => run_health(&estimator),
    }
}

fn build_estimator(config: Option<&Path>, catalog: Option<&Path>) -> CliResult<Estimator> {
    let mut estimator = match config {
        Some(path) => {
            tracing::info!("Loading config: {}", path.display());
            Estimator::from_config_json_file(path)?
        }
        None => Estimator::with_config(EstimateConfig::default()),
    };
    if let Some(path) = catalog {
        tracing::info!("Loading catalog: {}", path.display());
        estimator = estimator.with_catalog(Arc::new(FoodCatalog::from_json_file(path)?));
    }
    Ok(estimator)
}

fn write_json<T: serde::Serialize>(value: &T, out: Option<&Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!("Results written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

// ── estimate ───────────────────────────────────────────────────────────

fn run_estimate(estimator: &Estimator, args: &CliEstimateArgs) -> CliResult<()> {
    tracing::info!("Loading image: {}", args.image.display());

    let img = image::open(&args.image).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", args.image.display(), e).into()
    })?;
    let image = FoodImage::from_dynamic(img)?;
    tracing::info!("Image size: {}x{}", image.width(), image.height());

    let params = EstimateParams::new(
        args.food_type.clone(),
        args.plate_diameter
            .unwrap_or(estimator.config().default_plate_diameter_cm),
    )?;
    let result = estimator.estimate(&image, &params)?;

    tracing::info!(
        "{} region(s), {:.1} ml, {:.1} g ({:?})",
        result.volumes_ml.len(),
        result.total_volume_ml(),
        result.weight_grams,
        result.status
    );
    write_json(&result, args.out.as_deref())
}

// ── predict ────────────────────────────────────────────────────────────

fn run_predict(estimator: &Estimator, args: &CliPredictArgs) -> CliResult<()> {
    let body = std::fs::read_to_string(&args.request)?;
    let outcome = EstimateRequest::from_json(&body)
        .map_err(|e| {
            tracing::warn!("Malformed request body: {}", e);
            ErrorResponse {
                error: "invalid_request".to_string(),
                message: e.to_string(),
            }
        })
        .and_then(|req| {
            estimator
                .estimate_request(req)
                .map_err(|e: EstimateError| ErrorResponse::from(&e))
        });

    match outcome {
        Ok(result) => write_json(&result, args.out.as_deref()),
        Err(err) => {
            write_json(&err, args.out.as_deref())?;
            Err(format!("{}: {}", err.error, err.message).into())
        }
    }
}

// ── catalog-info ───────────────────────────────────────────────────────

fn run_catalog_info(estimator: &Estimator, args: &CliCatalogArgs) -> CliResult<()> {
    let catalog = estimator.catalog();
    if args.json {
        println!("{}", catalog.to_json_pretty()?);
        return Ok(());
    }
    println!("foodscale food catalog");
    println!("  entries: {}", catalog.len());
    for entry in catalog.entries() {
        println!(
            "  {:<12} {:>5.2} g/ml  {}",
            entry.name,
            entry.density_g_per_ml,
            serde_json::to_string(&entry.shape)?
        );
    }
    Ok(())
}

// ── health ─────────────────────────────────────────────────────────────

fn run_health(estimator: &Estimator) -> CliResult<()> {
    write_json(&estimator.health(), None)
}
