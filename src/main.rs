use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::error;

use rent_predictor::dataset::{load_listings, write_listings, SyntheticListings};
use rent_predictor::logging::{self, env_bool, LOG_JSON_ENV};
use rent_predictor::{
    PredictionResponse, PredictionService, PredictorError, ServiceConfig, TrainedModel,
    TrainingConfig, TrainingPipeline,
};

#[derive(Parser)]
#[command(name = "rent-predictor")]
#[command(about = "Train and serve the flat rent model")]
#[command(
    after_help = "Environment:
  RENT_MODEL_PATH   Artifact path for predict/inspect
  RENT_LOG_JSON     Emit logs as JSON lines
  RUST_LOG          Log filter (default: info)"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a model on a listings CSV and write the artifact.
    Train {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// JSON file overriding training defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        n_estimators: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Price one flat from a JSON request (stdin when --request is omitted).
    Predict {
        #[arg(long, env = "RENT_MODEL_PATH")]
        model: PathBuf,
        #[arg(long)]
        request: Option<PathBuf>,
        #[arg(long, default_value = "₹")]
        currency: String,
    },
    /// Print artifact metadata.
    Inspect {
        #[arg(long, env = "RENT_MODEL_PATH")]
        model: PathBuf,
    },
    /// Write synthetic listings in the raw dataset schema.
    Generate {
        #[arg(long, default_value_t = 5000)]
        rows: usize,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn train(
    data: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    n_estimators: Option<usize>,
    seed: Option<u64>,
) -> Result<(), PredictorError> {
    let config = match config {
        Some(path) => TrainingConfig::from_json_file(path)?,
        None => TrainingConfig::default(),
    };
    let mut builder = TrainingPipeline::builder().config(config);
    if let Some(n) = n_estimators {
        builder = builder.n_estimators(n);
    }
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let pipeline = builder.build()?;

    let listings = load_listings(&data)?;
    let (model, report) = pipeline.fit(&listings)?;
    model.save(&output)?;

    println!("Rows: {} total, {} kept", report.filter.total, report.filter.kept);
    println!("Train/test: {}/{}", report.rows_train, report.rows_test);
    println!(
        "MAE: {:.0}  RMSE: {:.0}  R²: {:.3}",
        report.metrics.mae, report.metrics.rmse, report.metrics.r_squared
    );
    println!("Top localities:");
    for (locality, count) in &report.top_localities {
        println!("  {:<20} {}", locality, count);
    }
    println!("Top features:");
    for (name, importance) in &report.top_features {
        println!("  {:<32} {:.4}", name, importance);
    }
    println!("Reference flat: {:.0}", report.reference_prediction);
    println!("Saved model to {}", output.display());
    Ok(())
}

fn read_request(path: Option<PathBuf>) -> Result<Value, PredictorError> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn predict(
    model: PathBuf,
    request: Option<PathBuf>,
    currency: String,
) -> Result<bool, PredictorError> {
    let config = ServiceConfig::new(model).with_currency_symbol(currency);
    let service = PredictionService::load(&config)?;
    let (status, response) = match read_request(request) {
        Ok(body) => service.respond(&body),
        Err(err) => (
            400,
            PredictionResponse::Fail {
                message: format!("Invalid JSON body: {}", err),
            },
        ),
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(status == 200)
}

fn inspect(model: PathBuf) -> Result<(), PredictorError> {
    let model = TrainedModel::load(&model)?;
    let meta = model.metadata();
    println!("Format version: {}", meta.format_version);
    println!(
        "Rows: {} total, {} kept, {} train, {} test",
        meta.rows_total, meta.rows_kept, meta.rows_train, meta.rows_test
    );
    println!(
        "Forest: {} trees, max depth {}, seed {}",
        meta.n_estimators, meta.max_depth, meta.seed
    );
    println!(
        "MAE: {:.0}  RMSE: {:.0}  R²: {:.3}",
        meta.metrics.mae, meta.metrics.rmse, meta.metrics.r_squared
    );
    println!("Feature order: {}", model.feature_order().join(", "));
    for column in ["furnishing", "property_type", "locality"] {
        if let Some(categories) = model.categories(column) {
            println!("{}: {}", column, categories.join(", "));
        }
    }
    println!("Feature importances:");
    for (name, importance) in meta.feature_importances.iter().take(10) {
        println!("  {:<32} {:.4}", name, importance);
    }
    Ok(())
}

fn generate(rows: usize, output: PathBuf, seed: u64) -> Result<(), PredictorError> {
    let records = SyntheticListings::new(seed).records(rows);
    write_listings(&output, &records)?;
    println!("Wrote {} listings to {}", rows, output.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.json_logs || env_bool(LOG_JSON_ENV, false));

    let outcome = match cli.command {
        Commands::Train {
            data,
            output,
            config,
            n_estimators,
            seed,
        } => train(data, output, config, n_estimators, seed).map(|_| true),
        Commands::Predict {
            model,
            request,
            currency,
        } => predict(model, request, currency),
        Commands::Inspect { model } => inspect(model).map(|_| true),
        Commands::Generate { rows, output, seed } => generate(rows, output, seed).map(|_| true),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {}", err);
            ExitCode::from(2)
        }
    }
}
