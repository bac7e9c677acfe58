use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use flatprice::{ModelHandle, ModelManager, PredictionResult, RawInput, RuntimeConfig};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding model.onnx and preprocessing.json
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Read the flat's attributes from a JSON file instead of the flags below
    #[arg(long)]
    input: Option<PathBuf>,

    /// Floor area in square metres
    #[arg(long, default_value = "")]
    floor_area: String,
    #[arg(long, default_value = "")]
    town: String,
    #[arg(long, default_value = "")]
    flat_type: String,
    #[arg(long, default_value = "")]
    flat_model: String,
    /// Storey range, e.g. "07 TO 09"
    #[arg(long, default_value = "")]
    storey_range: String,
    /// Remaining lease, e.g. "75 years 00 months" or "75.5"
    #[arg(long, default_value = "")]
    remaining_lease: String,
    /// Reference month, YYYY-MM
    #[arg(long, default_value = "")]
    month: String,
    /// Lease commencement year
    #[arg(long, default_value = "")]
    lease_commence: String,

    /// Intra-op threads for ONNX Runtime (0 lets the runtime decide)
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn raw_input(&self) -> anyhow::Result<RawInput> {
        if let Some(path) = &self.input {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading input file {:?}", path))?;
            return serde_json::from_str(&text).with_context(|| format!("parsing input file {:?}", path));
        }
        Ok(RawInput {
            floor_area_sqm: self.floor_area.clone(),
            town: self.town.clone(),
            flat_type: self.flat_type.clone(),
            flat_model: self.flat_model.clone(),
            storey_range: self.storey_range.clone(),
            remaining_lease: self.remaining_lease.clone(),
            month: self.month.clone(),
            lease_commence_date: self.lease_commence.clone(),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("=== Starting Price Range Prediction ===");
    let input = args.raw_input()?;

    let manager = match &args.model_dir {
        Some(dir) => ModelManager::new(dir)?,
        None => ModelManager::new_default()?,
    };
    info!("Using model bundle at {:?}", manager.models_dir());

    let runtime_config = RuntimeConfig {
        intra_threads: args.threads,
        ..RuntimeConfig::default()
    };
    let handle = ModelHandle::from_bundle(manager, runtime_config);

    let start_time = Instant::now();
    handle.load().await.context("loading model bundle")?;
    info!("=== Model Loaded (took {:.2?}) ===", start_time.elapsed());

    let predict_start = Instant::now();
    let result = handle.predict_async(input).await?;
    info!("Prediction took {:.2?}", predict_start.elapsed());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&handle, &result)?;
    }

    handle.release();
    Ok(())
}

fn print_result(handle: &ModelHandle, result: &PredictionResult) -> anyhow::Result<()> {
    let predictor = handle.predictor()?;
    let labels = &predictor.config().labels;

    let mut scores: Vec<_> = labels.iter().zip(result.probabilities.iter()).collect();
    scores.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

    println!("\nResults:");
    println!("  Predicted range: {}", result.label);
    println!("  Probabilities (sorted):");
    for (label, probability) in scores {
        println!("    {}: {:.1}%", label, probability * 100.0);
    }

    if result.used_defaults() {
        println!("  Warnings:");
        for diagnostic in &result.diagnostics {
            println!("    - {}", diagnostic);
        }
    }
    Ok(())
}
