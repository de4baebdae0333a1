use clap::Parser;
use frontend::diagnostics::DiseaseCatalog;
use frontend::plant_mapper::parse_plant;
use frontend::{ClientConfig, PredictionClient, diagnose};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "frontend", about = "Diagnose plant leaves with the prediction server")]
struct Args {
    /// Plant name, e.g. `tomato` or `помидор`
    #[clap(long)]
    plant: String,

    /// Leaf crops to classify (JPEG or PNG)
    #[clap(required = true)]
    images: Vec<PathBuf>,

    /// Disease catalog, overrides DISEASES_DB
    #[clap(long)]
    diseases_db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(path) = args.diseases_db {
        config.diseases_db = path;
    }

    let plant = parse_plant(&args.plant)?;
    let catalog = DiseaseCatalog::load(&config.diseases_db)?;

    let mut images = Vec::with_capacity(args.images.len());
    for path in &args.images {
        images.push(tokio::fs::read(path).await.map_err(|e| format!("{}: {e}", path.display()))?);
    }

    let client = PredictionClient::new(&config)?;
    let outcome = diagnose(&client, &catalog, plant, images).await;
    client.close().await;

    match outcome {
        Ok(report) => {
            println!("{}", report.messages().join("\n\n"));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            Err(e.into())
        }
    }
}
