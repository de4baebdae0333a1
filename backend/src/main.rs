use backend::config::ServerConfig;
use backend::inference::TorchModelLoader;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    }

    let config = ServerConfig::load()?;
    log::info!(
        "Models directory: {} (input size {})",
        config.models_dir.display(),
        config.input_size
    );

    let loader = TorchModelLoader::new(config.input_size);
    backend::server::run(&config, loader).await?;
    Ok(())
}
