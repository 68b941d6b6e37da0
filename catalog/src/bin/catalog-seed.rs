//! Reset a running catalog service to the products listed in a YAML seed file.

use catalog::{
    client::{CatalogClient, SeedFile},
    telemetry,
};
use clap::Parser;
use std::{path::PathBuf, time::Duration};

#[derive(Parser, Debug)]
#[command(author, version, about = "Delete every product, then load the products in a seed file")]
struct Args {
    /// YAML file with a top-level `products` list
    file: PathBuf,

    /// Base URL of the catalog service
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "WAIT_SECONDS", default_value_t = 30)]
    wait_seconds: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init_telemetry(false)?;

    let seed = SeedFile::load(&args.file)?;
    tracing::info!("Loaded {} products from {}", seed.products.len(), args.file.display());

    let client = CatalogClient::new(&args.base_url, Duration::from_secs(args.wait_seconds))?;
    let created = client.reset_and_load(&seed.products).await?;

    for product in &created {
        tracing::debug!("Created {}", product);
    }
    println!("Loaded {} products into {}", created.len(), args.base_url);
    Ok(())
}
