use anyhow::{Context, Result};
use std::env;
use std::path::Path;

use netflix_proof::{logging, ProofConfig, ProofEngine};

// Usage: netflix-proof [config.toml]
fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = ProofConfig::load(args.get(1).map(Path::new))?;
    logging::init_logging(&config.logging)?;

    tracing::info!("netflix-proof v{}", netflix_proof::VERSION);

    let engine = ProofEngine::new(config);
    let response = engine.generate();

    let json = serde_json::to_string_pretty(&response).context("Failed to serialize proof")?;

    if let Some(output_dir) = &engine.config().output_dir {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let path = output_dir.join("results.json");
        std::fs::write(&path, &json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Proof written to {}", path.display());
    }

    println!("{}", json);

    Ok(())
}
