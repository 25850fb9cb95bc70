//! # tether_app
//!
//! Bootstraps the component system and exercises it once.
//!
//! ## Startup Sequence
//!
//! 1. Read [`AppConfig`] from the environment (`TETHER_HIERARCHY` names an
//!    optional block entity hierarchy file).
//! 2. Register component keys, factories and capability lookup providers.
//! 3. Build chunks and block entities, which freezes the factory registries.
//! 4. Query every capability lookup on every side of every placed block.

mod bootstrap;
mod config;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bootstrap::Bootstrap;
use config::AppConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tether_app=info".parse()?))
        .init();

    let config = AppConfig::from_env();
    info!(hierarchy = ?config.hierarchy_path, chunk_radius = config.chunk_radius, "tether starting");

    let bootstrap = Bootstrap::new(config)?;
    let summary = bootstrap.run()?;

    info!(
        chunks = summary.chunks,
        generated_chunks = summary.generated_chunks,
        block_entities = summary.block_entities,
        item_storages = summary.item_storages,
        fluid_storages = summary.fluid_storages,
        fluid_inserted = summary.fluid_inserted,
        "tether finished"
    );
    Ok(())
}
