//! `assetline watch`: initial build, then rebuild and reload on change.

use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;

use crate::actor::Coordinator;
use crate::config::PipelineConfig;

pub fn run(config: Arc<PipelineConfig>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_shutdown(shutdown_tx);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to create runtime")?;

    runtime.block_on(Coordinator::new(config, shutdown_rx).run())
}
