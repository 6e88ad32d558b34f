//! Shared application state for the server.
//!
//! Everything here is constructed once at startup and read-only afterwards,
//! except the workspace, which serializes its own checkout-then-read
//! critical section internally.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::config::Config;
use crate::core::Result;
use crate::corpus::{BugDataset, Workspace};
use crate::semantic::{EmbeddingTable, Projector};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Full configuration.
    pub config: Arc<Config>,
    /// Bug-report dataset.
    pub dataset: Arc<BugDataset>,
    /// Frozen embedding table.
    pub embeddings: Arc<EmbeddingTable>,
    /// Globally fitted 2D projection model.
    pub projector: Arc<Projector>,
    /// Candidate repository with its checkout lock and vector cache.
    pub workspace: Arc<Workspace>,
    /// Process start time, for uptime reporting.
    pub started: Instant,
}

impl AppState {
    /// Load all process-wide state. Any failure here is fatal to startup.
    pub fn bootstrap(config: Config) -> Result<Self> {
        let dataset = BugDataset::load(&config.dataset.path)?;
        info!(bugs = dataset.len(), "loaded bug-report dataset");

        let embeddings = EmbeddingTable::load(&config.embedding.path, config.embedding.dimension)?;
        info!(
            words = embeddings.len(),
            dimension = embeddings.dimension(),
            "loaded embedding table"
        );

        let projector = Projector::fit(&embeddings, &config.projection)?;
        info!("fitted projection model over embedding vocabulary");

        let workspace = Workspace::new(config.repository.path.clone());

        Ok(Self {
            dataset: Arc::new(dataset),
            embeddings: Arc::new(embeddings),
            projector: Arc::new(projector),
            workspace: Arc::new(workspace),
            config: Arc::new(config),
            started: Instant::now(),
        })
    }

    /// Seconds since bootstrap.
    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
