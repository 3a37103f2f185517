//! Assembly storage for synthesized manifests

pub mod store;

pub use store::DirectoryAssemblyStore;

use crate::synth::PipelineManifest;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Default directory manifests are written to
pub const DEFAULT_ASSEMBLY_DIR: &str = "pipeline.out";

/// Summary of a stored manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblySummary {
    /// Pipeline name
    pub pipeline_name: String,

    /// Id of the synthesis that produced the manifest
    pub synthesis_id: Uuid,

    /// When the manifest was produced
    pub synthesized_at: DateTime<Utc>,

    /// Number of pipeline stages (source and build included)
    pub stage_count: usize,

    /// Number of actions across all stages
    pub action_count: usize,
}

/// Trait for assembly backends
///
/// A backend keeps the latest manifest per pipeline.
#[async_trait::async_trait]
pub trait AssemblyStore: Send + Sync {
    /// Save a manifest, replacing any earlier one for the same pipeline
    async fn save(&self, manifest: &PipelineManifest) -> Result<()>;

    /// Load the manifest of a pipeline
    async fn load(&self, pipeline_name: &str) -> Result<Option<PipelineManifest>>;

    /// Summaries of every stored manifest, newest first
    async fn list(&self) -> Result<Vec<AssemblySummary>>;
}

/// In-memory assembly store (for testing or dry runs)
pub struct InMemoryAssemblyStore {
    manifests: tokio::sync::RwLock<HashMap<String, PipelineManifest>>,
}

impl InMemoryAssemblyStore {
    pub fn new() -> Self {
        Self {
            manifests: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryAssemblyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AssemblyStore for InMemoryAssemblyStore {
    async fn save(&self, manifest: &PipelineManifest) -> Result<()> {
        let mut manifests = self.manifests.write().await;
        manifests.insert(manifest.pipeline_name.clone(), manifest.clone());
        Ok(())
    }

    async fn load(&self, pipeline_name: &str) -> Result<Option<PipelineManifest>> {
        let manifests = self.manifests.read().await;
        Ok(manifests.get(pipeline_name).cloned())
    }

    async fn list(&self) -> Result<Vec<AssemblySummary>> {
        let manifests = self.manifests.read().await;
        let mut summaries: Vec<_> = manifests.values().map(create_summary).collect();
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }
}

/// Create a summary from a manifest
pub fn create_summary(manifest: &PipelineManifest) -> AssemblySummary {
    AssemblySummary {
        pipeline_name: manifest.pipeline_name.clone(),
        synthesis_id: manifest.synthesis_id,
        synthesized_at: manifest.synthesized_at,
        stage_count: manifest.stages.len(),
        action_count: manifest.action_count(),
    }
}

pub(crate) fn sort_newest_first(summaries: &mut [AssemblySummary]) {
    summaries.sort_by(|a, b| {
        b.synthesized_at
            .cmp(&a.synthesized_at)
            .then_with(|| a.pipeline_name.cmp(&b.pipeline_name))
    });
}
