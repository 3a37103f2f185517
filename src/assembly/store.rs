//! Directory-based assembly store

use crate::assembly::{create_summary, sort_newest_first, AssemblyStore, AssemblySummary};
use crate::synth::PipelineManifest;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MANIFEST_SUFFIX: &str = ".manifest.json";

/// Stores one `<pipeline>.manifest.json` per pipeline in a directory
pub struct DirectoryAssemblyStore {
    dir: PathBuf,
}

impl DirectoryAssemblyStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create assembly directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open a store over `dir` without touching the filesystem
    ///
    /// A missing directory reads as an empty store.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the manifest file for a pipeline
    pub fn manifest_path(&self, pipeline_name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", file_stem(pipeline_name), MANIFEST_SUFFIX))
    }

    async fn read_manifest(path: &Path) -> Result<PipelineManifest> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Corrupt manifest {}", path.display()))
    }
}

/// File-name-safe form of a pipeline name
///
/// Bytes outside `[A-Za-z0-9_-]` are percent-encoded, so distinct names
/// never share a file.
fn file_stem(pipeline_name: &str) -> String {
    let mut stem = String::with_capacity(pipeline_name.len());
    for byte in pipeline_name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

#[async_trait::async_trait]
impl AssemblyStore for DirectoryAssemblyStore {
    async fn save(&self, manifest: &PipelineManifest) -> Result<()> {
        let path = self.manifest_path(&manifest.pipeline_name);
        let json = serde_json::to_string_pretty(manifest)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote manifest {}", path.display());
        Ok(())
    }

    async fn load(&self, pipeline_name: &str) -> Result<Option<PipelineManifest>> {
        let path = self.manifest_path(pipeline_name);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }

        let manifest = Self::read_manifest(&path).await?;
        if manifest.pipeline_name != pipeline_name {
            warn!(
                "{} holds pipeline '{}', not '{}'",
                path.display(),
                manifest.pipeline_name,
                pipeline_name
            );
            return Ok(None);
        }
        Ok(Some(manifest))
    }

    async fn list(&self) -> Result<Vec<AssemblySummary>> {
        if !tokio::fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to read {}", self.dir.display()))?;

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_manifest = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(MANIFEST_SUFFIX));
            if !is_manifest {
                continue;
            }

            match Self::read_manifest(&path).await {
                Ok(manifest) => summaries.push(create_summary(&manifest)),
                Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
            }
        }

        sort_newest_first(&mut summaries);
        Ok(summaries)
    }
}
