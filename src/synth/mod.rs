//! Synthesis - translating a pipeline definition into a manifest

pub mod manifest;
pub mod planner;

pub use manifest::{ActionKind, EnvBinding, ManifestAction, ManifestStage, PipelineManifest, StageKind};

use crate::core::{validate, PipelineSpec, ValidationError};
use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

/// Serialization format for manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Synthesize a pipeline definition into a manifest
///
/// The definition is validated first, so a malformed definition never
/// produces a manifest.
pub fn synthesize(spec: &PipelineSpec) -> Result<PipelineManifest, ValidationError> {
    validate(spec)?;

    info!("Synthesizing pipeline {} ({} stages)", spec.name, spec.stages.len());

    let mut stages = vec![source_stage(spec), build_stage(spec)];
    if spec.self_mutation {
        stages.push(ManifestStage {
            name: "UpdatePipeline".to_string(),
            kind: StageKind::UpdatePipeline,
            env: None,
            actions: vec![ManifestAction {
                name: "SelfMutate".to_string(),
                run_order: 1,
                kind: ActionKind::SelfMutate,
            }],
        });
    }

    for stage in &spec.stages {
        let actions = planner::plan_stage(stage);
        debug!("Stage {}: {} actions", stage.name, actions.len());
        stages.push(ManifestStage {
            name: stage.name.clone(),
            kind: StageKind::Deploy,
            env: Some(stage.env.clone()),
            actions,
        });
    }

    Ok(PipelineManifest {
        synthesis_id: Uuid::new_v4(),
        synthesized_at: Utc::now(),
        pipeline_name: spec.name.clone(),
        cross_account_keys: spec.cross_account_keys,
        stages,
    })
}

fn source_stage(spec: &PipelineSpec) -> ManifestStage {
    let source = &spec.synth.source;
    ManifestStage {
        name: "Source".to_string(),
        kind: StageKind::Source,
        env: None,
        actions: vec![ManifestAction {
            name: source.repo.replace('/', "_"),
            run_order: 1,
            kind: ActionKind::Source {
                repo: source.repo.clone(),
                branch: source.branch.clone(),
                authentication: source.authentication.clone(),
            },
        }],
    }
}

fn build_stage(spec: &PipelineSpec) -> ManifestStage {
    ManifestStage {
        name: "Build".to_string(),
        kind: StageKind::Build,
        env: None,
        actions: vec![ManifestAction {
            name: "Synth".to_string(),
            run_order: 1,
            kind: ActionKind::Build {
                install_commands: spec.synth.install_commands.clone(),
                commands: spec.synth.commands.clone(),
                output_directory: spec.synth.primary_output_directory.clone(),
            },
        }],
    }
}

/// Render a manifest in the given format
pub fn render(manifest: &PipelineManifest, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(manifest)?,
        OutputFormat::Yaml => serde_yaml::to_string(manifest)?,
    })
}
