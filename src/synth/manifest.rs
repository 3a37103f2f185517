//! Synthesized pipeline manifest
//!
//! The manifest is what the orchestration platform consumes: pipeline
//! stages in execution order, each with actions carrying a run order.
//! Actions sharing a run order within a stage may run concurrently.

use crate::core::{Environment, OutputRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A synthesized pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineManifest {
    /// Unique id of this synthesis
    pub synthesis_id: Uuid,

    /// When the manifest was produced
    pub synthesized_at: DateTime<Utc>,

    pub pipeline_name: String,

    pub cross_account_keys: bool,

    /// Pipeline stages in execution order
    pub stages: Vec<ManifestStage>,
}

impl PipelineManifest {
    pub fn stage(&self, name: &str) -> Option<&ManifestStage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Names of the stages that deploy application stacks
    pub fn deploy_stage_names(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.kind == StageKind::Deploy)
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn action_count(&self) -> usize {
        self.stages.iter().map(|s| s.actions.len()).sum()
    }
}

/// What a pipeline stage is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    Source,
    Build,
    UpdatePipeline,
    Deploy,
}

/// A stage of the synthesized pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestStage {
    pub name: String,

    pub kind: StageKind,

    /// Deployment target, for deploy stages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Environment>,

    /// Actions ordered by run order
    pub actions: Vec<ManifestAction>,
}

impl ManifestStage {
    pub fn action(&self, name: &str) -> Option<&ManifestAction> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Highest run order in the stage
    pub fn last_run_order(&self) -> u32 {
        self.actions.iter().map(|a| a.run_order).max().unwrap_or(0)
    }
}

/// A single action within a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestAction {
    pub name: String,

    /// Actions with lower run orders finish before higher ones start
    pub run_order: u32,

    #[serde(flatten)]
    pub kind: ActionKind,
}

/// Environment variable bound to a stack output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvBinding {
    pub name: String,
    pub source: OutputRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ActionKind {
    /// Fetch the source repository
    Source {
        repo: String,
        branch: String,
        authentication: String,
    },

    /// Install, build and synthesize
    Build {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        install_commands: Vec<String>,
        commands: Vec<String>,
        output_directory: String,
    },

    /// Update the pipeline's own definition
    SelfMutate,

    ConfirmPermissionsBroadening {
        stage: String,
    },

    Shell {
        commands: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        env: Vec<EnvBinding>,
    },

    ManualApproval {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },

    PrepareChangeSet {
        stack: String,
    },

    ExecuteChangeSet {
        stack: String,
    },
}

impl ActionKind {
    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Source { .. } => "source",
            ActionKind::Build { .. } => "build",
            ActionKind::SelfMutate => "self-mutate",
            ActionKind::ConfirmPermissionsBroadening { .. } => "confirm-permissions-broadening",
            ActionKind::Shell { .. } => "shell",
            ActionKind::ManualApproval { .. } => "manual-approval",
            ActionKind::PrepareChangeSet { .. } => "prepare-change-set",
            ActionKind::ExecuteChangeSet { .. } => "execute-change-set",
        }
    }

    /// Whether the action holds back progression rather than deploying
    pub fn is_gate(&self) -> bool {
        matches!(
            self,
            ActionKind::ConfirmPermissionsBroadening { .. }
                | ActionKind::Shell { .. }
                | ActionKind::ManualApproval { .. }
        )
    }
}
