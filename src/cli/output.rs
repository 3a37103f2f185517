//! CLI output formatting

use crate::{
    assembly::AssemblySummary,
    core::{GateAction, PipelineSpec},
    synth::{ActionKind, ManifestAction, ManifestStage, PipelineManifest, StageKind},
};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static GATE: Emoji<'_, '_> = Emoji("🚧 ", "# ");

/// One-line overview of a definition
pub fn format_spec_overview(spec: &PipelineSpec) -> String {
    let stages: Vec<String> = spec
        .stages
        .iter()
        .map(|s| format!("{} ({})", s.name, s.env))
        .collect();
    format!(
        "{} from {}@{} -> {}",
        style(&spec.name).bold(),
        style(&spec.synth.source.repo).cyan(),
        style(&spec.synth.source.branch).dim(),
        stages.join(" -> ")
    )
}

/// Format a gate for display
pub fn format_gate(gate: &GateAction) -> String {
    format!("{} {} [{}]", GATE, style(gate.name()).yellow(), style(gate.kind()).dim())
}

/// Format a stage kind for display
pub fn format_stage_kind(kind: StageKind) -> String {
    match kind {
        StageKind::Source => style("SOURCE").dim().to_string(),
        StageKind::Build => style("BUILD").dim().to_string(),
        StageKind::UpdatePipeline => style("UPDATE").dim().to_string(),
        StageKind::Deploy => style("DEPLOY").green().to_string(),
    }
}

/// Format a single action, with its details
pub fn format_action(action: &ManifestAction) -> String {
    let detail = match &action.kind {
        ActionKind::Source { repo, branch, .. } => format!("{}@{}", repo, branch),
        ActionKind::Build { commands, .. } => commands.join(" && "),
        ActionKind::SelfMutate => String::new(),
        ActionKind::ConfirmPermissionsBroadening { stage } => format!("stage {}", stage),
        ActionKind::Shell { commands, env } => {
            let bindings: Vec<String> = env
                .iter()
                .map(|b| format!("{}={}", b.name, b.source))
                .collect();
            if bindings.is_empty() {
                commands.join(" && ")
            } else {
                format!("{} ({})", commands.join(" && "), bindings.join(", "))
            }
        }
        ActionKind::ManualApproval { comment } => comment.clone().unwrap_or_default(),
        ActionKind::PrepareChangeSet { stack } | ActionKind::ExecuteChangeSet { stack } => {
            stack.clone()
        }
    };

    let name = if action.kind.is_gate() {
        style(&action.name).yellow().to_string()
    } else {
        style(&action.name).cyan().to_string()
    };

    format!(
        "{}. {} {} {}",
        action.run_order,
        name,
        style(format!("[{}]", action.kind.label())).dim(),
        detail
    )
    .trim_end()
    .to_string()
}

/// Format a manifest stage and its actions, one per line
pub fn format_stage(stage: &ManifestStage) -> String {
    let mut out = match &stage.env {
        Some(env) => format!(
            "{} {} {}",
            format_stage_kind(stage.kind),
            style(&stage.name).bold(),
            style(env).dim()
        ),
        None => format!("{} {}", format_stage_kind(stage.kind), style(&stage.name).bold()),
    };
    for action in &stage.actions {
        out.push_str("\n    ");
        out.push_str(&format_action(action));
    }
    out
}

/// Format a whole manifest as a plan
pub fn format_plan(manifest: &PipelineManifest) -> String {
    let mut out = format!(
        "{} {} ({} stages, {} actions)",
        ROCKET,
        style(&manifest.pipeline_name).bold(),
        manifest.stages.len(),
        manifest.action_count()
    );
    for stage in &manifest.stages {
        out.push_str("\n  ");
        out.push_str(&format_stage(stage));
    }
    out
}

/// Format a stored manifest summary for display
pub fn format_assembly_summary(summary: &AssemblySummary) -> String {
    format!(
        "{} {} - {} - {} stages, {} actions - {}",
        CHECK,
        style(&summary.synthesis_id.to_string()[..8]).dim(),
        style(&summary.pipeline_name).bold(),
        summary.stage_count,
        summary.action_count,
        style(summary.synthesized_at.to_rfc3339()).dim()
    )
}
