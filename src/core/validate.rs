//! Structural validation of pipeline definitions
//!
//! Only the shape of the definition is checked here. Whether the account
//! exists, the repository is reachable or the output is really exported is
//! left to the orchestration platform.

use crate::core::gate::{GateAction, OutputRef, ShellCheck};
use crate::core::spec::{PipelineSpec, StageSpec};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

/// A structural problem in a pipeline definition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Pipeline name must not be empty")]
    EmptyPipelineName,

    #[error("Pipeline '{0}' has no stages")]
    NoStages(String),

    #[error("Pipeline '{0}' has no synth step")]
    MissingSynth(String),

    #[error("Source repository '{0}' is not in 'owner/repo' form")]
    InvalidRepository(String),

    #[error("Source branch must not be empty")]
    EmptyBranch,

    #[error("Synth step has no build commands")]
    NoBuildCommands,

    #[error("Stage name must not be empty")]
    EmptyStageName,

    #[error("Duplicate stage name: {0}")]
    DuplicateStage(String),

    #[error("Invalid {kind} name '{name}' (must be non-empty and contain no '/')")]
    InvalidName { kind: &'static str, name: String },

    #[error("Stage '{stage}' has invalid account id '{account}' (expected 12 digits)")]
    InvalidAccount { stage: String, account: String },

    #[error("Stage '{stage}' has invalid region '{region}'")]
    InvalidRegion { stage: String, region: String },

    #[error("Stage '{0}' deploys no stacks")]
    NoStacks(String),

    #[error("Stage '{stage}' declares stack '{stack}' more than once")]
    DuplicateStack { stage: String, stack: String },

    #[error("Stack '{stack}' in stage '{stage}' depends on non-existent stack '{dependency}'")]
    UnknownStackDependency {
        stage: String,
        stack: String,
        dependency: String,
    },

    #[error("Cycle detected in stack dependencies of stage '{stage}' involving '{stack}'")]
    StackCycle { stage: String, stack: String },

    #[error("Stage '{stage}' has gates for non-existent stack '{stack}'")]
    UnknownGateStack { stage: String, stack: String },

    #[error("Stage '{0}' has a gate with an empty name")]
    EmptyGateName(String),

    #[error("Stage '{stage}' has more than one gate named '{gate}'")]
    DuplicateGate { stage: String, gate: String },

    #[error("Gate '{gate}' in stage '{stage}' clashes with a stack deployment action")]
    ReservedGateName { stage: String, gate: String },

    #[error("Gate '{gate}' in stage '{stage}' references non-existent stage '{target}'")]
    UnknownStageReference {
        stage: String,
        gate: String,
        target: String,
    },

    #[error("Shell gate '{gate}' in stage '{stage}' has no commands")]
    EmptyShellCommands { stage: String, gate: String },

    #[error("Shell gate '{gate}' in stage '{stage}' injects invalid variable name '{var}'")]
    InvalidEnvVar {
        stage: String,
        gate: String,
        var: String,
    },

    #[error("Shell gate '{gate}' in stage '{stage}' references undeclared output '{output}'")]
    UnknownOutput {
        stage: String,
        gate: String,
        output: OutputRef,
    },

    #[error("Shell gate '{gate}' in stage '{stage}' reads output '{output}' before it is deployed")]
    OutputNotYetAvailable {
        stage: String,
        gate: String,
        output: OutputRef,
    },

    #[error("Manual approval '{gate}' in stage '{stage}' has an empty comment")]
    EmptyApprovalComment { stage: String, gate: String },
}

/// Where in a stage a gate sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GatePhase {
    Pre,
    Stack,
    Post,
}

/// Validate a pipeline definition, reporting the first problem found
pub fn validate(spec: &PipelineSpec) -> Result<(), ValidationError> {
    if spec.name.trim().is_empty() {
        return Err(ValidationError::EmptyPipelineName);
    }

    let source = &spec.synth.source;
    if source.owner().is_none() {
        return Err(ValidationError::InvalidRepository(source.repo.clone()));
    }
    if source.branch.trim().is_empty() {
        return Err(ValidationError::EmptyBranch);
    }
    if spec.synth.commands.iter().all(|c| c.trim().is_empty()) {
        return Err(ValidationError::NoBuildCommands);
    }

    if spec.stages.is_empty() {
        return Err(ValidationError::NoStages(spec.name.clone()));
    }

    let mut seen_stages = HashSet::new();
    for stage in &spec.stages {
        if stage.name.trim().is_empty() {
            return Err(ValidationError::EmptyStageName);
        }
        check_segment("stage", &stage.name)?;
        if !seen_stages.insert(stage.name.as_str()) {
            return Err(ValidationError::DuplicateStage(stage.name.clone()));
        }
    }

    for (index, stage) in spec.stages.iter().enumerate() {
        debug!("Validating stage {} ({})", stage.name, stage.env);
        validate_environment(stage)?;
        validate_stacks(stage)?;
        validate_gates(spec, index, stage)?;
    }

    Ok(())
}

fn validate_environment(stage: &StageSpec) -> Result<(), ValidationError> {
    if !account_regex().is_match(&stage.env.account) {
        return Err(ValidationError::InvalidAccount {
            stage: stage.name.clone(),
            account: stage.env.account.clone(),
        });
    }
    if !region_regex().is_match(&stage.env.region) {
        return Err(ValidationError::InvalidRegion {
            stage: stage.name.clone(),
            region: stage.env.region.clone(),
        });
    }
    Ok(())
}

fn validate_stacks(stage: &StageSpec) -> Result<(), ValidationError> {
    if stage.stacks.is_empty() {
        return Err(ValidationError::NoStacks(stage.name.clone()));
    }

    let mut ids = HashSet::new();
    for stack in &stage.stacks {
        check_segment("stack", &stack.id)?;
        for output in &stack.outputs {
            check_segment("output", output)?;
        }
        if !ids.insert(stack.id.as_str()) {
            return Err(ValidationError::DuplicateStack {
                stage: stage.name.clone(),
                stack: stack.id.clone(),
            });
        }
    }

    for stack in &stage.stacks {
        for dep in &stack.depends_on {
            if !ids.contains(dep.as_str()) {
                return Err(ValidationError::UnknownStackDependency {
                    stage: stage.name.clone(),
                    stack: stack.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    check_stack_cycles(stage)?;

    for stack in stage.stack_gates.keys() {
        if !ids.contains(stack.as_str()) {
            return Err(ValidationError::UnknownGateStack {
                stage: stage.name.clone(),
                stack: stack.clone(),
            });
        }
    }

    Ok(())
}

/// Names that end up as a segment of a `Stage/Stack/Output` reference
fn check_segment(kind: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() || name.contains('/') {
        return Err(ValidationError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn check_stack_cycles(stage: &StageSpec) -> Result<(), ValidationError> {
    let mut visited = HashSet::new();
    let mut recursion_stack = HashSet::new();

    for stack in &stage.stacks {
        if !visited.contains(stack.id.as_str()) {
            dfs_check(stage, &stack.id, &mut visited, &mut recursion_stack)?;
        }
    }

    Ok(())
}

fn dfs_check<'a>(
    stage: &'a StageSpec,
    stack_id: &'a str,
    visited: &mut HashSet<&'a str>,
    recursion_stack: &mut HashSet<&'a str>,
) -> Result<(), ValidationError> {
    visited.insert(stack_id);
    recursion_stack.insert(stack_id);

    if let Some(stack) = stage.stack(stack_id) {
        for dep in &stack.depends_on {
            if recursion_stack.contains(dep.as_str()) {
                return Err(ValidationError::StackCycle {
                    stage: stage.name.clone(),
                    stack: dep.clone(),
                });
            }
            if !visited.contains(dep.as_str()) {
                dfs_check(stage, dep, visited, recursion_stack)?;
            }
        }
    }

    recursion_stack.remove(stack_id);
    Ok(())
}

fn validate_gates(
    spec: &PipelineSpec,
    stage_index: usize,
    stage: &StageSpec,
) -> Result<(), ValidationError> {
    let phased = stage
        .pre
        .iter()
        .map(|g| (GatePhase::Pre, g))
        .chain(
            stage
                .stack_gates
                .values()
                .flatten()
                .map(|g| (GatePhase::Stack, g)),
        )
        .chain(stage.post.iter().map(|g| (GatePhase::Post, g)));

    let mut names = HashSet::new();
    for (phase, gate) in phased {
        if gate.name().trim().is_empty() {
            return Err(ValidationError::EmptyGateName(stage.name.clone()));
        }
        if !names.insert(gate.name()) {
            return Err(ValidationError::DuplicateGate {
                stage: stage.name.clone(),
                gate: gate.name().to_string(),
            });
        }
        let clashes = stage.stacks.iter().any(|stack| {
            gate.name() == stack.prepare_action_name() || gate.name() == stack.deploy_action_name()
        });
        if clashes {
            return Err(ValidationError::ReservedGateName {
                stage: stage.name.clone(),
                gate: gate.name().to_string(),
            });
        }

        match gate {
            GateAction::PermissionBroadeningCheck(check) => {
                if spec.stage(&check.stage).is_none() {
                    return Err(ValidationError::UnknownStageReference {
                        stage: stage.name.clone(),
                        gate: check.name.clone(),
                        target: check.stage.clone(),
                    });
                }
            }
            GateAction::ShellCommandCheck(shell) => {
                validate_shell(spec, stage_index, stage, phase, shell)?;
            }
            GateAction::ManualApproval(approval) => {
                if let Some(comment) = &approval.comment {
                    if comment.trim().is_empty() {
                        return Err(ValidationError::EmptyApprovalComment {
                            stage: stage.name.clone(),
                            gate: approval.name.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

fn validate_shell(
    spec: &PipelineSpec,
    stage_index: usize,
    stage: &StageSpec,
    phase: GatePhase,
    shell: &ShellCheck,
) -> Result<(), ValidationError> {
    if shell.commands.iter().all(|c| c.trim().is_empty()) {
        return Err(ValidationError::EmptyShellCommands {
            stage: stage.name.clone(),
            gate: shell.name.clone(),
        });
    }

    for (var, output) in &shell.env_from_outputs {
        if !env_var_regex().is_match(var) {
            return Err(ValidationError::InvalidEnvVar {
                stage: stage.name.clone(),
                gate: shell.name.clone(),
                var: var.clone(),
            });
        }

        let declared = spec
            .stage(&output.stage)
            .and_then(|s| s.stack(&output.stack))
            .is_some_and(|s| s.has_output(&output.output));
        if !declared {
            return Err(ValidationError::UnknownOutput {
                stage: stage.name.clone(),
                gate: shell.name.clone(),
                output: output.clone(),
            });
        }

        // Outputs exist once their stage has deployed: earlier stages always,
        // the current stage only after its stacks.
        let available = match spec.stage_index(&output.stage) {
            Some(i) if i < stage_index => true,
            Some(i) if i == stage_index => phase == GatePhase::Post,
            _ => false,
        };
        if !available {
            return Err(ValidationError::OutputNotYetAvailable {
                stage: stage.name.clone(),
                gate: shell.name.clone(),
                output: output.clone(),
            });
        }
    }

    for var in shell.unreferenced_injections() {
        warn!(
            "Shell gate '{}' in stage '{}' injects ${} but no command uses it",
            shell.name, stage.name, var
        );
    }

    Ok(())
}

fn account_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{12}$").expect("account pattern is valid"))
}

fn region_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d+$").expect("region pattern is valid"))
}

fn env_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("variable pattern is valid"))
}
