//! Run-order planning for deploy stages

use crate::core::{GateAction, StackSpec, StageSpec};
use crate::synth::manifest::{ActionKind, EnvBinding, ManifestAction};
use std::collections::HashMap;

/// Group a stage's stacks into waves by dependency depth
///
/// Stacks without dependencies form the first wave; every other stack sits
/// one wave after its deepest dependency. Declaration order is kept within
/// a wave. Expects acyclic dependencies.
pub fn stack_waves(stage: &StageSpec) -> Vec<Vec<&StackSpec>> {
    let mut depths: HashMap<&str, usize> = HashMap::new();
    for stack in &stage.stacks {
        depth_of(stage, &stack.id, &mut depths);
    }

    let mut waves: Vec<Vec<&StackSpec>> = Vec::new();
    for stack in &stage.stacks {
        let depth = depths.get(stack.id.as_str()).copied().unwrap_or(0);
        if waves.len() <= depth {
            waves.resize_with(depth + 1, Vec::new);
        }
        waves[depth].push(stack);
    }

    waves
}

fn depth_of<'a>(stage: &'a StageSpec, stack_id: &'a str, depths: &mut HashMap<&'a str, usize>) -> usize {
    if let Some(depth) = depths.get(stack_id) {
        return *depth;
    }

    let depth = match stage.stack(stack_id) {
        Some(stack) => stack
            .depends_on
            .iter()
            .map(|dep| depth_of(stage, dep, depths) + 1)
            .max()
            .unwrap_or(0),
        None => 0,
    };

    depths.insert(stack_id, depth);
    depth
}

/// Lay out a deploy stage's actions
///
/// Pre gates run one after another, then each wave prepares its change
/// sets, runs the change-set gates of its stacks and executes; post gates
/// run last, one after another.
pub fn plan_stage(stage: &StageSpec) -> Vec<ManifestAction> {
    let mut actions = Vec::new();
    let mut order: u32 = 1;

    for gate in &stage.pre {
        actions.push(gate_action(gate, order));
        order += 1;
    }

    for wave in stack_waves(stage) {
        for stack in &wave {
            actions.push(ManifestAction {
                name: stack.prepare_action_name(),
                run_order: order,
                kind: ActionKind::PrepareChangeSet {
                    stack: stack.id.clone(),
                },
            });
        }

        let mut longest = 0;
        for stack in &wave {
            let gates = stage.gates_for_stack(&stack.id);
            for (offset, gate) in (1..).zip(gates) {
                actions.push(gate_action(gate, order + offset));
            }
            longest = longest.max(gates.len() as u32);
        }

        let execute_order = order + longest + 1;
        for stack in &wave {
            actions.push(ManifestAction {
                name: stack.deploy_action_name(),
                run_order: execute_order,
                kind: ActionKind::ExecuteChangeSet {
                    stack: stack.id.clone(),
                },
            });
        }
        order = execute_order + 1;
    }

    for gate in &stage.post {
        actions.push(gate_action(gate, order));
        order += 1;
    }

    actions.sort_by_key(|a| a.run_order);
    actions
}

/// Translate a gate into a manifest action
pub fn gate_action(gate: &GateAction, run_order: u32) -> ManifestAction {
    let kind = match gate {
        GateAction::PermissionBroadeningCheck(check) => ActionKind::ConfirmPermissionsBroadening {
            stage: check.stage.clone(),
        },
        GateAction::ShellCommandCheck(shell) => ActionKind::Shell {
            commands: shell.commands.clone(),
            env: shell
                .env_from_outputs
                .iter()
                .map(|(name, source)| EnvBinding {
                    name: name.clone(),
                    source: source.clone(),
                })
                .collect(),
        },
        GateAction::ManualApproval(approval) => ActionKind::ManualApproval {
            comment: approval.comment.clone(),
        },
    };

    ManifestAction {
        name: gate.name().to_string(),
        run_order,
        kind,
    }
}
