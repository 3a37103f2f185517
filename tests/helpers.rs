//! Test utility functions for deploy-pipeline

#![allow(dead_code)]

use deploy_pipeline::core::config::PipelineConfig;
use deploy_pipeline::core::{GateAction, PipelineSpec, StageSpec};
use deploy_pipeline::demo::SERVICE_PIPELINE_YAML;
use deploy_pipeline::synth::{ManifestStage, PipelineManifest};

/// Load the bundled service pipeline definition
pub fn load_service_pipeline() -> PipelineSpec {
    PipelineConfig::from_yaml(SERVICE_PIPELINE_YAML)
        .expect("service pipeline should load")
        .into_spec()
}

/// Load the bundled definition with variable overrides
pub fn load_service_pipeline_with(overrides: &[(&str, &str)]) -> PipelineSpec {
    let overrides: Vec<(String, String)> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    PipelineConfig::from_yaml_with_overrides(SERVICE_PIPELINE_YAML, &overrides)
        .expect("service pipeline should load")
        .into_spec()
}

/// Get a stage or fail the test
pub fn stage<'a>(spec: &'a PipelineSpec, name: &str) -> &'a StageSpec {
    spec.stage(name)
        .unwrap_or_else(|| panic!("Stage '{}' should exist", name))
}

/// Get a manifest stage or fail the test
pub fn manifest_stage<'a>(manifest: &'a PipelineManifest, name: &str) -> &'a ManifestStage {
    manifest
        .stage(name)
        .unwrap_or_else(|| panic!("Manifest stage '{}' should exist", name))
}

/// The shape of a stage's gates: (phase, kind, name) in engine order
pub fn gate_shape(stage: &StageSpec) -> Vec<(String, &'static str, String)> {
    let describe = |phase: &str, gate: &GateAction| {
        (phase.to_string(), gate.kind(), gate.name().to_string())
    };

    let mut shape: Vec<_> = stage.pre.iter().map(|g| describe("pre", g)).collect();
    for (stack, gates) in &stage.stack_gates {
        shape.extend(gates.iter().map(|g| describe(stack.as_str(), g)));
    }
    shape.extend(stage.post.iter().map(|g| describe("post", g)));
    shape
}

/// The shape of a whole pipeline: stage names with their gate shapes
pub fn pipeline_shape(spec: &PipelineSpec) -> Vec<(String, Vec<(String, &'static str, String)>)> {
    spec.stages
        .iter()
        .map(|s| (s.name.clone(), gate_shape(s)))
        .collect()
}

/// Assert action names and run orders of a manifest stage
pub fn assert_run_orders(stage: &ManifestStage, expected: &[(&str, u32)]) {
    let actual: Vec<(&str, u32)> = stage
        .actions
        .iter()
        .map(|a| (a.name.as_str(), a.run_order))
        .collect();
    assert_eq!(actual, expected, "Run orders of stage '{}'", stage.name);
}
