//! Test: Synthesis of the service pipeline

use crate::helpers::*;
use deploy_pipeline::synth::{render, synthesize, ActionKind, OutputFormat, PipelineManifest, StageKind};

#[test]
fn test_deploy_stages_follow_definition_order() {
    let spec = load_service_pipeline();
    let manifest = synthesize(&spec).unwrap();

    assert_eq!(manifest.deploy_stage_names(), spec.stage_names());
    assert_eq!(manifest_stage(&manifest, "PreProd").kind, StageKind::Deploy);
    assert_eq!(
        manifest_stage(&manifest, "Prod").env.as_ref().map(|e| e.region.as_str()),
        Some("us-west-2")
    );
}

#[test]
fn test_preprod_run_orders() {
    let manifest = synthesize(&load_service_pipeline()).unwrap();
    assert_run_orders(
        manifest_stage(&manifest, "PreProd"),
        &[
            ("Broadening Permission Check", 1),
            ("WebService.Prepare", 2),
            ("WebService.Deploy", 3),
            ("TestService", 4),
        ],
    );
}

#[test]
fn test_prod_run_orders() {
    let manifest = synthesize(&load_service_pipeline()).unwrap();
    assert_run_orders(
        manifest_stage(&manifest, "Prod"),
        &[
            ("WebService.Prepare", 1),
            ("PromoteToProd", 2),
            ("WebService.Deploy", 3),
        ],
    );
}

#[test]
fn test_smoke_test_env_binding() {
    let manifest = synthesize(&load_service_pipeline()).unwrap();
    let action = manifest_stage(&manifest, "PreProd").action("TestService").unwrap();

    match &action.kind {
        ActionKind::Shell { commands, env } => {
            assert_eq!(commands.len(), 1);
            assert_eq!(env.len(), 1);
            assert_eq!(env[0].name, "ENDPOINT_URL");
            assert_eq!(env[0].source.to_string(), "PreProd/WebService/Url");
        }
        other => panic!("Expected shell action, got {:?}", other),
    }
}

#[test]
fn test_each_synthesis_has_its_own_id() {
    let spec = load_service_pipeline();
    let first = synthesize(&spec).unwrap();
    let second = synthesize(&spec).unwrap();
    assert_ne!(first.synthesis_id, second.synthesis_id);
    assert_eq!(first.stages, second.stages);
}

#[test]
fn test_yaml_manifest_round_trip() {
    let manifest = synthesize(&load_service_pipeline()).unwrap();
    let yaml = render(&manifest, OutputFormat::Yaml).unwrap();
    assert!(yaml.contains("action: manual-approval"));

    let back: PipelineManifest = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back.stages, manifest.stages);
}
