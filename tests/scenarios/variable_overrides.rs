//! Test: Variable overrides - environment values kept outside the definition

use crate::helpers::*;
use deploy_pipeline::core::config::{ConfigError, PipelineConfig};
use deploy_pipeline::demo::SERVICE_PIPELINE_YAML;

#[test]
fn test_defaults_from_definition() {
    let spec = load_service_pipeline();
    let preprod = stage(&spec, "PreProd");
    let prod = stage(&spec, "Prod");

    assert_eq!(preprod.env.account, "968520978119");
    assert_eq!(preprod.env.region, "us-east-2");
    assert_eq!(prod.env.region, "us-west-2");
}

#[test]
fn test_override_moves_prod_only() {
    let spec = load_service_pipeline_with(&[("prod_region", "eu-west-1")]);

    assert_eq!(stage(&spec, "PreProd").env.region, "us-east-2");
    assert_eq!(stage(&spec, "Prod").env.region, "eu-west-1");
}

#[test]
fn test_override_account_changes_every_stage() {
    let spec = load_service_pipeline_with(&[("account", "444455556666")]);

    for s in &spec.stages {
        assert_eq!(s.env.account, "444455556666", "stage {}", s.name);
    }
}

#[test]
fn test_overrides_do_not_change_shape() {
    let original = load_service_pipeline();
    let moved = load_service_pipeline_with(&[
        ("account", "444455556666"),
        ("preprod_region", "eu-central-1"),
        ("prod_region", "ap-southeast-2"),
    ]);

    assert_eq!(pipeline_shape(&moved), pipeline_shape(&original));
}

#[test]
fn test_bad_override_is_rejected() {
    let overrides = vec![("account".to_string(), "not-an-account".to_string())];
    let err = PipelineConfig::from_yaml_with_overrides(SERVICE_PIPELINE_YAML, &overrides).unwrap_err();
    assert!(err.to_string().contains("not-an-account"));
}

#[test]
fn test_missing_variable_is_reported_by_name() {
    let yaml = SERVICE_PIPELINE_YAML.replace("  prod_region: \"us-west-2\"\n", "");
    let err = PipelineConfig::from_yaml(&yaml).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::UnresolvedVariable {
            name: "prod_region".to_string()
        })
    );
}
