//! Test: Multi-stack stages - dependency waves and change-set gates

use crate::helpers::*;
use deploy_pipeline::core::config::PipelineConfig;
use deploy_pipeline::synth::synthesize;

const PLATFORM_PIPELINE: &str = r#"
name: "PlatformPipeline"
self_mutation: false
synth:
  source:
    repo: "acme/platform"
    branch: "main"
    authentication: "acme-token"
  install_commands: ["npm install -g aws-cdk"]
  commands: ["npm ci", "npx cdk synth"]
  primary_output_directory: "infra/cdk.out"
stages:
  - name: "Staging"
    env:
      account: "111111111111"
      region: "eu-west-1"
    stacks:
      - id: "Network"
        outputs: ["VpcId"]
      - id: "Database"
        outputs: ["Endpoint"]
        depends_on: ["Network"]
      - id: "Api"
        outputs: ["Url"]
        depends_on: ["Network", "Database"]
      - id: "Dashboards"
        depends_on: ["Network"]
    pre:
      - type: confirm-permissions-broadening
        name: "Check"
        stage: "Staging"
    stack_gates:
      Database:
        - type: manual-approval
          name: "ApproveSchema"
          comment: "Apply the schema migration?"
    post:
      - type: shell
        name: "Integration"
        commands: ["./run-tests.sh ${API_URL} ${DB_ENDPOINT}"]
        env_from_outputs:
          API_URL: "Staging/Api/Url"
          DB_ENDPOINT: "Staging/Database/Endpoint"
  - name: "Production"
    env:
      account: "222222222222"
      region: "eu-west-1"
    stacks:
      - id: "Api"
        outputs: ["Url"]
    pre:
      - type: shell
        name: "StagingStillHealthy"
        commands: ["curl -Ssf $STAGING_URL/health"]
        env_from_outputs:
          STAGING_URL: "Staging/Api/Url"
"#;

#[test]
fn test_waves_and_gates_in_run_order() {
    let spec = PipelineConfig::from_yaml(PLATFORM_PIPELINE).unwrap().into_spec();
    let manifest = synthesize(&spec).unwrap();

    let staging = manifest_stage(&manifest, "Staging");
    assert_run_orders(
        staging,
        &[
            ("Check", 1),
            ("Network.Prepare", 2),
            ("Network.Deploy", 3),
            ("Database.Prepare", 4),
            ("Dashboards.Prepare", 4),
            ("ApproveSchema", 5),
            ("Database.Deploy", 6),
            ("Dashboards.Deploy", 6),
            ("Api.Prepare", 7),
            ("Api.Deploy", 8),
            ("Integration", 9),
        ],
    );
}

#[test]
fn test_earlier_stage_output_feeds_later_pre_check() {
    let spec = PipelineConfig::from_yaml(PLATFORM_PIPELINE).unwrap().into_spec();
    let manifest = synthesize(&spec).unwrap();

    let production = manifest_stage(&manifest, "Production");
    assert_run_orders(
        production,
        &[("StagingStillHealthy", 1), ("Api.Prepare", 2), ("Api.Deploy", 3)],
    );
}

#[test]
fn test_synth_options_carried_into_manifest() {
    let spec = PipelineConfig::from_yaml(PLATFORM_PIPELINE).unwrap().into_spec();
    let manifest = synthesize(&spec).unwrap();

    let names: Vec<_> = manifest.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Source", "Build", "Staging", "Production"]);

    let json = serde_json::to_value(&manifest).unwrap();
    let source = &json["stages"][0]["actions"][0];
    assert_eq!(source["action"], "source");
    assert_eq!(source["authentication"], "acme-token");

    let build = &json["stages"][1]["actions"][0];
    assert_eq!(build["install_commands"][0], "npm install -g aws-cdk");
    assert_eq!(build["output_directory"], "infra/cdk.out");
}

#[test]
fn test_reading_own_output_before_deploy_is_rejected() {
    let yaml = PLATFORM_PIPELINE.replace("STAGING_URL: \"Staging/Api/Url\"", "STAGING_URL: \"Production/Api/Url\"");
    let err = PipelineConfig::from_yaml(&yaml).unwrap_err();
    assert!(err.to_string().contains("before it is deployed"), "{}", err);
}
