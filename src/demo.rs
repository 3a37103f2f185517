//! The service pipeline: one web service, tested in pre-production and
//! promoted to production by hand.

use crate::core::{
    Environment, ManualApproval, OutputRef, PermissionBroadeningCheck, PipelineBuilder,
    PipelineSpec, ShellCheck, SourceRepo, StackSpec, StageSpec, SynthStep, ValidationError,
};

/// Definition file written by `deploy-pipeline init`
pub const SERVICE_PIPELINE_YAML: &str = include_str!("../pipelines/my-service.yaml");

pub const PIPELINE_NAME: &str = "MyServicePipeline";
pub const ACCOUNT: &str = "968520978119";
pub const PREPROD_REGION: &str = "us-east-2";
pub const PROD_REGION: &str = "us-west-2";

/// Stack deployed by both stages
pub const SERVICE_STACK: &str = "WebService";
pub const URL_OUTPUT: &str = "Url";

/// Build the service pipeline
pub fn service_pipeline() -> Result<PipelineSpec, ValidationError> {
    service_pipeline_from(SourceRepo::github("brianjbeach/cdkpipelines-demo", "master"))
}

/// Build the service pipeline against another source
pub fn service_pipeline_from(source: SourceRepo) -> Result<PipelineSpec, ValidationError> {
    PipelineBuilder::new(PIPELINE_NAME)
        .cross_account_keys(true)
        .synth(SynthStep::new(
            source,
            ["npm ci", "npm run build", "npx cdk synth"],
        ))
        .add_stage(preprod_stage())
        .add_stage(prod_stage())
        .build()
}

fn service_stack() -> StackSpec {
    StackSpec::new(SERVICE_STACK).with_output(URL_OUTPUT)
}

fn preprod_stage() -> StageSpec {
    let name = "PreProd";
    StageSpec::new(name, Environment::new(ACCOUNT, PREPROD_REGION))
        .with_stack(service_stack())
        .pre(PermissionBroadeningCheck::new("Broadening Permission Check", name))
        .post(
            ShellCheck::new("TestService", ["curl -Ssf $ENDPOINT_URL"]).with_env_from_output(
                "ENDPOINT_URL",
                OutputRef::new(name, SERVICE_STACK, URL_OUTPUT),
            ),
        )
}

fn prod_stage() -> StageSpec {
    StageSpec::new("Prod", Environment::new(ACCOUNT, PROD_REGION))
        .with_stack(service_stack())
        .stack_gate(
            SERVICE_STACK,
            ManualApproval::new("PromoteToProd")
                .with_comment("Do you want to promote this build to production?"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PipelineConfig;

    #[test]
    fn test_service_pipeline_builds() {
        let spec = service_pipeline().unwrap();
        assert_eq!(spec.name, PIPELINE_NAME);
        assert!(spec.cross_account_keys);
        assert_eq!(spec.synth.commands.len(), 3);
    }

    #[test]
    fn test_yaml_matches_builder() {
        let from_yaml = PipelineConfig::from_yaml(SERVICE_PIPELINE_YAML)
            .unwrap()
            .into_spec();
        assert_eq!(from_yaml, service_pipeline().unwrap());
    }
}
