//! Pipeline definition builder

use crate::core::spec::{PipelineSpec, StageSpec, SynthStep};
use crate::core::validate::{validate, ValidationError};
use tracing::debug;

/// Assembles a [`PipelineSpec`] from its parts
///
/// Stages are kept in the order they are added; that order is the
/// deployment order.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    cross_account_keys: bool,
    self_mutation: bool,
    synth: Option<SynthStep>,
    stages: Vec<StageSpec>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cross_account_keys: false,
            self_mutation: true,
            synth: None,
            stages: Vec::new(),
        }
    }

    /// Required when any stage deploys to another account
    pub fn cross_account_keys(mut self, enabled: bool) -> Self {
        self.cross_account_keys = enabled;
        self
    }

    pub fn self_mutation(mut self, enabled: bool) -> Self {
        self.self_mutation = enabled;
        self
    }

    pub fn synth(mut self, synth: SynthStep) -> Self {
        self.synth = Some(synth);
        self
    }

    /// Append a stage after every stage added so far
    pub fn add_stage(mut self, stage: StageSpec) -> Self {
        debug!("Adding stage {} targeting {}", stage.name, stage.env);
        self.stages.push(stage);
        self
    }

    /// Finish the definition, checking its structure
    pub fn build(self) -> Result<PipelineSpec, ValidationError> {
        let synth = self
            .synth
            .ok_or_else(|| ValidationError::MissingSynth(self.name.clone()))?;

        let spec = PipelineSpec {
            name: self.name,
            cross_account_keys: self.cross_account_keys,
            self_mutation: self.self_mutation,
            synth,
            stages: self.stages,
        };

        validate(&spec)?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gate::ManualApproval;
    use crate::core::spec::{Environment, SourceRepo, StackSpec};

    fn stage(name: &str, region: &str) -> StageSpec {
        StageSpec::new(name, Environment::new("123456789012", region))
            .with_stack(StackSpec::new("Web"))
    }

    #[test]
    fn test_build_keeps_stage_order() {
        let spec = PipelineBuilder::new("Svc")
            .synth(SynthStep::new(SourceRepo::github("acme/svc", "main"), ["make"]))
            .add_stage(stage("Gamma", "eu-west-1"))
            .add_stage(stage("Alpha", "us-east-1"))
            .add_stage(stage("Beta", "us-west-2"))
            .build()
            .unwrap();

        assert_eq!(spec.stage_names(), vec!["Gamma", "Alpha", "Beta"]);
        assert!(spec.self_mutation);
        assert!(!spec.cross_account_keys);
    }

    #[test]
    fn test_build_without_synth_fails() {
        let result = PipelineBuilder::new("Svc")
            .add_stage(stage("Beta", "us-east-1"))
            .build();
        assert_eq!(result, Err(ValidationError::MissingSynth("Svc".to_string())));
    }

    #[test]
    fn test_build_validates() {
        let result = PipelineBuilder::new("Svc")
            .synth(SynthStep::new(SourceRepo::github("acme/svc", "main"), ["make"]))
            .add_stage(stage("Prod", "us-east-1").stack_gate("Api", ManualApproval::new("Go")))
            .build();
        assert!(matches!(result, Err(ValidationError::UnknownGateStack { .. })));
    }

    #[test]
    fn test_flags() {
        let spec = PipelineBuilder::new("Svc")
            .cross_account_keys(true)
            .self_mutation(false)
            .synth(SynthStep::new(SourceRepo::github("acme/svc", "main"), ["make"]))
            .add_stage(stage("Beta", "us-east-1"))
            .build()
            .unwrap();
        assert!(spec.cross_account_keys);
        assert!(!spec.self_mutation);
    }
}
