//! Pipeline definition data model

use crate::core::gate::GateAction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default name of the secret holding the source provider token
pub const DEFAULT_SOURCE_SECRET: &str = "github-token";

/// Default directory the synth step publishes its output from
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "cdk.out";

/// Top-level pipeline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Pipeline name
    pub name: String,

    /// Encrypt artifacts with a key that other accounts can use
    #[serde(default)]
    pub cross_account_keys: bool,

    /// Whether the pipeline updates its own definition before deploying
    #[serde(default = "default_self_mutation")]
    pub self_mutation: bool,

    /// How the application is fetched, built and synthesized
    pub synth: SynthStep,

    /// Deployment stages, in deployment order
    #[serde(default)]
    pub stages: Vec<StageSpec>,
}

fn default_self_mutation() -> bool {
    true
}

impl PipelineSpec {
    /// Get a stage by name
    pub fn stage(&self, name: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Position of a stage in deployment order
    pub fn stage_index(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name == name)
    }

    /// Stage names in deployment order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Source repository coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRepo {
    /// Repository in `owner/repo` form
    pub repo: String,

    /// Branch to track
    pub branch: String,

    /// Name of the secret holding the access token
    #[serde(default = "default_source_secret")]
    pub authentication: String,
}

fn default_source_secret() -> String {
    DEFAULT_SOURCE_SECRET.to_string()
}

impl SourceRepo {
    pub fn github(repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            branch: branch.into(),
            authentication: default_source_secret(),
        }
    }

    pub fn with_authentication(mut self, secret: impl Into<String>) -> Self {
        self.authentication = secret.into();
        self
    }

    /// Repository owner, if the coordinates are well formed
    pub fn owner(&self) -> Option<&str> {
        self.split().map(|(owner, _)| owner)
    }

    /// Repository name, if the coordinates are well formed
    pub fn repo_name(&self) -> Option<&str> {
        self.split().map(|(_, name)| name)
    }

    fn split(&self) -> Option<(&str, &str)> {
        let (owner, name) = self.repo.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((owner, name))
    }
}

/// The build/synthesis step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthStep {
    /// Where the source can be found
    pub source: SourceRepo,

    /// Commands run before the build commands
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install_commands: Vec<String>,

    /// Build commands, executed in order; the first failure aborts synthesis
    pub commands: Vec<String>,

    /// Directory holding the synthesized output
    #[serde(default = "default_output_directory")]
    pub primary_output_directory: String,
}

fn default_output_directory() -> String {
    DEFAULT_OUTPUT_DIRECTORY.to_string()
}

impl SynthStep {
    pub fn new<I, S>(source: SourceRepo, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source,
            install_commands: Vec::new(),
            commands: commands.into_iter().map(Into::into).collect(),
            primary_output_directory: default_output_directory(),
        }
    }

    pub fn with_install_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.install_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_directory(mut self, dir: impl Into<String>) -> Self {
        self.primary_output_directory = dir.into();
        self
    }
}

/// Deployment target of a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub account: String,
    pub region: String,
}

impl Environment {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.account, self.region)
    }
}

/// A stack deployed by a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSpec {
    /// Stack identifier, unique within the stage
    pub id: String,

    /// Names of the outputs this stack exports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,

    /// Stacks in the same stage that must be deployed first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl StackSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            outputs: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.outputs.push(output.into());
        self
    }

    pub fn depends_on(mut self, stack: impl Into<String>) -> Self {
        self.depends_on.push(stack.into());
        self
    }

    pub fn has_output(&self, output: &str) -> bool {
        self.outputs.iter().any(|o| o == output)
    }

    /// Name of the action that creates this stack's change set
    pub fn prepare_action_name(&self) -> String {
        format!("{}.Prepare", self.id)
    }

    /// Name of the action that executes this stack's change set
    pub fn deploy_action_name(&self) -> String {
        format!("{}.Deploy", self.id)
    }
}

/// A named deployment target with its gates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Stage name, unique within the pipeline
    pub name: String,

    /// Target account and region
    pub env: Environment,

    /// Stacks deployed by this stage
    #[serde(default)]
    pub stacks: Vec<StackSpec>,

    /// Gates run before any stack is deployed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre: Vec<GateAction>,

    /// Gates run after every stack is deployed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<GateAction>,

    /// Gates run between preparing and executing a stack's change set
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stack_gates: BTreeMap<String, Vec<GateAction>>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, env: Environment) -> Self {
        Self {
            name: name.into(),
            env,
            stacks: Vec::new(),
            pre: Vec::new(),
            post: Vec::new(),
            stack_gates: BTreeMap::new(),
        }
    }

    pub fn with_stack(mut self, stack: StackSpec) -> Self {
        self.stacks.push(stack);
        self
    }

    pub fn pre(mut self, gate: impl Into<GateAction>) -> Self {
        self.pre.push(gate.into());
        self
    }

    pub fn post(mut self, gate: impl Into<GateAction>) -> Self {
        self.post.push(gate.into());
        self
    }

    /// Add a gate to the change set of `stack`
    pub fn stack_gate(mut self, stack: impl Into<String>, gate: impl Into<GateAction>) -> Self {
        self.stack_gates.entry(stack.into()).or_default().push(gate.into());
        self
    }

    /// Get a stack by id
    pub fn stack(&self, id: &str) -> Option<&StackSpec> {
        self.stacks.iter().find(|s| s.id == id)
    }

    /// Change-set gates for a stack (empty if none)
    pub fn gates_for_stack(&self, id: &str) -> &[GateAction] {
        self.stack_gates.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every gate of the stage, in the order the engine would reach them
    pub fn all_gates(&self) -> impl Iterator<Item = &GateAction> {
        let stack_gates = self
            .stacks
            .iter()
            .flat_map(move |stack| self.gates_for_stack(&stack.id).iter());
        self.pre.iter().chain(stack_gates).chain(self.post.iter())
    }
}
