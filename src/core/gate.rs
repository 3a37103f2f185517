//! Gate actions - checks and approvals that hold back pipeline progression

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// A condition that must pass before the pipeline moves on
///
/// Tagged by `type` in serialized form, so new kinds of gate can be added
/// without touching stage handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GateAction {
    /// Confirm that a deployment does not broaden IAM permissions unreviewed
    #[serde(rename = "confirm-permissions-broadening")]
    PermissionBroadeningCheck(PermissionBroadeningCheck),

    /// Run shell commands; a non-zero exit fails the gate
    #[serde(rename = "shell")]
    ShellCommandCheck(ShellCheck),

    /// Wait for a human to approve
    #[serde(rename = "manual-approval")]
    ManualApproval(ManualApproval),
}

impl GateAction {
    /// Gate name, unique within its stage
    pub fn name(&self) -> &str {
        match self {
            GateAction::PermissionBroadeningCheck(g) => &g.name,
            GateAction::ShellCommandCheck(g) => &g.name,
            GateAction::ManualApproval(g) => &g.name,
        }
    }

    /// Short label for the gate kind
    pub fn kind(&self) -> &'static str {
        match self {
            GateAction::PermissionBroadeningCheck(_) => "confirm-permissions-broadening",
            GateAction::ShellCommandCheck(_) => "shell",
            GateAction::ManualApproval(_) => "manual-approval",
        }
    }

    pub fn as_shell(&self) -> Option<&ShellCheck> {
        match self {
            GateAction::ShellCommandCheck(shell) => Some(shell),
            _ => None,
        }
    }

    pub fn as_manual_approval(&self) -> Option<&ManualApproval> {
        match self {
            GateAction::ManualApproval(approval) => Some(approval),
            _ => None,
        }
    }

    pub fn is_permission_check(&self) -> bool {
        matches!(self, GateAction::PermissionBroadeningCheck(_))
    }
}

/// Permission-broadening confirmation for a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionBroadeningCheck {
    pub name: String,

    /// Stage whose stacks are checked
    pub stage: String,
}

impl PermissionBroadeningCheck {
    pub fn new(name: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: stage.into(),
        }
    }
}

impl From<PermissionBroadeningCheck> for GateAction {
    fn from(check: PermissionBroadeningCheck) -> Self {
        GateAction::PermissionBroadeningCheck(check)
    }
}

/// Shell-command check with environment injected from stack outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellCheck {
    pub name: String,

    /// Commands, executed in order
    pub commands: Vec<String>,

    /// Environment variable name -> stack output it is bound to
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_from_outputs: BTreeMap<String, OutputRef>,
}

impl ShellCheck {
    pub fn new<I, S>(name: impl Into<String>, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            commands: commands.into_iter().map(Into::into).collect(),
            env_from_outputs: BTreeMap::new(),
        }
    }

    /// Expose a stack output to the commands as `$var`
    pub fn with_env_from_output(mut self, var: impl Into<String>, output: OutputRef) -> Self {
        self.env_from_outputs.insert(var.into(), output);
        self
    }

    /// Every `$NAME` / `${NAME}` referenced by the commands
    pub fn command_variables(&self) -> BTreeSet<String> {
        let re = env_reference_regex();
        self.commands
            .iter()
            .flat_map(|cmd| re.captures_iter(cmd))
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Injected variables that the commands actually use
    pub fn referenced_injections(&self) -> BTreeSet<String> {
        let used = self.command_variables();
        self.env_from_outputs
            .keys()
            .filter(|k| used.contains(*k))
            .cloned()
            .collect()
    }

    /// Injected variables that no command uses
    pub fn unreferenced_injections(&self) -> Vec<&str> {
        let used = self.command_variables();
        self.env_from_outputs
            .keys()
            .filter(|k| !used.contains(*k))
            .map(String::as_str)
            .collect()
    }
}

fn env_reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("env reference pattern is valid")
    })
}

impl From<ShellCheck> for GateAction {
    fn from(check: ShellCheck) -> Self {
        GateAction::ShellCommandCheck(check)
    }
}

/// Manual approval with an optional prompt for the approver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualApproval {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ManualApproval {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

impl From<ManualApproval> for GateAction {
    fn from(approval: ManualApproval) -> Self {
        GateAction::ManualApproval(approval)
    }
}

/// Error parsing an output reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid output reference '{0}', expected 'Stage/Stack/Output'")]
pub struct OutputRefParseError(pub String);

/// Reference to a named output of a stack in a stage
///
/// Written as `Stage/Stack/Output`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OutputRef {
    pub stage: String,
    pub stack: String,
    pub output: String,
}

impl OutputRef {
    pub fn new(
        stage: impl Into<String>,
        stack: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            stack: stack.into(),
            output: output.into(),
        }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.stage, self.stack, self.output)
    }
}

impl FromStr for OutputRef {
    type Err = OutputRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [stage, stack, output]
                if !stage.is_empty() && !stack.is_empty() && !output.is_empty() =>
            {
                Ok(OutputRef::new(*stage, *stack, *output))
            }
            _ => Err(OutputRefParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputRef {
    type Error = OutputRefParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputRef> for String {
    fn from(value: OutputRef) -> Self {
        value.to_string()
    }
}
