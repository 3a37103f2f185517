//! Pipeline definitions from YAML
//!
//! A definition file is a [`PipelineSpec`] with an optional `variables`
//! mapping. Any string in the document may use `{{ name }}` placeholders,
//! which is how account ids and regions are kept out of the definition
//! itself.

use crate::core::spec::PipelineSpec;
use crate::core::validate::validate;
use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Problems with a definition document before it becomes a spec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Pipeline definition must be a YAML mapping")]
    NotAMapping,

    #[error("'variables' must be a mapping of names to scalar values")]
    InvalidVariables,

    #[error("Variable '{name}' has a non-scalar value")]
    NonScalarVariable { name: String },

    #[error("Unresolved variable '{name}' (define it under 'variables' or pass --variable {name}=...)")]
    UnresolvedVariable { name: String },
}

/// A loaded, rendered and validated pipeline definition
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Variables after overrides were applied
    pub variables: BTreeMap<String, String>,

    /// The rendered definition
    pub spec: PipelineSpec,
}

impl PipelineConfig {
    /// Load a pipeline definition from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P, overrides: &[(String, String)]) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_with_overrides(&content, overrides)
            .with_context(|| format!("Invalid pipeline definition {}", path.display()))
    }

    /// Parse a pipeline definition from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_yaml_with_overrides(yaml, &[])
    }

    /// Parse a pipeline definition, letting `overrides` replace file variables
    pub fn from_yaml_with_overrides(yaml: &str, overrides: &[(String, String)]) -> Result<Self> {
        let document: Value = serde_yaml::from_str(yaml).context("Malformed YAML")?;
        let Value::Mapping(mut document) = document else {
            return Err(ConfigError::NotAMapping.into());
        };

        let mut variables = match document.remove("variables") {
            Some(value) => parse_variables(&value)?,
            None => BTreeMap::new(),
        };
        for (key, value) in overrides {
            debug!("Variable override: {} = {}", key, value);
            variables.insert(key.clone(), value.clone());
        }

        let rendered = render_value(Value::Mapping(document), &variables)?;
        let spec: PipelineSpec =
            serde_yaml::from_value(rendered).context("Pipeline definition does not match the expected shape")?;

        let config = PipelineConfig { variables, spec };
        config.validate()?;
        Ok(config)
    }

    /// Validate the rendered definition
    pub fn validate(&self) -> Result<()> {
        validate(&self.spec)?;
        Ok(())
    }

    /// Take the rendered definition
    pub fn into_spec(self) -> PipelineSpec {
        self.spec
    }
}

fn parse_variables(value: &Value) -> Result<BTreeMap<String, String>, ConfigError> {
    let Value::Mapping(map) = value else {
        return Err(ConfigError::InvalidVariables);
    };

    let mut vars = BTreeMap::new();
    for (key, value) in map {
        let Some(name) = key.as_str() else {
            return Err(ConfigError::InvalidVariables);
        };
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(ConfigError::NonScalarVariable {
                    name: name.to_string(),
                })
            }
        };
        vars.insert(name.to_string(), rendered);
    }

    Ok(vars)
}

/// Substitute placeholders in every string (keys included) of a YAML tree
fn render_value(value: Value, variables: &BTreeMap<String, String>) -> Result<Value, ConfigError> {
    Ok(match value {
        Value::String(s) => Value::String(render_str(&s, variables)?),
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|v| render_value(v, variables))
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(map) => {
            let mut rendered = Mapping::new();
            for (k, v) in map {
                rendered.insert(render_value(k, variables)?, render_value(v, variables)?);
            }
            Value::Mapping(rendered)
        }
        Value::Tagged(mut tagged) => {
            tagged.value = render_value(tagged.value, variables)?;
            Value::Tagged(tagged)
        }
        other => other,
    })
}

/// Replace `{{ name }}` placeholders in a single string
pub fn render_str(template: &str, variables: &BTreeMap<String, String>) -> Result<String, ConfigError> {
    let mut missing = None;
    let rendered = placeholder_regex().replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        match variables.get(name) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                caps[0].to_string()
            }
        }
    });

    match missing {
        Some(name) => Err(ConfigError::UnresolvedVariable { name }),
        None => Ok(rendered.into_owned()),
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.-]*)\s*\}\}").expect("placeholder pattern is valid")
    })
}
