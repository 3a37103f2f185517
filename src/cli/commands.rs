//! CLI command definitions

use crate::assembly::DEFAULT_ASSEMBLY_DIR;
use crate::synth::OutputFormat;
use clap::Args;

/// Write the service pipeline definition as a starting point
#[derive(Debug, Args, Clone)]
pub struct InitCommand {
    /// Where to write the definition
    #[arg(short, long, default_value = "pipeline.yaml")]
    pub output: String,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Validate a pipeline definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = "pipeline.yaml")]
    pub file: String,

    /// Variable overrides (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub variable: Vec<(String, String)>,

    /// Output the rendered definition in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the stages and actions a definition synthesizes to
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = "pipeline.yaml")]
    pub file: String,

    /// Variable overrides (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub variable: Vec<(String, String)>,
}

/// Synthesize a definition into a manifest
#[derive(Debug, Args, Clone)]
pub struct SynthCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = "pipeline.yaml")]
    pub file: String,

    /// Variable overrides (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub variable: Vec<(String, String)>,

    /// Assembly output directory
    #[arg(short, long, default_value = DEFAULT_ASSEMBLY_DIR)]
    pub out: String,

    /// Format used when printing the manifest
    #[arg(long, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Print the manifest to stdout
    #[arg(long)]
    pub print: bool,

    /// Don't write the manifest to the output directory
    #[arg(long)]
    pub no_save: bool,
}

/// List synthesized manifests
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Assembly output directory
    #[arg(short, long, default_value = DEFAULT_ASSEMBLY_DIR)]
    pub out: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show a synthesized manifest
#[derive(Debug, Args, Clone)]
pub struct ShowCommand {
    /// Pipeline name
    pub name: String,

    /// Assembly output directory
    #[arg(short, long, default_value = DEFAULT_ASSEMBLY_DIR)]
    pub out: String,

    /// Print the raw manifest instead of the plan view
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

/// Manifest format argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatArg {
    Json,
    Yaml,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("region=us-east-1"),
            Ok(("region".to_string(), "us-east-1".to_string()))
        );
        assert_eq!(
            parse_key_value("cmd=a=b"),
            Ok(("cmd".to_string(), "a=b".to_string()))
        );
        assert_eq!(parse_key_value("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
