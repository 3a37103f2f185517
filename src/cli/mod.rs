//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{InitCommand, ListCommand, PlanCommand, ShowCommand, SynthCommand, ValidateCommand};
use std::ffi::OsString;

/// Declarative deployment pipeline tool
#[derive(Debug, Parser, Clone)]
#[command(name = "deploy-pipeline")]
#[command(author = "Pipeline Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Define, validate and synthesize gated deployment pipelines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Write the service pipeline definition
    Init(InitCommand),

    /// Validate a pipeline definition
    Validate(ValidateCommand),

    /// Show the synthesized stages and actions
    Plan(PlanCommand),

    /// Synthesize a pipeline manifest
    Synth(SynthCommand),

    /// List synthesized manifests
    List(ListCommand),

    /// Show a synthesized manifest
    Show(ShowCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
