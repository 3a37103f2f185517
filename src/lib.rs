//! deploy-pipeline - declarative deployment pipelines with gated stages

pub mod assembly;
pub mod cli;
pub mod core;
pub mod demo;
pub mod synth;

// Re-export commonly used types
pub use crate::assembly::{AssemblyStore, DirectoryAssemblyStore, InMemoryAssemblyStore};
pub use crate::core::{GateAction, PipelineBuilder, PipelineSpec, StageSpec, ValidationError};
pub use crate::synth::{synthesize, OutputFormat, PipelineManifest};
