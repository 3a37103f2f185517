//! Core domain models for pipeline definitions
//!
//! This module defines the data structures that describe a deployment
//! pipeline, how they are assembled, loaded from YAML and validated.

pub mod builder;
pub mod config;
pub mod gate;
pub mod spec;
pub mod validate;

pub use builder::PipelineBuilder;
pub use gate::*;
pub use spec::*;
pub use validate::{validate, ValidationError};
