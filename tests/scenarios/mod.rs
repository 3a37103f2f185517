//! Scenario-based tests for deploy-pipeline

mod assembly_store;
mod multi_stack;
mod synthesis;
mod variable_overrides;
