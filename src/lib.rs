//! AI Assign: confidence-gated task assignment.

pub mod assignments;
pub mod config;
pub mod error;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod reasoning;
pub mod store;
