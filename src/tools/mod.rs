//! Agent tools
//!
//! Tools are auxiliary capabilities the generation orchestrator may invoke
//! once, before calling the model; their output is concatenated into the
//! prompt context. Each tool declares a name, a description and a JSON
//! input schema, and is invoked with a JSON argument string.

pub mod research;
pub mod retrieval;

use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use research::CompanyResearch;
pub use retrieval::DocumentRetrieval;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the argument object passed to `invoke`
    fn input_schema(&self) -> Value;

    /// Run the tool with a JSON argument string, returning prompt context
    async fn invoke(&self, input: &str) -> Result<String>;
}

/// An ordered set of tools, looked up by name
pub struct ToolSet(pub Vec<Box<dyn Tool>>);

impl ToolSet {
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.0.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }
}
