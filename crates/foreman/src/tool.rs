use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumIter};

/// A tool that can be requested by the model through an action step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name the model uses to request the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// The shape of the input the tool accepts
    pub parameters: Value,
}

impl Tool {
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// The closed set of capabilities the agent can execute.
///
/// Several registered names may map to the same kind (the weather demo tool
/// is reachable under two names), but every name resolves to one of these
/// variants or the dispatch fails before any side effect happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ToolKind {
    ExecuteCommand,
    WriteFile,
    Weather,
}
