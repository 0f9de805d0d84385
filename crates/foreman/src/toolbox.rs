use std::collections::HashMap;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::errors::{AgentError, AgentResult};
use crate::tool::{Tool, ToolKind};

lazy_static! {
    static ref QUOTED_TARGET: Regex = Regex::new(r#"["']([^"']+)["']\s*$"#).unwrap();
}

/// The name -> capability table. Adding a tool means adding a row here and a
/// match arm in [`Toolbox::dispatch`]; nothing is looked up dynamically.
const REGISTRY: [(&str, ToolKind); 4] = [
    ("executeCommand", ToolKind::ExecuteCommand),
    ("writeFile", ToolKind::WriteFile),
    ("getWeatherInfo", ToolKind::Weather),
    ("weather_tool", ToolKind::Weather),
];

/// The local capabilities the model can request through action steps.
pub struct Toolbox {
    tools: Vec<Tool>,
    index: HashMap<&'static str, ToolKind>,
}

impl Default for Toolbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolbox {
    pub fn new() -> Self {
        let tools = vec![
            Tool::new(
                "executeCommand",
                "Execute a shell command and return its output.",
                json!({
                    "type": "string",
                    "description": "The shell command to execute"
                }),
            ),
            Tool::new(
                "writeFile",
                "Create or overwrite a file, creating parent directories as needed.",
                json!({
                    "type": "object",
                    "required": ["path", "content"],
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Target file path"
                        },
                        "content": {
                            "type": "string",
                            "description": "Text content to write"
                        }
                    }
                }),
            ),
            Tool::new(
                "getWeatherInfo",
                "Look up the current weather for a city.",
                json!({
                    "type": "string",
                    "description": "The city to look up"
                }),
            ),
        ];

        Self {
            tools,
            index: REGISTRY.into_iter().collect(),
        }
    }

    /// Tool descriptors for prompt rendering
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Resolve a requested name to a capability, if registered
    pub fn lookup(&self, name: &str) -> Option<ToolKind> {
        self.index.get(name).copied()
    }

    /// Execute a requested tool with the input exactly as the model sent it.
    pub async fn dispatch(&self, name: &str, input: Value) -> AgentResult<String> {
        match self.lookup(name) {
            Some(ToolKind::ExecuteCommand) => self.execute_command(input).await,
            Some(ToolKind::WriteFile) => self.write_file(input).await,
            Some(ToolKind::Weather) => self.weather(input),
            None => Err(AgentError::ToolNotFound(name.to_string())),
        }
    }

    async fn execute_command(&self, input: Value) -> AgentResult<String> {
        let command = input.as_str().ok_or_else(|| {
            AgentError::InvalidParameters("executeCommand expects a shell command string".into())
        })?;

        // Models re-issue mkdir for folders they already created; answer from
        // the filesystem instead of letting mkdir fail the run.
        if let Some(folder) = mkdir_target(command) {
            if Path::new(&folder).exists() {
                return Ok(format!("Folder \"{}\" already exists.", folder));
            }
        }

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| AgentError::ExecutionError(e.to_string()))?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if stdout.trim().is_empty() {
                Ok("Command executed successfully".to_string())
            } else {
                Ok(stdout.into_owned())
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.trim().is_empty() {
                Err(AgentError::ExecutionError(format!(
                    "command exited with {}",
                    output.status
                )))
            } else {
                Err(AgentError::ExecutionError(stderr.into_owned()))
            }
        }
    }

    async fn write_file(&self, input: Value) -> AgentResult<String> {
        let path = input
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::InvalidParameters("Missing 'path' parameter".into()))?;
        let content = input
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::InvalidParameters("Missing 'content' parameter".into()))?;

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AgentError::ExecutionError(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        std::fs::write(path, content)
            .map_err(|e| AgentError::ExecutionError(format!("Failed to write file: {}", e)))?;

        Ok(format!("File {} written successfully", path))
    }

    fn weather(&self, input: Value) -> AgentResult<String> {
        let city = input.as_str().ok_or_else(|| {
            AgentError::InvalidParameters("weather lookup expects a city name string".into())
        })?;
        Ok(format!("{} weather is 42°C.", city))
    }
}

/// Extract the folder a mkdir command targets: the trailing quoted name, or
/// the last whitespace-separated token (which skips flags like -p).
fn mkdir_target(command: &str) -> Option<String> {
    let rest = command.trim_start().strip_prefix("mkdir")?.trim();
    if rest.is_empty() {
        return None;
    }
    if let Some(caps) = QUOTED_TARGET.captures(rest) {
        return Some(caps[1].to_string());
    }
    rest.split_whitespace().last().map(str::to_string)
}
