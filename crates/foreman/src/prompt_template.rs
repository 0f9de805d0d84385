use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Error as TeraError, Tera};

/// Get the path to the prompts directory
fn prompts_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("src").join("prompts")
}

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    tera.render("inline_template", &context)
}

pub fn load_prompt_file<T: Serialize>(
    template_file: impl Into<PathBuf>,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_path = template_file.into();
    // a bare file name resolves against the bundled prompts directory
    let file_path = if !template_path.exists() {
        prompts_dir().join(template_path)
    } else {
        template_path
    };

    let template_content = fs::read_to_string(file_path)
        .map_err(|e| TeraError::chain("Failed to read template file", e))?;
    load_prompt(&template_content, context_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::Tool;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_load_prompt() {
        let template = "Task for {{ name }}: {{ task }}";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "foreman".to_string());
        context.insert("task".to_string(), "build a todo app".to_string());

        let result = load_prompt(template, &context).unwrap();
        assert_eq!(result, "Task for foreman: build a todo app");
    }

    #[test]
    fn test_load_prompt_missing_variable() {
        let template = "Task for {{ name }}: {{ task }}";
        let mut context = HashMap::new();
        context.insert("name".to_string(), "foreman".to_string());
        // 'task' is missing from context
        let result = load_prompt(template, &context);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_prompt_file_missing_file() {
        let context: HashMap<String, String> = HashMap::new();
        let result = load_prompt_file("non_existent_template.md", &context);
        assert!(result.is_err());
    }

    #[test]
    fn test_system_template_lists_tools() {
        let tools = vec![
            Tool::new("executeCommand", "Runs shell commands", json!({"type": "string"})),
            Tool::new("writeFile", "Writes files", json!({"type": "object"})),
        ];
        let mut context = HashMap::new();
        context.insert("tools".to_string(), tools);

        let rendered = load_prompt_file("system.md", &context).unwrap();
        assert!(rendered.contains("executeCommand: Runs shell commands"));
        assert!(rendered.contains("writeFile: Writes files"));
        assert!(rendered.contains("\"step\""));
    }
}
