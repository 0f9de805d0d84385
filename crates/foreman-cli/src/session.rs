use anyhow::Result;
use cliclack::spinner;
use console::style;
use foreman::agent::{Agent, AgentEvent};
use futures::StreamExt;

/// Consume an agent run, rendering one line per step.
///
/// Terminal protocol errors are printed and end the run cleanly; they are
/// not bubbled up as process failures.
pub async fn run_to_completion(agent: &Agent, task: &str) -> Result<()> {
    println!("{} {}", style("task:").bold(), task);

    let mut stream = agent.run(task).await?;
    let spin = spinner();
    spin.start("awaiting next step");

    while let Some(event) = stream.next().await {
        spin.stop("");
        match event {
            Ok(AgentEvent::Thought { content }) => {
                println!("{} {}", style("think").cyan().bold(), style(content).dim());
            }
            Ok(AgentEvent::ToolRun {
                tool,
                input,
                outcome,
            }) => {
                println!(
                    "{} {}({})",
                    style("action").yellow().bold(),
                    style(tool).bold(),
                    compact(&input)
                );
                match outcome {
                    Ok(result) => println!(
                        "{} {}",
                        style("observe").green().bold(),
                        style(result.trim_end()).dim()
                    ),
                    Err(error) => println!(
                        "{} {}",
                        style("observe").red().bold(),
                        style(error.to_string()).red()
                    ),
                }
            }
            Ok(AgentEvent::Observation { content }) => {
                println!(
                    "{} {}",
                    style("observe").green().bold(),
                    style(content).dim()
                );
            }
            Ok(AgentEvent::Final { content }) => {
                render_markdown(&content);
                return Ok(());
            }
            Err(error) => {
                eprintln!("{} {}", style("error:").red().bold(), error);
                return Ok(());
            }
        }
        spin.start("awaiting next step");
    }

    Ok(())
}

fn compact(input: &serde_json::Value) -> String {
    let rendered = input.to_string();
    if rendered.chars().count() > 80 {
        let prefix: String = rendered.chars().take(80).collect();
        format!("{}…", prefix)
    } else {
        rendered
    }
}

fn render_markdown(content: &str) {
    bat::PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()
        .unwrap();
    println!();
}

#[cfg(test)]
mod tests {
    use super::compact;
    use serde_json::json;

    #[test]
    fn test_compact_keeps_short_inputs() {
        assert_eq!(compact(&json!("ls -la")), "\"ls -la\"");
    }

    #[test]
    fn test_compact_truncates_long_inputs() {
        let long = "x".repeat(200);
        let rendered = compact(&json!({ "content": long }));
        assert_eq!(rendered.chars().count(), 81);
        assert!(rendered.ends_with('…'));
    }
}
