use anyhow::{Context, Result};
use futures::stream::BoxStream;
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::{AgentError, AgentResult};
use crate::models::message::Transcript;
use crate::models::step::Step;
use crate::prompt_template::load_prompt_file;
use crate::providers::base::Provider;
use crate::toolbox::Toolbox;

/// The synthetic user message appended after every non-terminal step so the
/// model keeps advancing.
pub const CONTINUE_PROMPT: &str = "Continue next step";

/// Upper bound on loop iterations; the model normally finishes well before
/// this, but nothing in the protocol forces it to.
pub const DEFAULT_MAX_STEPS: usize = 25;

/// What the driver did with one model turn.
///
/// Tool outcomes carry the explicit success/error result so consumers can
/// branch on it instead of scraping observation text.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    Thought {
        content: String,
    },
    ToolRun {
        tool: String,
        input: Value,
        outcome: AgentResult<String>,
    },
    Observation {
        content: String,
    },
    Final {
        content: String,
    },
}

/// Drives the model through the step protocol and executes requested tools.
pub struct Agent {
    provider: Box<dyn Provider>,
    toolbox: Toolbox,
    max_steps: usize,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            provider,
            toolbox: Toolbox::new(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    fn system_prompt(&self) -> Result<String> {
        let mut context = HashMap::new();
        context.insert("tools", self.toolbox.tools().to_vec());
        load_prompt_file("system.md", &context).context("failed to render the system prompt")
    }

    /// Create a stream that yields one event per executed step.
    ///
    /// The stream ends after a `Final` event, or with an error on the
    /// terminal failures: malformed or unknown-step replies, a request for
    /// an unregistered tool, a transport failure, or the step limit. Tool
    /// execution failures are NOT terminal; they come back to the model as
    /// the next observation.
    pub async fn run(&self, task: &str) -> Result<BoxStream<'_, Result<AgentEvent>>> {
        let opening = format!("{}\nSTART: {}", self.system_prompt()?, task);

        Ok(Box::pin(async_stream::try_stream! {
            let mut transcript = Transcript::new();
            transcript.push_user(opening);

            let mut steps = 0;
            loop {
                if steps >= self.max_steps {
                    let bound: AgentResult<()> =
                        Err(AgentError::MaxStepsExceeded(self.max_steps));
                    bound?;
                }
                steps += 1;

                let (reply, _usage) = self.provider.complete(transcript.messages()).await?;
                let raw = reply.content;

                match Step::parse(&raw)? {
                    Step::Think { content } => {
                        yield AgentEvent::Thought { content };
                        transcript.push_model(raw.as_str());
                        transcript.push_user(CONTINUE_PROMPT);
                    }
                    Step::Action { tool, input, .. } => {
                        // an unregistered name is terminal, before any side effect
                        let _ = self
                            .toolbox
                            .lookup(&tool)
                            .ok_or_else(|| AgentError::ToolNotFound(tool.clone()))?;

                        let outcome = self.toolbox.dispatch(&tool, input.clone()).await;
                        let observation = match &outcome {
                            Ok(value) => format!("OBSERVE: {value}"),
                            Err(error) => format!("OBSERVE: The tool call failed: {error}"),
                        };

                        yield AgentEvent::ToolRun { tool, input, outcome };
                        transcript.push_user(observation);
                        transcript.push_user(CONTINUE_PROMPT);
                    }
                    Step::Observe { content } => {
                        yield AgentEvent::Observation { content };
                        transcript.push_model(raw.as_str());
                        transcript.push_user(CONTINUE_PROMPT);
                    }
                    Step::Output { content } => {
                        yield AgentEvent::Final { content };
                        break;
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;
    use crate::providers::base::Usage;
    use crate::providers::mock::MockProvider;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::{Arc, Mutex};

    fn model_json(value: serde_json::Value) -> Message {
        Message::model(value.to_string())
    }

    async fn collect(agent: &Agent, task: &str) -> Vec<Result<AgentEvent>> {
        let mut stream = agent.run(task).await.unwrap();
        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event);
        }
        events
    }

    fn terminal_error(events: &[Result<AgentEvent>]) -> &AgentError {
        events
            .last()
            .unwrap()
            .as_ref()
            .unwrap_err()
            .downcast_ref::<AgentError>()
            .expect("terminal error should be an AgentError")
    }

    #[tokio::test]
    async fn test_direct_output() {
        let provider = MockProvider::new(vec![model_json(serde_json::json!({
            "step": "output",
            "content": "done"
        }))]);
        let agent = Agent::new(Box::new(provider));

        let events = collect(&agent, "say done").await;
        assert_eq!(events.len(), 1);
        match events[0].as_ref().unwrap() {
            AgentEvent::Final { content } => assert_eq!(content, "done"),
            other => panic!("expected final event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fenced_output_is_parsed() {
        let provider = MockProvider::new(vec![Message::model(
            "```json\n{\"step\":\"output\",\"content\":\"done\"}\n```",
        )]);
        let agent = Agent::new(Box::new(provider));

        let events = collect(&agent, "say done").await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].as_ref().unwrap(),
            AgentEvent::Final { content } if content == "done"
        ));
    }

    #[tokio::test]
    async fn test_think_then_output() {
        let provider = MockProvider::new(vec![
            model_json(serde_json::json!({"step": "think", "content": "planning"})),
            model_json(serde_json::json!({"step": "observe", "content": "noted"})),
            model_json(serde_json::json!({"step": "output", "content": "done"})),
        ]);
        let agent = Agent::new(Box::new(provider));

        let events = collect(&agent, "plan something").await;
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0].as_ref().unwrap(),
            AgentEvent::Thought { content } if content == "planning"
        ));
        assert!(matches!(
            events[1].as_ref().unwrap(),
            AgentEvent::Observation { content } if content == "noted"
        ));
        assert!(matches!(
            events[2].as_ref().unwrap(),
            AgentEvent::Final { .. }
        ));
    }

    #[tokio::test]
    async fn test_tool_dispatch_success() {
        let provider = MockProvider::new(vec![
            model_json(serde_json::json!({
                "step": "action",
                "tool": "getWeatherInfo",
                "input": "Tokyo",
                "content": "checking the weather"
            })),
            model_json(serde_json::json!({"step": "output", "content": "it is hot"})),
        ]);
        let agent = Agent::new(Box::new(provider));

        let events = collect(&agent, "weather in Tokyo").await;
        assert_eq!(events.len(), 2);
        match events[0].as_ref().unwrap() {
            AgentEvent::ToolRun { tool, outcome, .. } => {
                assert_eq!(tool, "getWeatherInfo");
                assert_eq!(outcome.as_ref().unwrap(), "Tokyo weather is 42°C.");
            }
            other => panic!("expected tool run, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tool_failure_is_not_terminal() {
        let provider = MockProvider::new(vec![
            model_json(serde_json::json!({
                "step": "action",
                "tool": "getWeatherInfo",
                "input": {"city": "Tokyo"},
                "content": "malformed input"
            })),
            model_json(serde_json::json!({"step": "output", "content": "recovered"})),
        ]);
        let agent = Agent::new(Box::new(provider));

        let events = collect(&agent, "weather").await;
        assert_eq!(events.len(), 2);
        match events[0].as_ref().unwrap() {
            AgentEvent::ToolRun { outcome, .. } => {
                assert!(matches!(
                    outcome.as_ref().unwrap_err(),
                    AgentError::InvalidParameters(_)
                ));
            }
            other => panic!("expected tool run, got {:?}", other),
        }
        assert!(matches!(
            events[1].as_ref().unwrap(),
            AgentEvent::Final { content } if content == "recovered"
        ));
    }

    #[tokio::test]
    async fn test_unknown_tool_terminates_without_side_effects() {
        let provider = MockProvider::new(vec![
            model_json(serde_json::json!({
                "step": "action",
                "tool": "deleteEverything",
                "input": "/",
                "content": "removing everything"
            })),
            model_json(serde_json::json!({"step": "output", "content": "never reached"})),
        ]);
        let agent = Agent::new(Box::new(provider));

        let events = collect(&agent, "cleanup").await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            terminal_error(&events),
            AgentError::ToolNotFound(name) if name == "deleteEverything"
        ));
    }

    #[tokio::test]
    async fn test_malformed_response_terminates_cleanly() {
        let provider = MockProvider::new(vec![Message::model(
            "I will now create the folder for you.",
        )]);
        let agent = Agent::new(Box::new(provider));

        let events = collect(&agent, "make a folder").await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            terminal_error(&events),
            AgentError::InvalidResponse(_)
        ));
    }

    #[tokio::test]
    async fn test_unknown_step_terminates() {
        let provider = MockProvider::new(vec![model_json(serde_json::json!({
            "step": "ponder",
            "content": "deep thoughts"
        }))]);
        let agent = Agent::new(Box::new(provider));

        let events = collect(&agent, "ponder").await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            terminal_error(&events),
            AgentError::UnknownStep(tag) if tag == "ponder"
        ));
    }

    #[tokio::test]
    async fn test_max_steps_bound() {
        let thinks = (0..5)
            .map(|i| model_json(serde_json::json!({"step": "think", "content": format!("step {i}")})))
            .collect();
        let agent = Agent::new(Box::new(MockProvider::new(thinks))).with_max_steps(3);

        let events = collect(&agent, "loop forever").await;
        assert_eq!(events.len(), 4); // three thoughts, then the bound trips
        assert!(matches!(
            terminal_error(&events),
            AgentError::MaxStepsExceeded(3)
        ));
    }

    /// Provider wrapper that records the transcript length at every call.
    struct RecordingProvider {
        inner: MockProvider,
        lengths: Arc<Mutex<Vec<usize>>>,
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        async fn complete(&self, messages: &[Message]) -> Result<(Message, Usage)> {
            self.lengths.lock().unwrap().push(messages.len());
            self.inner.complete(messages).await
        }
    }

    #[tokio::test]
    async fn test_transcript_grows_monotonically() {
        let lengths = Arc::new(Mutex::new(Vec::new()));
        let provider = RecordingProvider {
            inner: MockProvider::new(vec![
                model_json(serde_json::json!({"step": "think", "content": "planning"})),
                model_json(serde_json::json!({
                    "step": "action",
                    "tool": "getWeatherInfo",
                    "input": "Tokyo",
                    "content": "checking"
                })),
                model_json(serde_json::json!({"step": "output", "content": "done"})),
            ]),
            lengths: lengths.clone(),
        };
        let agent = Agent::new(Box::new(provider));

        let events = collect(&agent, "weather").await;
        assert_eq!(events.len(), 3);

        // opening message, then +2 after the think, +2 after the action
        let recorded = lengths.lock().unwrap().clone();
        assert_eq!(recorded, vec![1, 3, 5]);
        assert!(recorded.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
