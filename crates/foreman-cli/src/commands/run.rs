use anyhow::Result;
use foreman::agent::Agent;
use foreman::providers::gemini::GeminiProvider;

use crate::session;

pub async fn execute(task: String, model: Option<String>, max_steps: Option<usize>) -> Result<()> {
    let mut config = super::load_config();
    if let Some(model) = model {
        config = config.with_model(model);
    }

    let provider = GeminiProvider::new(config)?;
    let mut agent = Agent::new(Box::new(provider));
    if let Some(max_steps) = max_steps {
        agent = agent.with_max_steps(max_steps);
    }

    session::run_to_completion(&agent, &task).await
}
