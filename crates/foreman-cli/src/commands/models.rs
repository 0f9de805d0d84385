use anyhow::Result;
use console::style;
use foreman::providers::gemini::GeminiProvider;

pub async fn execute() -> Result<()> {
    let config = super::load_config();
    let provider = GeminiProvider::new(config)?;

    match provider.list_models().await {
        Ok(catalog) => {
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
        Err(error) => {
            eprintln!("{} {}", style("error:").red().bold(), error);
        }
    }
    Ok(())
}
