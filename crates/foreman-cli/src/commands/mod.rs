use console::style;
use foreman::providers::configs::GeminiProviderConfig;

pub mod models;
pub mod run;
pub mod version;

/// Load the provider configuration or exit with a distinct failure status.
pub(crate) fn load_config() -> GeminiProviderConfig {
    match GeminiProviderConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{} {}", style("error:").red().bold(), error);
            std::process::exit(1);
        }
    }
}
