//! `taskclaw tools`: Print the tool catalog the agent is prompted with.

use taskclaw_agent::TaskAgent;
use taskclaw_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // No provider call happens here, so a missing key is fine.
    let router = taskclaw_providers::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    let agent = TaskAgent::from_config(&config, provider);

    println!("Available tools ({}):\n", agent.tools().len());
    println!("{}", agent.tools().catalog());

    Ok(())
}
