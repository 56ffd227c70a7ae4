//! `taskclaw agent`: Run a single task or chat interactively.
//!
//! Execution log entries are printed to stderr as the run produces them;
//! the final answer goes to stdout.

use std::io::Write;
use std::sync::Arc;

use taskclaw_agent::{AgentStreamEvent, ChannelSink, TaskAgent};
use taskclaw_config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub async fn run(
    message: Option<String>,
    session: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early: give a clear error
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    ANTHROPIC_API_KEY=sk-ant-...   (default provider)");
        eprintln!("    OPENROUTER_API_KEY=sk-or-...   (with TASKCLAW_PROVIDER=openrouter)");
        eprintln!("    TASKCLAW_API_KEY=...           (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = taskclaw_providers::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    let agent = Arc::new(TaskAgent::from_config(&config, provider));

    if let Some(task) = message {
        let response = run_streamed(&agent, task, session).await?;
        println!("{response}");
        return Ok(());
    }

    println!();
    println!("  TaskClaw Agent: Interactive Mode");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Tools:     {}", agent.tools().names().join(", "));
    println!("  Session:   {}", session.as_deref().unwrap_or("default"));
    println!();
    println!("  Type a task and press Enter. Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  Task > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let task = line.trim();
        if task.is_empty() {
            continue;
        }
        if matches!(task, "exit" | "quit") {
            break;
        }

        let response = run_streamed(&agent, task.to_string(), session.clone()).await?;
        println!();
        for line in response.lines() {
            println!("  Answer > {line}");
        }
        println!();
    }

    Ok(())
}

/// Run one task on a background task and print its log as it arrives.
async fn run_streamed(
    agent: &Arc<TaskAgent>,
    task: String,
    session: Option<String>,
) -> Result<String, Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::channel(128);
    let sink = ChannelSink::new(tx);

    let agent = agent.clone();
    let worker = tokio::spawn(async move {
        agent
            .execute_task_streaming(&task, session.as_deref(), &sink)
            .await
    });

    while let Some(event) = rx.recv().await {
        if let AgentStreamEvent::Log { log_type, message, .. } = event {
            eprintln!("  {} {message}", log_type.marker());
        }
    }

    Ok(worker.await?)
}
