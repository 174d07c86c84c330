use std::io;
use std::sync::Arc;

use anyhow::Context;
use cairn::prelude::*;
use cairn::tools::RingDiagnostics;

use cairn_cli::{
    config::Config,
    logging::init_logging,
    render::Renderer,
    terminal::{Terminal, TerminalConfirm},
};

const PROMPT: &str = "\n> ";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    let diagnostics = Arc::new(RingDiagnostics::new());
    init_logging(&config.logging, diagnostics.clone());

    tracing::info!(model = %config.model.model, endpoint = %config.model.endpoint, "starting cairn");

    let terminal = Terminal::new();
    let mut builder = AgentBuilder::new()
        .provider(config.provider_config())
        .model(config.model_config())
        .graph_config(config.graph_config())
        .diagnostics(diagnostics)
        .confirm(Arc::new(TerminalConfirm::new(terminal.clone())));
    if let Some(endpoint) = &config.save.endpoint {
        builder = builder.save_endpoint(endpoint);
    }
    if let Some(path) = &config.session.path {
        builder = builder.session_path(path);
    }
    let agent = builder.build().await?;

    if agent.restored_turns() > 0 {
        println!("session restored ({} turns)", agent.restored_turns());
    }
    println!("/clear starts over, /quit exits, Ctrl-C cancels a running answer");

    while let Some(line) = terminal.read_line(PROMPT).await? {
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                agent.session().clear().await?;
                println!("conversation cleared");
            }
            text => run_turn(&agent, text).await?,
        }
    }

    Ok(())
}

async fn run_turn(agent: &Agent, text: &str) -> anyhow::Result<()> {
    let mut renderer = Renderer::new(io::stdout());

    let mut handle = match agent.submit(text) {
        Ok(handle) => handle,
        Err(e) => {
            renderer.notice(&e.to_string())?;
            return Ok(());
        }
    };

    // Ctrl-C cancels the run, not the process
    let cancel = handle.cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    while let Some(event) = handle.events.recv().await {
        renderer.render(&event)?;
    }
    interrupt.abort();

    match handle.join.await.context("run task failed")? {
        Ok(outcome) => renderer.finish(&outcome)?,
        Err(e) => renderer.notice(&e.to_string())?,
    }

    Ok(())
}
