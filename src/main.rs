use chrono::{DateTime, Local, Utc};
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{info, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, ToolsCommands};
use config::{Config, DisplayConfig};
use toolsession::{
    BackendGateway, ChatSession, HttpGateway, ToolIcon, ToolIngestionPipeline, ToolRegistry, Turn, UsageSet,
};

fn setup_logging(level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toolsession")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("toolsession.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let mut gateway_config = config.backend.gateway_config();
    if let Some(url) = &cli.backend {
        gateway_config.base_url = url.clone();
    }
    let gateway: Arc<dyn BackendGateway> =
        Arc::new(HttpGateway::new(gateway_config).context("Failed to create backend gateway")?);

    match &cli.command {
        None | Some(Commands::Chat) => run_chat(gateway, config, cli.is_verbose()).await,
        Some(Commands::Tools { command }) => handle_tools_command(command, gateway).await,
    }
}

async fn run_chat(gateway: Arc<dyn BackendGateway>, config: &Config, verbose: bool) -> Result<()> {
    let session = ChatSession::new(gateway.clone());
    let pipeline = ToolIngestionPipeline::new(gateway);

    if let Err(e) = pipeline.refresh_registry().await {
        warn!("Initial tool listing failed: {}", e);
        println!("{} {}", "Could not load tools:".yellow(), e);
    }

    println!("{}", "Type a message, or /tools, /reset, /quit".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".cyan().bold());
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset().await;
                println!("{}", "Conversation cleared".green());
            }
            "/tools" => {
                if let Err(e) = pipeline.refresh_registry().await {
                    println!("{} {}", "Could not refresh tools:".yellow(), e);
                }
                print_registry(&pipeline.registry().await, &session.usage().await);
            }
            text => match session.send(text).await {
                Ok(Some(_)) => {
                    if let Some(turn) = session.turns().await.last() {
                        print_assistant_turn(turn, &config.display, verbose);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    info!("Send failed: {}", e);
                    let message = session.status().await.error.unwrap_or_else(|| e.to_string());
                    println!("{} {}", "Error:".red(), message);
                }
            },
        }
    }

    info!("Chat ended after {} turns", session.len().await);
    Ok(())
}

async fn handle_tools_command(command: &ToolsCommands, gateway: Arc<dyn BackendGateway>) -> Result<()> {
    info!("Handling tools command: {:?}", command);
    let pipeline = ToolIngestionPipeline::new(gateway);

    match command {
        ToolsCommands::List => {
            pipeline.refresh_registry().await.context("Failed to list tools")?;
            print_registry(&pipeline.registry().await, &UsageSet::new());
        }
        ToolsCommands::Add { file } => {
            let source = read_source(file)?;
            let reply = pipeline.submit_paste(&source).await.context("Failed to add tool")?;
            println!("{} {}", "Added:".green(), reply.name);
        }
        ToolsCommands::Generate { description, submit } => {
            let code = pipeline.submit_prompt(description).await.context("Failed to generate code")?;
            println!("{}", code);
            if *submit {
                let reply = pipeline.submit_paste(&code).await.context("Failed to add tool")?;
                println!("{} {}", "Added:".green(), reply.name);
            }
        }
        ToolsCommands::Import { url } => {
            let reply = pipeline
                .submit_git_import(url)
                .await
                .context("Failed to add tool from git")?;
            println!("{} {}", "Imported:".green(), reply.name);
        }
        ToolsCommands::Show { name } => {
            let source = pipeline
                .view_tool_source(name)
                .await
                .context(format!("Failed to fetch source of {}", name))?;
            println!("{}", format!("# {}", source.name).dimmed());
            println!("{}", source.code);
        }
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).context(format!("Failed to read {}", path.display()))
}

fn print_assistant_turn(turn: &Turn, display: &DisplayConfig, verbose: bool) {
    for invocation in turn.invocations() {
        let icon = ToolIcon::for_tool(&invocation.tool_name);
        if display.show_arguments {
            println!(
                "  {} {} {}",
                icon.glyph(),
                invocation.display_name().magenta(),
                invocation.arguments_payload.dimmed()
            );
        } else {
            println!("  {} {}", icon.glyph(), invocation.display_name().magenta());
        }
    }

    if display.show_trace || verbose {
        for entry in turn.trace_entries() {
            println!("  {}", entry.dimmed());
        }
    }

    println!("{} {}", clock_time(turn.created_at()).dimmed(), turn.text());
}

/// Local wall-clock time of a turn, e.g. `14:03:27`
fn clock_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn print_registry(registry: &ToolRegistry, usage: &UsageSet) {
    if registry.is_empty() {
        println!("{}", "No tools registered".dimmed());
        return;
    }

    for tool in registry.descriptors() {
        let used = if registry.is_used(&tool.name, usage) {
            "✓".green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {} {:<28} {:<10} {}",
            used,
            ToolIcon::for_tool(&tool.name).glyph(),
            tool.display_name().bold(),
            format!("[{}]", tool.origin.badge()).cyan(),
            tool.description.dimmed()
        );
        if let Some(source_ref) = &tool.source_ref {
            println!("      {}", source_ref.dimmed());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_clock_time_shape() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 4, 7).unwrap();
        let shown = clock_time(at);

        assert_eq!(shown.len(), 8);
        assert_eq!(shown.matches(':').count(), 2);
        // zone offsets are whole minutes, so seconds carry over
        assert!(shown.ends_with(":07"));
    }
}
