// inkwell-cli/src/main.rs
mod batch;
mod console;
mod models;
mod rendering;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::*;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use time::macros::format_description;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use inkwell_core::{
    run_session, AgentError, Composer, Conversation, Dispatcher, GmailClient, InkwellConfig,
    Mailbox, OpenAIProvider, Provider, ProviderRegistry, RuntimeSecrets, ToolRegistry,
};

use crate::batch::{BatchSender, RowOutcome};
use crate::console::{batch_progress, thinking_spinner, ConsoleUi};
use crate::models::cli::{Cli, Commands};
use crate::rendering::{print_panel, print_reply, PanelKind};

const CONFIG_FILENAME: &str = "Inkwell.toml";
const APP_DIR_NAME: &str = "inkwell";
const LOG_FILE_NAME: &str = "inkwell.log";

/// Walks up from `start` looking for an `Inkwell.toml`.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

fn load_config(explicit: Option<&Path>) -> Result<InkwellConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let current_dir = env::current_dir().context("Failed to get current directory")?;
            find_config_file(&current_dir)
        }
    };

    match path {
        Some(path) => {
            info!("Found configuration file at: {:?}", path);
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            InkwellConfig::from_toml_str(&content)
                .context("Failed to parse or validate configuration content")
        }
        None => {
            info!(
                "No {} found; using built-in defaults and environment.",
                CONFIG_FILENAME
            );
            Ok(InkwellConfig::from_env_defaults())
        }
    }
}

fn build_provider_registry(
    config: &InkwellConfig,
    api_keys: &HashMap<String, String>,
    http_client: &reqwest::Client,
) -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new(config.default_provider.clone());
    for (id, provider_config) in &config.providers {
        let api_key = api_keys
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("No API key loaded for provider '{}'", id))?;
        match provider_config.provider_type.as_str() {
            "openai" => {
                let provider = OpenAIProvider::new(
                    provider_config.model_config.clone(),
                    http_client.clone(),
                    api_key,
                );
                registry.register(id.clone(), Arc::new(provider));
            }
            other => {
                return Err(anyhow!(
                    "Unsupported provider type '{}' for provider '{}'",
                    other,
                    id
                ))
            }
        }
        debug!(provider_id = %id, "Registered provider");
    }
    Ok(registry)
}

fn resolve_provider(registry: &ProviderRegistry, id: &str) -> Result<Arc<dyn Provider>, AgentError> {
    registry
        .get(id)
        .map_err(|e| AgentError::config(format!("{} (check [providers] in {})", e, CONFIG_FILENAME)))
}

fn build_composer(registry: &ProviderRegistry, config: &InkwellConfig) -> Result<Composer> {
    let provider = resolve_provider(registry, config.composer_provider_id())?;
    Ok(Composer::new(provider, config.composer.clone()))
}

async fn build_mailbox(
    config: &InkwellConfig,
    http_client: &reqwest::Client,
    access_token: String,
) -> Result<Mailbox> {
    let gmail = GmailClient::new(http_client.clone(), &config.mail, access_token);
    let sender = match &config.mail.from_address {
        Some(address) => address.clone(),
        None => gmail
            .profile_address()
            .await
            .context("Failed to look up the account address; set mail.from_address")?,
    };
    info!(sender = %sender, "Using mailbox");
    Ok(Mailbox::new(Arc::new(gmail), sender))
}

async fn build_conversation(config: &InkwellConfig) -> Result<Conversation> {
    let secrets = RuntimeSecrets::from_env(config)?;
    let http_client = reqwest::Client::new();
    let registry = build_provider_registry(config, &secrets.api_keys, &http_client)?;

    let mailbox = build_mailbox(config, &http_client, secrets.mail_access_token).await?;
    let composer = build_composer(&registry, config)?;
    let tools = ToolRegistry::mail_tools()
        .map_err(|e| AgentError::config(format!("Invalid tool catalog: {:#}", e)))?;
    let dispatcher = Dispatcher::new(tools, mailbox, composer);
    Ok(Conversation::new(
        resolve_provider(&registry, registry.default_provider_id())?,
        Arc::new(dispatcher),
        config.system_prompt.as_deref(),
    ))
}

/// Runs a single turn (non-interactive).
async fn run_single_turn(mut conversation: Conversation, prompt: &str) -> Result<()> {
    info!(task = %prompt, "Running non-interactive turn.");
    let pb = thinking_spinner("Thinking...")?;
    let result = conversation.handle_turn(prompt).await;
    pb.finish_and_clear();

    match result {
        Ok(reply) => {
            print_reply(&reply);
            Ok(())
        }
        Err(e) => {
            print_panel(PanelKind::Error, &e.to_string());
            Err(anyhow!(e))
        }
    }
}

async fn run_interactive(mut conversation: Conversation, app_dir: Option<PathBuf>) -> Result<()> {
    let mut ui = ConsoleUi::new(app_dir)?;
    ui.print_welcome();
    run_session(&mut conversation, &mut ui).await?;
    Ok(())
}

/// Dry runs need neither the mail token nor the account lookup.
async fn run_batch(config: &InkwellConfig, file: &Path, subject: &str, dry_run: bool) -> Result<()> {
    let http_client = reqwest::Client::new();
    let api_keys = RuntimeSecrets::api_keys_from_env(config)?;
    let registry = build_provider_registry(config, &api_keys, &http_client)?;
    let composer = build_composer(&registry, config)?;
    let mailbox = if dry_run {
        None
    } else {
        let token = RuntimeSecrets::mail_token_from_env(config)?;
        Some(build_mailbox(config, &http_client, token).await?)
    };

    let sender = BatchSender::new(&composer, mailbox.as_ref(), subject);
    let pb = batch_progress("Drafting letters...")?;
    let report = sender.run_file(file, &pb).await?;

    for outcome in &report.outcomes {
        match outcome {
            RowOutcome::Sent { row, email, detail } => {
                println!("{} row {} ({}): {}", "✔".green(), row, email, detail);
            }
            RowOutcome::Drafted { row, email, body } => {
                print_panel(
                    PanelKind::ToolResult,
                    &format!("Row {} draft for {}\n{}", row, email, body),
                );
            }
            RowOutcome::Failed { row, email, error } => {
                println!(
                    "{} row {} ({}): {}",
                    "✘".red(),
                    row,
                    email.as_deref().unwrap_or("-"),
                    error
                );
            }
        }
    }

    let summary = report.summary();
    if report.failed() > 0 {
        print_panel(PanelKind::Warning, &summary);
    } else {
        println!("\n{}", summary.cyan());
    }
    Ok(())
}

fn app_dir() -> Option<PathBuf> {
    dirs::cache_dir()
        .or_else(dirs::runtime_dir)
        .or_else(|| Some(env::temp_dir()))
        .map(|d| d.join(APP_DIR_NAME))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Colour early errors even before logging is set up.
    colored::control::set_override(true);

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // --- Logging Setup ---
    let default_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let log_dir = match app_dir() {
        Some(dir) => dir,
        None => {
            eprintln!(
                "{}",
                "Error: Could not determine a suitable directory for log files.".red()
            );
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Error:".red(),
            log_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }
    let log_path = log_dir.join(LOG_FILE_NAME);

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let local_timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));
    let file_layer = fmt::layer()
        .with_writer(non_blocking_writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_timer(local_timer.clone());
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(local_timer)
        .with_target(false)
        .with_level(true);

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("{} Failed to initialize logging: {}", "Error:".red(), e);
        return ExitCode::FAILURE;
    }
    colored::control::unset_override();

    info!(
        "Logging initialized. Level determined by RUST_LOG or -v flags (default: {}). Logging to stderr and {}",
        default_level,
        log_path.display()
    );
    // --- End Logging Setup ---

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            eprintln!("{} Could not load configuration: {:#}", "Error:".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Some(Commands::Batch {
            file,
            subject,
            dry_run,
        }) => run_batch(&config, &file, &subject, dry_run).await,
        None => match build_conversation(&config).await {
            Ok(conversation) => match cli.turn {
                Some(prompt) => run_single_turn(conversation, &prompt).await,
                None => run_interactive(conversation, Some(log_dir)).await,
            },
            Err(e) => {
                error!("Startup failed: {:?}", e);
                eprintln!("{} {:#}", "Error:".red(), e);
                return ExitCode::FAILURE;
            }
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Operation failed: {:?}", e);
            eprintln!("{} Operation failed: {:#}", "Error:".red(), e);
            ExitCode::FAILURE
        }
    }
}
