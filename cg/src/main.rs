//! clauseguard - contract risk review client
//!
//! CLI entry point.

use std::fs;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result, bail};
use tokio::sync::broadcast;
use tracing::{debug, info};

use clauseguard::analysis::AnalysisClient;
use clauseguard::chat::{ChatClient, ChatOutcome};
use clauseguard::cli::{Cli, Command, DisplayArgs, OutputFormat, generate_after_help, get_log_path};
use clauseguard::config::Config;
use clauseguard::domain::WorkingSet;
use clauseguard::events::{ClientEvent, EventBus};
use clauseguard::intake::FileIntake;
use clauseguard::render;
use clauseguard::repl::ChatSession;
use clauseguard::service::{DocumentService, create_service};
use clauseguard::upload::UploadClient;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(base_url = %config.service.base_url, "clauseguard loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Check { files } => cmd_check(&config, &files),
        Command::Upload { files } => cmd_upload(&config, &files).await,
        Command::Analyze { url, display } => cmd_analyze(&config, &url, &display).await,
        Command::Chat { url, question } => cmd_chat(&config, &url, question.as_deref()).await,
        Command::Review { files, display, chat } => cmd_review(&config, &files, &display, chat).await,
    }
}

/// Print every pending notification on stderr
fn print_events(rx: &mut broadcast::Receiver<ClientEvent>) {
    while let Ok(event) = rx.try_recv() {
        if let Some(notification) = event.notification() {
            eprintln!("{}", render::notification(notification));
        }
    }
}

/// Run intake over `files`, failing when nothing was staged
fn stage(config: &Config, bus: &EventBus, files: &[PathBuf]) -> Result<WorkingSet> {
    let mut rx = bus.subscribe();
    let intake = FileIntake::new(&config.intake, bus.emitter());
    let mut set = WorkingSet::new();
    let report = intake.accept_paths(&mut set, files);
    print_events(&mut rx);
    eprint!("{}", render::rejections(&report.rejected));

    if report.accepted.is_empty() {
        bail!("None of the {} file(s) could be staged", files.len());
    }
    Ok(set)
}

async fn upload(
    config: &Config,
    bus: &EventBus,
    service: Arc<dyn DocumentService>,
    set: &mut WorkingSet,
) -> Result<String> {
    let mut rx = bus.subscribe();
    let mut client = UploadClient::new(service, &config.upload, bus.emitter());
    let outcome = client.submit(set).await;
    print_events(&mut rx);

    let outcome = outcome.context("Upload failed")?;
    print!("{}", render::upload_outcome(&outcome));
    match outcome.redirect {
        Some(url) => Ok(url),
        None => bail!("No file was uploaded successfully"),
    }
}

/// Analyze `url`, drawing a progress line on stderr while waiting
async fn analyze(
    config: &Config,
    bus: &EventBus,
    service: Arc<dyn DocumentService>,
    url: &str,
    display: &DisplayArgs,
) -> Result<()> {
    let mut events = bus.subscribe();
    let mut client = AnalysisClient::new(service, &config.progress, bus.emitter());
    let mut progress = client.progress();
    let live = display.format == OutputFormat::Text && std::io::stderr().is_terminal();

    let result = {
        let request = client.analyze(Some(url));
        tokio::pin!(request);
        let mut progress_open = true;
        loop {
            tokio::select! {
                result = &mut request => break result,
                changed = progress.changed(), if progress_open => {
                    progress_open = changed.is_ok();
                    if live {
                        eprint!("\r{}", render::progress_line(*progress.borrow_and_update()));
                        let _ = std::io::stderr().flush();
                    }
                }
            }
        }
    };
    if live {
        eprintln!("\r{}", render::progress_line(100.0));
    }

    let analysis = match result {
        Ok(analysis) => analysis.clone(),
        Err(e) => {
            print_events(&mut events);
            return Err(e).context("Analysis failed");
        }
    };
    print_events(&mut events);

    match display.format {
        OutputFormat::Json => println!("{}", render::analysis_json(&analysis)?),
        OutputFormat::Text => print!("{}", render::analysis(&analysis, display.clause_view())),
    }
    Ok(())
}

fn cmd_check(config: &Config, files: &[PathBuf]) -> Result<()> {
    debug!(count = files.len(), "cmd_check: called");
    let bus = EventBus::with_default_capacity();
    let set = stage(config, &bus, files)?;
    print!("{}", render::files(&set));
    Ok(())
}

async fn cmd_upload(config: &Config, files: &[PathBuf]) -> Result<()> {
    debug!(count = files.len(), "cmd_upload: called");
    let bus = EventBus::with_default_capacity();
    let service = create_service(&config.service).context("Failed to create HTTP client")?;
    let mut set = stage(config, &bus, files)?;
    upload(config, &bus, service, &mut set).await?;
    Ok(())
}

async fn cmd_analyze(config: &Config, url: &str, display: &DisplayArgs) -> Result<()> {
    let display_args = display;
    debug!(%url, display = ?display_args, "cmd_analyze: called");
    let bus = EventBus::with_default_capacity();
    let service = create_service(&config.service).context("Failed to create HTTP client")?;
    analyze(config, &bus, service, url, display).await
}

async fn cmd_chat(config: &Config, url: &str, question: Option<&str>) -> Result<()> {
    debug!(%url, has_question = question.is_some(), "cmd_chat: called");
    let service = create_service(&config.service).context("Failed to create HTTP client")?;
    let mut session = ChatSession::new(ChatClient::new(service), url);

    match question {
        Some(question) => match session.ask(question).await {
            ChatOutcome::Skipped => bail!("Question is empty"),
            ChatOutcome::Failed => bail!("Chat request failed"),
            ChatOutcome::Answered => Ok(()),
        },
        None => session.run().await,
    }
}

async fn cmd_review(config: &Config, files: &[PathBuf], display: &DisplayArgs, chat: bool) -> Result<()> {
    debug!(count = files.len(), chat, "cmd_review: called");
    let bus = EventBus::with_default_capacity();
    let service = create_service(&config.service).context("Failed to create HTTP client")?;

    let mut set = stage(config, &bus, files)?;
    let url = upload(config, &bus, service.clone(), &mut set).await?;
    println!();
    analyze(config, &bus, service.clone(), &url, display).await?;

    if chat {
        ChatSession::new(ChatClient::new(service), url).run().await?;
    }
    Ok(())
}
