use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{VerificationApi, VerificationClient, ViewController, ViewRequest};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod requests;
mod session;
mod ui;

use config::{load_settings, normalize_base_url, Settings};
use ui::{
    render::Renderer,
    theme::{Theme, ThemeState},
};

#[derive(Parser, Debug)]
#[command(name = "newscheck", version, about = "Check news against a verification service")]
struct Cli {
    #[arg(long, global = true, help = "Verification service base URL")]
    base_url: Option<String>,
    #[arg(long, global = true, value_enum)]
    theme: Option<Theme>,
    #[arg(long, global = true, help = "Transport timeout in seconds")]
    timeout_secs: Option<u64>,
    #[arg(long, global = true, help = "Disable colored output")]
    no_color: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all news articles.
    List,
    /// Check a headline or claim.
    Check {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Upload a document for checking.
    CheckFile { path: PathBuf },
    /// Interactive session; every line is a new check.
    Interactive,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    init_tracing(&settings.log_level);

    let theme = ThemeState::new(settings.theme);
    info!(base_url = %settings.base_url, theme = %theme.current(), "starting newscheck");

    let client = build_client(&settings)?;
    let controller = ViewController::new(Arc::new(client));
    let renderer = Renderer::new(theme, !cli.no_color);

    let request = match cli.command {
        Command::List => ViewRequest::LoadAll,
        Command::Check { text } => requests::text_request(&text.join(" "))?,
        Command::CheckFile { path } => requests::document_request(&path).await?,
        Command::Interactive => {
            session::run(controller, renderer).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    Ok(run_once(&controller, &renderer, request).await)
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings()?;
    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(theme) = cli.theme {
        settings.theme = theme;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.request_timeout_secs = Some(secs);
    }
    settings.base_url = normalize_base_url(&settings.base_url)?;
    Ok(settings)
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(settings: &Settings) -> Result<VerificationClient> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = settings.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let http = builder.build().context("failed to build http client")?;
    Ok(VerificationClient::with_http(http, settings.base_url.clone()))
}

async fn run_once<A: VerificationApi + 'static>(
    controller: &ViewController<A>,
    renderer: &Renderer,
    request: ViewRequest,
) -> ExitCode {
    let pending = controller.dispatch(request);
    println!("{}", renderer.render(&controller.state()));
    pending.await;

    let state = controller.state();
    println!("{}", renderer.render(&state));
    if state.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
