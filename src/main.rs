//! Dowser CLI - embedding-based bug localization backend.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dowser::cli::{Cli, Command, LocalizeArgs, ServeArgs};
use dowser::config::Config;
use dowser::core::{Error, Result};
use dowser::semantic;
use dowser::server::{create_router, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path).context("loading configuration")?,
        None => Config::load_default(".").context("loading configuration")?,
    };

    match cli.command {
        Command::Serve(args) => serve(config, args).await.context("serving requests")?,
        Command::Localize(args) => localize(config, args).await.context("running localization")?,
    }
    Ok(())
}

async fn serve(mut config: Config, args: ServeArgs) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let address = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::bootstrap(config)?;
    info!("bootstrapped");

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("dowser listening on http://{address}");

    axum::serve(listener, router)
        .await
        .map_err(|e| Error::Internal(format!("server failed: {e}")))
}

async fn localize(config: Config, args: LocalizeArgs) -> Result<()> {
    let result = tokio::task::spawn_blocking(move || -> Result<serde_json::Value> {
        let state = AppState::bootstrap(config)?;
        let bug = state.dataset.get(args.bug_id)?.clone();

        let mut files = state.workspace.vectors_at(
            &bug.commit,
            &state.config.repository,
            &state.embeddings,
            state.config.similarity.filter_stopwords,
        )?;

        if let Some(filename) = args.file {
            let doc = files.remove(&filename).ok_or(Error::FileNotFound {
                filename: filename.clone(),
            })?;
            files = std::collections::HashMap::from([(filename, doc)]);
        }

        let localization = semantic::localize(
            &bug.full_text(),
            &files,
            &state.embeddings,
            &state.projector,
            &state.config.similarity,
        );

        let shortlist: Vec<serde_json::Value> = localization
            .shortlist
            .iter()
            .map(|(filename, score)| {
                serde_json::json!({ "filename": filename, "score": score })
            })
            .collect();
        let ranking: Vec<serde_json::Value> = localization
            .files
            .iter()
            .map(|file| {
                serde_json::json!({
                    "filename": file.filename,
                    "bugToFile": file.bug_to_file,
                    "fileToBug": file.file_to_bug,
                    "combined": file.combined,
                })
            })
            .collect();

        Ok(serde_json::json!({
            "bugId": bug.bug_id,
            "commit": bug.commit,
            "bugReportTokens": localization.bug_tokens,
            "bugReportFoundRatio": localization.bug_found_ratio,
            "bugLocations": shortlist,
            "ranking": ranking,
        }))
    })
    .await
    .map_err(|e| Error::Internal(format!("worker task failed: {e}")))??;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
