//! deck - export a generated slide deck.
//!
//! Usage:
//!   deck --project-id 42 --output review.pptx
//!   deck --input project.json --output preview.svg

use anyhow::{bail, Context};
use clap::Parser;
use deck_cli::{CliArgs, DeckConfig, HeadlessHost, Project, ProjectClient, ProjectSource, ProjectStatus};
use deck_export::DeckExporter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with optional JSON output.
///
/// Set `RUST_LOG_FORMAT=json` for structured JSON logs.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,deck_core=debug,deck_export=debug,deck_cli=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

async fn load_project(config: &DeckConfig) -> anyhow::Result<Project> {
    match &config.source {
        Some(ProjectSource::File(path)) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Project::from_json(&text).with_context(|| format!("failed to parse {}", path.display()))
        }
        Some(ProjectSource::Remote { api_url, project_id }) => {
            let client = ProjectClient::new(api_url)?;
            tracing::info!("Waiting for project {} at {}", project_id, api_url);
            Ok(client.poll_until_terminal(project_id, &config.poll).await?)
        }
        None => bail!("nothing to export: pass --project-id or --input"),
    }
}

async fn run(config: DeckConfig) -> anyhow::Result<()> {
    let project = load_project(&config).await?;
    if project.status == ProjectStatus::Failed {
        bail!("project generation failed");
    }
    if project.slides.is_empty() {
        bail!("project has no slides");
    }

    let theme = project.theme_or_default();
    let exporter = DeckExporter::new(config.export.clone());
    let host = HeadlessHost::new(config.host.clone());
    let path = host
        .export(&project.slides, &theme, &exporter, config.format, &config.output)
        .await
        .with_context(|| format!("failed to export {}", config.output.display()))?;

    tracing::info!("Wrote {} ({})", path.display(), config.format);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = DeckConfig::from(args);
    tracing::info!("Starting deck v{}", env!("CARGO_PKG_VERSION"));

    tokio::select! {
        result = run(config) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, nothing written");
            Ok(())
        }
    }
}
