mod api;
mod app;
mod canvas;
mod config;
mod editor;
mod error;
mod export;
mod history;
mod model;
mod remote;

use anyhow::Context as _;
use clap::Parser;
use eframe::egui;

#[derive(Parser)]
#[command(name = "thermal-annotate")]
#[command(
    about = "Interactive bounding-box editor for transformer thermal inspection results",
    long_about = None
)]
struct Cli {
    /// Analysis job whose annotation record is edited
    #[arg(long)]
    job_id: u64,

    /// Backend path of the boxed analysis image (e.g. /analysis/42_boxed.png)
    #[arg(long)]
    image: String,

    /// Override the backend base URL from the config file
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token for the backend (overrides config and environment)
    #[arg(long)]
    token: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "thermal_annotate=debug"
    } else {
        "thermal_annotate=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let mut config = config::Config::load().context("failed to load config")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(token) = cli.token {
        config.api_token = Some(token);
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let handle = runtime.handle().clone();

    let title = format!("thermal-annotate - job {}", cli.job_id);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_title(&title),
        ..Default::default()
    };

    let job_id = cli.job_id;
    let image = cli.image;
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let app = app::AnnotateApp::new(cc, config, job_id, image, handle)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to run ui: {err}"))?;

    Ok(())
}
