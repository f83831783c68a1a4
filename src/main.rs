mod analysis;
mod app;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use analysis::InputPaths;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Transaction graph produced by the analysis service.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Fraud detection result (rings and suspicious accounts).
    #[arg(long)]
    fraud: Option<PathBuf>,

    /// Risk intelligence result (per-account scores and factors).
    #[arg(long)]
    risk: Option<PathBuf>,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    neighbor_depth: u8,

    #[arg(long)]
    suspicious_only: bool,

    #[arg(long, default_value_t = 0.0)]
    min_amount: f64,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_filter: String,
}

fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_filter);

    let startup = app::StartupOptions {
        paths: InputPaths {
            dataset: args.dataset,
            fraud: args.fraud,
            risk: args.risk,
        },
        show_only_suspicious: args.suspicious_only,
        min_amount: args.min_amount,
        neighbor_depth: args.neighbor_depth,
    };
    tracing::info!(paths = ?startup.paths, "starting ringlens");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "ringlens",
        options,
        Box::new(move |cc| Ok(Box::new(app::FraudGraphApp::new(cc, startup)))),
    )
}
