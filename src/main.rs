mod chart;
mod collect;
mod config;
mod driver;
mod extract;
mod render;
mod sweep;

use clap::Parser;
use config::{PlotConfig, ThroughputMode};
use driver::Settings;
use render::PlottersRenderer;
use std::path::PathBuf;
use std::process::ExitCode;

/// Parse serving-benchmark sweep logs and render latency and throughput
/// charts next to them.
#[derive(Parser, Debug)]
#[command(name = "sweepplot", version, about)]
pub struct Cli {
    /// Base directory where benchmark results are stored (overrides config)
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Model name to include in chart titles (overrides config)
    #[arg(long)]
    model_name: Option<String>,

    /// Series shown on the throughput chart (overrides config)
    #[arg(long, value_enum)]
    throughput_mode: Option<ThroughputMode>,

    /// Output resolution in dots per inch, 1 to 1200 (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=config::MAX_DPI as i64))]
    dpi: Option<u32>,

    /// Skip long_prompt_concurrency_sweep directories
    #[arg(long)]
    no_long_prompt: bool,

    /// Config file path
    #[arg(short, long, default_value = "sweepplot.toml")]
    config: PathBuf,

    /// Print resolved settings and exit without scanning
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (per-file parse results)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Merge CLI overrides over the config file values.
    fn resolve(&self, config: PlotConfig) -> (Settings, u32) {
        let settings = Settings {
            base_dir: self
                .base_dir
                .clone()
                .unwrap_or(config.input.base_dir),
            model_name: self.model_name.clone().or(config.chart.model_name),
            throughput_mode: self
                .throughput_mode
                .unwrap_or(config.chart.throughput_mode),
            include_long_prompt: config.input.include_long_prompt && !self.no_long_prompt,
        };
        let dpi = self.dpi.unwrap_or(config.chart.dpi);
        (settings, dpi)
    }

    fn log_filter(&self) -> &'static str {
        if self.verbose {
            "sweepplot=debug"
        } else if self.quiet {
            "sweepplot=warn"
        } else {
            "sweepplot=info"
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_filter())),
        )
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let config = match PlotConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    let (settings, dpi) = cli.resolve(config);

    if cli.dry_run {
        println!("sweepplot v{}", env!("CARGO_PKG_VERSION"));
        println!("Config file: {}", cli.config.display());
        println!("Base directory: {}", settings.base_dir.display());
        println!(
            "Model name: {}",
            settings.model_name.as_deref().unwrap_or("(none)")
        );
        println!("Throughput mode: {}", settings.throughput_mode);
        println!("Long-prompt sweeps: {}", settings.include_long_prompt);
        println!("DPI: {dpi}");
        return ExitCode::SUCCESS;
    }

    let renderer = PlottersRenderer::new(dpi);
    match driver::run(&settings, &renderer) {
        Ok(summary) => {
            for dir in summary.empty_directories() {
                tracing::debug!(
                    dir = %dir.path.display(),
                    sweep = ?dir.sweep,
                    skipped = dir.skipped.len(),
                    "sweep directory had no usable logs"
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
