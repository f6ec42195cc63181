use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use traffic_check::pipeline::{self, TrafficPipeline};
use traffic_check::{ConsolePresenter, ModelLoader, Presenter, TrafficConfig};

#[derive(Parser)]
#[command(name = "traffic-check")]
#[command(about = "Count vehicles in a traffic image, rate congestion and flag emergency vehicles")]
struct Cli {
    /// Traffic image to analyse (jpg, jpeg or png)
    #[arg(value_name = "IMAGE")]
    image_path: Option<PathBuf>,

    /// Detection checkpoint (.rten); defaults to ~/.cache/traffic-check/detr-resnet-50.rten
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Label vocabulary for custom checkpoints, one label per line
    #[arg(long, value_name = "FILE")]
    labels: Option<PathBuf>,

    /// TrueType font for box captions
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// TOML configuration file (falls back to $TRAFFIC_CHECK_CONFIG)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum detection confidence
    #[arg(long)]
    confidence: Option<f32>,

    /// Vehicle count at which traffic becomes Moderate
    #[arg(long)]
    moderate_at: Option<usize>,

    /// Vehicle count at which traffic becomes Heavy
    #[arg(long)]
    heavy_at: Option<usize>,

    /// Write the annotated image here
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Open the upload window instead of analysing IMAGE
    #[cfg(feature = "gui")]
    #[arg(long)]
    gui: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut TrafficConfig) {
        if let Some(model) = &self.model {
            config.model.path = Some(model.clone());
        }
        if let Some(labels) = &self.labels {
            config.model.labels_path = Some(labels.clone());
        }
        if let Some(font) = &self.font {
            config.font_path = Some(font.clone());
        }
        if let Some(confidence) = self.confidence {
            config.model.confidence_threshold = confidence;
        }
        if let Some(moderate_at) = self.moderate_at {
            config.congestion.moderate_at = moderate_at;
        }
        if let Some(heavy_at) = self.heavy_at {
            config.congestion.heavy_at = heavy_at;
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "traffic_check=debug"
    } else {
        "traffic_check=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let mut config = TrafficConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply_overrides(&mut config);
    config.validate()?;

    #[cfg(feature = "gui")]
    if args.gui {
        return traffic_check::gui::run(config);
    }

    let image_path = args
        .image_path
        .clone()
        .context("No image given. Pass the path of a jpg, jpeg or png file")?;
    pipeline::validate_extension(&image_path)?;

    // Load once, before touching the upload
    let loader = ModelLoader::from_config(&config.model)?;
    let detector = loader.load().context("Failed to load detection model")?;

    let mut traffic_pipeline = TrafficPipeline::new(detector, config).with_verbose(args.verbose);
    if let Some(debug_dir) = args.debug_out.clone() {
        traffic_pipeline = traffic_pipeline.with_debug(debug_dir)?;
    }

    info!("Loading image: {}", image_path.display());
    let bytes = std::fs::read(&image_path)
        .with_context(|| format!("Failed to read {}", image_path.display()))?;

    let output = traffic_pipeline.run(&bytes)?;

    let stdout = std::io::stdout();
    let mut presenter = ConsolePresenter::new(stdout.lock())
        .with_json(args.json)
        .with_verbose(args.verbose)
        .with_image_output(args.output.clone());
    presenter.present(&output.annotated, &output.report)?;

    Ok(())
}
