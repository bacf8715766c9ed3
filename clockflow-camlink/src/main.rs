use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clockflow_camlink::config::PipelineConfig;
use clockflow_camlink::logging::{self, LogFormat};
use clockflow_camlink::pipeline::Side;
use clockflow_camlink::simulation::Simulation;
use clockflow_camlink::sink::{DecodingConsumer, RandomConsumer};
use clockflow_camlink::source::VideoPattern;
use tracing::{error, info};

/// Runs the camera link capture pipeline against a free-running video source.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// TOML configuration. The reference design is used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Producer cycles to simulate. Defaults to one video frame.
    #[arg(short = 'n', long)]
    cycles: Option<u64>,

    /// Overrides the metastability and consumer seeds.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.log_format, "info");

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.metastability.get_or_insert_with(Default::default).seed = seed;
    }
    let settings = config.to_settings().context("invalid pipeline configuration")?;
    let cycles = args.cycles.unwrap_or_else(|| config.video.frame_len());
    let seed = config.metastability.map_or(0, |metastability| metastability.seed);

    let producer = VideoPattern::new(config.video);
    let consumer = RandomConsumer::new(
        DecodingConsumer::new(settings.converter, false),
        config.consumer.ready_probability,
        seed,
    );
    let mut simulation = Simulation::new(settings, producer, consumer)?;

    info!(cycles, "starting simulation");
    if let Err(e) = simulation.run_cycles(Side::Producer, cycles) {
        error!(error = %e, "simulation stopped");
    }

    let decoded = simulation.consumer().inner();
    let mut report = simulation.report();
    report.insert("consumer", "words", decoded.words());
    report.insert("consumer", "active_pixels", decoded.active());
    report.insert("consumer", "counter_gaps", decoded.gaps());
    println!("{report}");
    Ok(())
}
