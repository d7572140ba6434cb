//! Fire-watch constellation simulator CLI
//!
//! Runs the tick loop headless and writes a JSON run report.
//!
//! Usage:
//!   constellation-sim --preset hero --ticks 3600 --seed 7
//!   constellation-sim --preset dashboard --fires data/fires.json --output run.json

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use constellation_sim::{SimulationConfig, SimulationContext};
use fire_events::{firms, LandMask};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// 24-satellite landing-page scene
    Hero,
    /// 500-satellite map dashboard
    Dashboard,
}

#[derive(Parser, Debug)]
#[command(
    name = "constellation-sim",
    about = "Simulate a Walker Delta fire-watch constellation"
)]
struct Args {
    /// Simulation config JSON file (overrides --preset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in configuration
    #[arg(short, long, value_enum, default_value_t = Preset::Hero)]
    preset: Preset,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Fire-record JSON array to ingest before the run
    #[arg(short, long)]
    fires: Option<PathBuf>,

    /// Keep low-confidence fire records
    #[arg(long)]
    all_confidence: bool,

    /// Equirectangular ASCII land mask ('#' land, '.' water) for spawn sites
    #[arg(long)]
    land_mask: Option<PathBuf>,

    /// RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output JSON report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        "constellation_sim=debug,fire_events=debug,fire_detection=debug,collision_avoidance=debug,orbital_mechanics=debug"
    } else {
        "constellation_sim=info,fire_events=info,orbital_mechanics=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("{}", "=".repeat(60));
    info!("Fire-watch Constellation Simulator");
    info!("{}", "=".repeat(60));

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading config {:?}", path))?,
        None => match args.preset {
            Preset::Hero => SimulationConfig::hero(),
            Preset::Dashboard => SimulationConfig::dashboard(),
        },
    };
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }

    let mut ctx = SimulationContext::new(config)?;

    if let Some(path) = &args.land_mask {
        let mask = LandMask::load(path).with_context(|| format!("loading land mask {:?}", path))?;
        info!("Land mask covers {:.1}% land", mask.land_fraction() * 100.0);
        ctx = ctx.with_classifier(Box::new(mask));
    }

    if let Some(path) = &args.fires {
        let mut records = firms::load_records(path)?;
        if !args.all_confidence {
            records = firms::filter_confident(records);
        }
        ctx.ingest_records(&records);
    }

    let summary = ctx.run(args.ticks);

    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Generations:        {}", summary.final_generation);
    info!("Sim time:           {:.3}", summary.sim_time);
    info!("Events spawned:     {}", summary.events_spawned);
    info!("Events removed:     {}", summary.events_removed);
    info!("Detections:         {}", summary.detections);
    info!("Thermal sightings:  {}", summary.thermal_lines);
    if ctx.config().separation.is_some() {
        info!("Stalls / forced:    {} / {}", summary.stalls, summary.forced_advances);
    }

    if let Some(path) = &args.output {
        info!("Writing report to {:?}", path);
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &ctx.report(summary))?;
    }

    Ok(())
}
