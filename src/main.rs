use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

use wifi_locate::api::{JsonLinesSink, PositionSink, RefreshLoop, TextSink};
use wifi_locate::core::ApRegistry;
use wifi_locate::hardware::{build_scanner, ScannerBackend};
use wifi_locate::processing::{rank_by_signal, ScanAggregator, SignalModel};
use wifi_locate::utils::{init_tracing, LocatorConfig, LogLevel};

/// Estimate indoor position from WiFi signal strength
#[derive(Parser)]
#[command(name = "wifi-locate", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the refresh loop and print a position per tick
    Locate(LocateArgs),
    /// Run one scan pass and list nearby access points, strongest first
    Scan(SourceArgs),
    /// Validate the survey file and print pixel positions
    CheckSurvey(SourceArgs),
    /// Print the default configuration as JSON
    DefaultConfig,
}

/// Overrides for where scans and the survey come from
#[derive(Args)]
struct SourceArgs {
    /// Access point survey file
    #[arg(long)]
    survey: Option<String>,

    /// Scan backend
    #[arg(long, value_enum)]
    scanner: Option<ScannerBackend>,

    /// Wireless interface for the iw backend
    #[arg(long)]
    interface: Option<String>,

    /// Recorded scan file for the replay backend
    #[arg(long)]
    replay: Option<String>,

    /// Only consider access points broadcasting this SSID
    #[arg(long)]
    ssid: Option<String>,

    /// Floor plan width in pixels
    #[arg(long)]
    width: Option<f64>,

    /// Floor plan height in pixels
    #[arg(long)]
    height: Option<f64>,
}

#[derive(Args)]
struct LocateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Milliseconds between ticks
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Scan passes per tick
    #[arg(long)]
    passes: Option<usize>,

    /// Emit one JSON object per tick instead of text
    #[arg(long)]
    json: bool,

    /// List every contributing access point under each text line
    #[arg(short, long)]
    verbose: bool,
}

impl SourceArgs {
    fn apply(&self, config: &mut LocatorConfig) {
        if let Some(survey) = &self.survey {
            config.survey_path = survey.clone();
        }
        if let Some(backend) = self.scanner {
            config.scanner.backend = backend;
        }
        if let Some(interface) = &self.interface {
            config.scanner.interface = interface.clone();
        }
        if let Some(replay) = &self.replay {
            config.scanner.replay_path = Some(replay.clone());
        }
        if let Some(ssid) = &self.ssid {
            config.ssid_filter = Some(ssid.clone());
        }
        if let Some(width) = self.width {
            config.image.width = width;
        }
        if let Some(height) = self.height {
            config.image.height = height;
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<LocatorConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(LocatorConfig::load_from_file(path)?),
        None => Ok(LocatorConfig::default()),
    }
}

fn locate(config: &LocatorConfig, args: &LocateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let registry = ApRegistry::load(&config.survey_path)?;
    if registry.is_empty() {
        warn!(survey = %config.survey_path, "survey has no access points, no position can be estimated");
    }

    let scanner = build_scanner(&config.scanner, &registry)?;
    let sink: Box<dyn PositionSink> = if args.json {
        Box::new(JsonLinesSink::new(std::io::stdout()))
    } else {
        Box::new(TextSink::new(std::io::stdout()).verbose(args.verbose))
    };

    info!(
        survey = %config.survey_path,
        access_points = registry.len(),
        model = config.signal_model.name(),
        passes = config.passes,
        "starting locator"
    );

    let mut refresh = RefreshLoop::from_config(config, &registry, scanner, sink);
    refresh.run(&AtomicBool::new(false));
    Ok(())
}

fn scan(config: &LocatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = ApRegistry::load(&config.survey_path)?;
    let mut scanner = build_scanner(&config.scanner, &registry)?;
    let filter = ScanAggregator::new(1).with_ssid_filter(config.ssid_filter.clone());

    let samples: Vec<_> = scanner
        .scan_once()?
        .into_iter()
        .filter(|s| filter.accepts(s))
        .collect();

    // Range estimates need a path-loss model even when positioning uses the linear one
    let model = match config.signal_model {
        SignalModel::LinearShift { .. } => SignalModel::log_distance(),
        model => model,
    };

    let ranked = rank_by_signal(samples, &model);
    if ranked.is_empty() {
        println!("No access points found");
        return Ok(());
    }

    println!("{:<20} {:<24} {:>8} {:>10}  surveyed", "access point", "ssid", "rssi", "distance");
    for reading in &ranked {
        let distance = reading
            .distance_m
            .map(|d| format!("{:.1} m", d))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:<24} {:>4} dBm {:>10}  {}",
            reading.sample.ap,
            reading.sample.ssid.as_deref().unwrap_or(""),
            reading.sample.rssi,
            distance,
            if registry.contains(&reading.sample.ap) { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn check_survey(config: &LocatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(&config.survey_path).exists() {
        return Err(format!("survey file not found: {}", config.survey_path).into());
    }

    let registry = ApRegistry::load(&config.survey_path)?;
    println!(
        "{}: {} access point(s) on a {}x{} floor plan",
        config.survey_path,
        registry.len(),
        config.image.width,
        config.image.height
    );
    for record in registry.records() {
        let pixel = config.image.scale(record.x, record.y);
        println!("  {:<20} ({:.1}, {:.1})", record.label, pixel.x, pixel.y);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Locate(args) => {
            args.source.apply(&mut config);
            if let Some(ticks) = args.ticks {
                config.max_ticks = Some(ticks);
            }
            if let Some(interval_ms) = args.interval_ms {
                config.refresh_interval_ms = interval_ms;
            }
            if let Some(passes) = args.passes {
                config.passes = passes;
            }
        }
        Command::Scan(args) | Command::CheckSurvey(args) => args.apply(&mut config),
        Command::DefaultConfig => {
            println!("{}", LocatorConfig::default().to_json()?);
            return Ok(());
        }
    }

    config.validate()?;
    init_tracing(cli.log_level.unwrap_or(config.log_level));

    match &cli.command {
        Command::Locate(args) => locate(&config, args),
        Command::Scan(_) => scan(&config),
        Command::CheckSurvey(_) => check_survey(&config),
        Command::DefaultConfig => Ok(()),
    }
}
