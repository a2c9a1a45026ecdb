use clap::{Parser, Subcommand};
use hp_controls::{
    BoardConfig, ChannelMeasurement, ControlError, DividerReading, HotplateBoard, IterationRecord,
};
use hp_core::{Channel, ChannelMap};
use hp_sim::{HotplateParams, SimBoard, SimError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),
}

type CliResult<T> = Result<T, CliError>;

/// Board and simulator settings, as loaded from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CliConfig {
    board: BoardConfig,
    /// Simulated hotplates; ENS145 defaults when omitted.
    plant: Option<ChannelMap<HotplateParams>>,
}

#[derive(Parser)]
#[command(name = "hp-cli")]
#[command(about = "Hotplate CLI - heater regulation and resistance measurement on a simulated board", long_about = None)]
struct Cli {
    /// Path to a YAML board configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regulate one heater and print every step
    Regulate {
        /// Hotplate (hp1 or hp3)
        channel: Channel,
        /// Target heater voltage in mV (0 switches the heater off)
        target_mv: u16,
    },
    /// Regulate the given heaters, then run one measurement cycle
    Cycle {
        /// HP1 target heater voltage in mV
        #[arg(long)]
        hp1: Option<u16>,
        /// HP3 target heater voltage in mV
        #[arg(long)]
        hp3: Option<u16>,
    },
    /// Print the effective configuration as YAML
    ShowConfig,
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Regulate { channel, target_mv } => cmd_regulate(config, channel, target_mv),
        Commands::Cycle { hp1, hp3 } => cmd_cycle(config, ChannelMap::new(hp1, hp3)),
        Commands::ShowConfig => cmd_show_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let content = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: CliConfig = serde_yaml::from_str(&content)?;
    config.board.validate()?;
    info!(path = %path.display(), "loaded board configuration");
    Ok(config)
}

fn open_board(config: CliConfig) -> CliResult<HotplateBoard<SimBoard>> {
    let plants = config.plant.unwrap_or_else(SimBoard::ens145_plants);
    let sim = SimBoard::new(config.board.clone(), plants)?;
    let mut board = HotplateBoard::new(sim, config.board)?;
    board.begin()?;
    Ok(board)
}

fn cmd_regulate(config: CliConfig, channel: Channel, target_mv: u16) -> CliResult<()> {
    println!("Regulating {} to {} mV", channel, target_mv);
    let mut board = open_board(config)?;

    let report = board.regulate_traced(channel, target_mv, print_step)?;

    println!("✓ {} {}", channel, board.state(channel).regulation_state());
    println!("  Iterations: {}", report.iterations);
    println!("  Commanded:  {} mV", report.commanded_mv);
    println!("  Measured:   {} mV", report.last_measured_mv);
    if let Some(converged) = report.converged {
        println!("  Converged:  {}", converged);
    }
    println!(
        "  Plate rise: {:.1} K (simulated, {:.3} s elapsed)",
        board.hardware().plant(channel).rise_k(),
        board.hardware().elapsed_s()
    );
    Ok(())
}

fn print_step(rec: &IterationRecord) {
    println!(
        "  [{}] commanded {:>4} mV (code {:>4}{}) -> heater {:>4} mV, next {:>4} mV",
        rec.iteration,
        rec.commanded_mv,
        rec.code,
        if rec.write_ok { "" } else { ", write failed" },
        rec.measured_mv,
        rec.next_commanded_mv
    );
}

fn cmd_cycle(config: CliConfig, targets: ChannelMap<Option<u16>>) -> CliResult<()> {
    let mut board = open_board(config)?;

    for (channel, target) in targets.iter() {
        if let Some(target_mv) = *target {
            let report = board.regulate(channel, target_mv)?;
            println!(
                "✓ {} regulated: {} mV commanded, {} mV at heater",
                channel, report.commanded_mv, report.last_measured_mv
            );
        }
    }

    let report = board.run_cycle();
    println!("Measurement cycle:");
    for (channel, measurement) in report.channels.iter() {
        print_measurement(channel, measurement);
    }

    if report.is_ok() {
        println!("✓ All measurements succeeded");
    } else {
        println!("✗ Some measurements failed");
    }
    Ok(())
}

fn print_measurement(channel: Channel, m: &ChannelMeasurement) {
    let fmt = |r: &Result<DividerReading, ControlError>| match r {
        Ok(r) => format!("{:>4} mV, {:>12.1} Ω", r.node_mv, r.ohm),
        Err(e) => format!("failed: {}", e),
    };
    println!("  {} heater: {}", channel, fmt(&m.heater));
    println!("  {} sensor: {}", channel, fmt(&m.sensor));
}

fn cmd_show_config(config: &CliConfig) -> CliResult<()> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
