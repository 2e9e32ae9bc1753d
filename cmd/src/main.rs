mod blocks;
mod info;

use std::fs::File;
use std::io::{stderr, stdin, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sl2::{Config, FlagFilter, SpeedUnit};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode blocks and print them as JSON, one object per line.
    Blocks {
        /// Input sonar log, or - for stdin.
        input: PathBuf,

        #[command(flatten)]
        decode: DecodeArgs,

        /// Stop after this many blocks.
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show a summary of a sonar log.
    Info {
        /// Input sonar log, or - for stdin.
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,
    },
}

#[derive(clap::Args)]
struct DecodeArgs {
    /// Convert depths, limits and altitude from feet to meters.
    #[arg(long)]
    feet_to_meters: bool,

    /// Convert course over ground from radians to degrees.
    #[arg(long)]
    rad_to_deg: bool,

    /// Unit for water and GPS speeds: kts, kmh, mph or ms.
    #[arg(long, default_value = "kts")]
    speed_unit: SpeedUnit,

    /// Convert longitude and latitude to degrees.
    #[arg(long)]
    convert_projection: bool,

    /// Include a hex dump of each block header.
    #[arg(long)]
    raw_header: bool,

    /// Only output blocks with this flag value, e.g. positionValid=true. May be
    /// repeated, in which case all must match.
    #[arg(long = "flag", value_name = "NAME=BOOL", value_parser = parse_flag)]
    flags: Vec<(String, bool)>,
}

impl DecodeArgs {
    fn config(&self) -> Config {
        let config = Config::builder()
            .feet_to_meters(self.feet_to_meters)
            .rad_to_deg(self.rad_to_deg)
            .speed_unit(self.speed_unit)
            .convert_projection(self.convert_projection)
            .raw_header(self.raw_header);
        if self.flags.is_empty() {
            config.build()
        } else {
            config
                .flag_filter(self.flags.iter().cloned().collect::<FlagFilter>())
                .build()
        }
    }
}

fn parse_flag(s: &str) -> Result<(String, bool), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=BOOL, got {s:?}"))?;
    if sl2::Flags::default().get(name).is_none() {
        return Err(format!(
            "unknown flag {name:?}; expected one of {}",
            sl2::Flags::NAMES.join(", ")
        ));
    }
    let value = value
        .parse::<bool>()
        .map_err(|_| format!("invalid value {value:?} for {name}; expected true or false"))?;
    Ok((name.to_string(), value))
}

fn open(input: &Path) -> Result<Box<dyn Read>> {
    if input == Path::new("-") {
        return Ok(Box::new(stdin().lock()));
    }
    let file = File::open(input).with_context(|| format!("opening {input:?}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("SL2_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Blocks {
            input,
            decode,
            limit,
        } => blocks::blocks(open(input)?, decode.config(), *limit),
        Commands::Info { input, format } => info::info(input, open(input)?, format),
    }
}
