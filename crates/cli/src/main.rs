// Armature - Guest CPU Front End
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

use armature_config::{DecodeManifest, GuestMode, ImageFormat, OutputFormat, Strategy};
use armature_core::report::{CfgReport, DecodeStrategy};
use armature_core::{DecodeError, DecodeMetrics, Decoder, ExecutionMode};
use armature_loader::LoadedImage;

const EXIT_PASS: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_DECODE_ERROR: u8 = 3;

fn parse_u64_addr(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex address '{}': {}", s, e))
    } else {
        u64::from_str(trimmed).map_err(|e| format!("Invalid address '{}': {}", s, e))
    }
}

fn parse_mode(s: &str) -> Result<GuestMode, String> {
    GuestMode::from_str(s).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Armature ARM guest code decoder",
    long_about = None
)]
struct Cli {
    /// Log every decoded instruction and block
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode one block or one subroutine from an image.
    Decode(DecodeArgs),

    /// Decode every target listed in a manifest (YAML).
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// ELF file, or a flat binary when --raw-base is given
    #[arg(short, long)]
    image: PathBuf,

    /// Treat the image as a flat binary loaded at this address
    #[arg(long, value_parser = parse_u64_addr)]
    raw_base: Option<u64>,

    /// Instruction set: a64, a32 or thumb. Required for raw images.
    #[arg(short, long, value_parser = parse_mode)]
    mode: Option<GuestMode>,

    /// Address to start decoding at (default: the image entry point)
    #[arg(short, long, value_parser = parse_u64_addr, conflicts_with = "symbol")]
    entry: Option<u64>,

    /// Function symbol to start decoding at
    #[arg(short, long)]
    symbol: Option<String>,

    /// Decode a single basic block instead of the whole subroutine
    #[arg(long)]
    block: bool,

    /// Print the CFG as JSON
    #[arg(long)]
    json: bool,

    /// Log decode statistics when done
    #[arg(long)]
    stats: bool,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the decode manifest (YAML)
    #[arg(short, long)]
    manifest: PathBuf,
}

/// Why a command gave up, mapped onto the exit code.
#[derive(Debug)]
enum Failure {
    Config(anyhow::Error),
    Decode(DecodeError),
}

impl From<anyhow::Error> for Failure {
    fn from(e: anyhow::Error) -> Self {
        Failure::Config(e)
    }
}

impl Failure {
    fn exit_code(self) -> ExitCode {
        match self {
            Failure::Config(e) => {
                error!("{:#}", e);
                ExitCode::from(EXIT_CONFIG_ERROR)
            }
            Failure::Decode(e) => {
                error!("Decode failed: {}", e);
                ExitCode::from(EXIT_DECODE_ERROR)
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level based on --trace flag
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match cli.command {
        Commands::Decode(args) => run_decode(args),
        Commands::Run(args) => run_manifest(args),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_PASS),
        Err(failure) => failure.exit_code(),
    }
}

fn run_decode(args: DecodeArgs) -> Result<(), Failure> {
    let mode_override = args.mode.map(ExecutionMode::from);

    let loaded = match args.raw_base {
        Some(base) => {
            let mode = mode_override.context("Raw images need an explicit --mode")?;
            armature_loader::load_raw(&args.image, base, mode)?
        }
        None => armature_loader::load_elf(&args.image)?,
    };

    let strategy = if args.block {
        DecodeStrategy::Block
    } else {
        DecodeStrategy::Function
    };

    let metrics = Arc::new(DecodeMetrics::new());
    let report = decode_target(
        &loaded,
        mode_override,
        args.entry,
        args.symbol.as_deref(),
        strategy,
        &metrics,
    )?;

    print_reports(&[report], args.json)?;

    if args.stats {
        report_metrics(&metrics);
    }
    Ok(())
}

fn run_manifest(args: RunArgs) -> Result<(), Failure> {
    let manifest = DecodeManifest::from_file(&args.manifest)?;
    let manifest_dir = args.manifest.parent().unwrap_or(Path::new("."));
    let image_path = manifest.image_path(manifest_dir);

    info!("Manifest: {:?}", args.manifest);
    info!("Image: {:?}", image_path);

    armature_loader::check_size(&image_path, manifest.image.max_size_bytes()?)?;

    let mode_override = manifest.mode.map(ExecutionMode::from);
    let loaded = match manifest.image.format {
        ImageFormat::Elf => armature_loader::load_elf(&image_path)?,
        ImageFormat::Raw => {
            // validate() guarantees a mode for raw images
            let mode = mode_override.context("Raw images need an explicit 'mode'")?;
            let base = manifest.image.load_address.unwrap_or(0);
            armature_loader::load_raw(&image_path, base, mode)?
        }
    };

    let metrics = Arc::new(DecodeMetrics::new());
    let mut reports = Vec::with_capacity(manifest.targets.len());
    for target in &manifest.targets {
        info!("Decoding target {}", target.label());
        let strategy = match target.strategy {
            Strategy::Function => DecodeStrategy::Function,
            Strategy::Block => DecodeStrategy::Block,
        };
        reports.push(decode_target(
            &loaded,
            mode_override,
            target.entry,
            target.symbol.as_deref(),
            strategy,
            &metrics,
        )?);
    }

    print_reports(&reports, manifest.output.format == OutputFormat::Json)?;
    report_metrics(&metrics);
    Ok(())
}

fn decode_target(
    loaded: &LoadedImage,
    mode_override: Option<ExecutionMode>,
    entry: Option<u64>,
    symbol: Option<&str>,
    strategy: DecodeStrategy,
    metrics: &Arc<DecodeMetrics>,
) -> Result<CfgReport, Failure> {
    let (address, symbol_mode) = match symbol {
        Some(name) => {
            let sym = loaded
                .resolve_symbol(name)
                .with_context(|| format!("Function symbol '{}' not found in image", name))?;
            (sym.address, loaded.mode_for(sym))
        }
        None => (entry.unwrap_or(loaded.entry_point()), loaded.mode()),
    };
    let mode = mode_override.unwrap_or(symbol_mode);

    info!("Decoding {:#x} as {} ({:?})", address, mode, strategy);

    let mut decoder = Decoder::new(mode);
    decoder.add_observer(metrics.clone());

    let blocks = match strategy {
        DecodeStrategy::Block => decoder.decode_basic_block(&loaded.image, address),
        DecodeStrategy::Function => decoder.decode_function(&loaded.image, address),
    }
    .map_err(Failure::Decode)?;

    let report = CfgReport::new(address, mode, strategy, &blocks);
    Ok(match symbol {
        Some(name) => report.with_symbol(name),
        None => report,
    })
}

fn print_reports(reports: &[CfgReport], json: bool) -> anyhow::Result<()> {
    if json {
        let out = serde_json::to_string_pretty(reports).context("Failed to serialize CFG")?;
        println!("{}", out);
    } else {
        for report in reports {
            println!("{}", report);
        }
    }
    Ok(())
}

fn report_metrics(metrics: &DecodeMetrics) {
    info!("Decode finished.");
    info!("Total Instructions: {}", metrics.get_instructions());
    info!("Undefined Encodings: {}", metrics.get_undefined());
    info!("Blocks: {} ({} splits)", metrics.get_blocks(), metrics.get_splits());
    for (name, count) in metrics.top_names(5) {
        info!("  {:<8} {}", name.to_string(), count);
    }
    info!("Average IPS: {:.2}", metrics.get_ips());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_u64_addr() {
        assert_eq!(parse_u64_addr("0x80000000"), Ok(0x8000_0000));
        assert_eq!(parse_u64_addr(" 4096 "), Ok(4096));
        assert_eq!(parse_u64_addr("0XFFFF0000FFFF0000"), Ok(0xFFFF_0000_FFFF_0000));
        assert!(parse_u64_addr("0xZZ").is_err());
        assert!(parse_u64_addr("main").is_err());
    }

    #[test]
    fn test_entry_conflicts_with_symbol() {
        let parsed = Cli::try_parse_from([
            "armature", "decode", "--image", "a.elf", "--entry", "0x10", "--symbol", "main",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_decode_args() {
        let cli = Cli::try_parse_from([
            "armature", "--trace", "decode", "-i", "a.bin", "--raw-base", "0x8000", "-m", "t16",
            "--block", "--json",
        ])
        .unwrap();

        assert!(cli.trace);
        let Commands::Decode(args) = cli.command else {
            panic!("expected decode");
        };
        assert_eq!(args.raw_base, Some(0x8000));
        assert_eq!(args.mode, Some(GuestMode::Thumb));
        assert!(args.block && args.json);
        assert_eq!(args.entry, None);
    }

    #[test]
    fn test_decode_target_resolves_symbols_and_modes() {
        // MOVS R0, #1; BX LR, with padding for the trailing fetch
        let bytes = [0x01, 0x20, 0x70, 0x47, 0x00, 0x00].to_vec();
        let mut loaded =
            armature_loader::load_raw_bytes(bytes, 0x8000, ExecutionMode::Aarch32Arm);
        loaded.symbols.insert(
            "thumb_fn".to_string(),
            armature_loader::FunctionSymbol {
                address: 0x8000,
                thumb: true,
            },
        );
        let metrics = Arc::new(DecodeMetrics::new());

        let report = decode_target(
            &loaded,
            None,
            None,
            Some("thumb_fn"),
            DecodeStrategy::Function,
            &metrics,
        )
        .unwrap();
        assert_eq!(report.mode, ExecutionMode::Aarch32Thumb);
        assert_eq!(report.symbol.as_deref(), Some("thumb_fn"));
        assert_eq!(report.instruction_count(), 2);
        assert_eq!(metrics.get_instructions(), 2);

        let missing = decode_target(
            &loaded,
            None,
            None,
            Some("nope"),
            DecodeStrategy::Block,
            &metrics,
        );
        assert!(matches!(missing, Err(Failure::Config(_))));

        let unmapped = decode_target(
            &loaded,
            None,
            Some(0x10),
            None,
            DecodeStrategy::Block,
            &metrics,
        );
        assert!(matches!(unmapped, Err(Failure::Decode(DecodeError::Memory(_)))));
    }
}
