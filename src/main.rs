use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ssvep_extract::local::{
    metadata_path, read_tensor_csv, write_metadata, write_tensor_csv, TensorMetadata,
};
use ssvep_extract::{
    load_config, save_config, DatasetInfo, ExtractError, ExtractionConfig, ExtractionDriver,
    SyntheticProcessor,
};

mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const INPUT_ERROR: i32 = 2;
    pub const EXTRACTION_ERROR: i32 = 3;
    pub const OUTPUT_ERROR: i32 = 4;
}

#[derive(Parser)]
#[command(
    name = "ssvep-extract",
    version,
    about = "Extract SSVEP block recordings into a (channel, sample, frequency, block) tensor"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run the extraction against the synthetic signal processor
    Extract(ExtractArgs),
    /// Print the recording path and event labels of every block
    Plan(PlanArgs),
    /// Summarise a tensor CSV
    Inspect(InspectArgs),
    /// Write the default configuration
    InitConfig(InitConfigArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// YAML configuration (defaults apply when omitted)
    #[arg(short, long, env = "SSVEP_EXTRACT_CONFIG")]
    config: Option<PathBuf>,

    /// Output tensor CSV; metadata is written next to it as <name>.meta.yaml
    #[arg(short, long)]
    output: PathBuf,

    /// Process blocks concurrently
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override the synthetic noise seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct PlanArgs {
    #[arg(short, long, env = "SSVEP_EXTRACT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct InspectArgs {
    /// Tensor CSV written by `extract`
    input: PathBuf,
}

#[derive(Args)]
struct InitConfigArgs {
    #[arg(short, long)]
    output: PathBuf,
}

fn resolve_config(path: Option<&Path>) -> Result<ExtractionConfig, ExtractError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(ExtractionConfig::default()),
    }
}

fn extract(args: ExtractArgs) -> i32 {
    let mut config = match resolve_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return exit_codes::INPUT_ERROR;
        }
    };
    if let Some(seed) = args.seed {
        config.synthetic.seed = seed;
    }

    let processor = SyntheticProcessor::from_config(&config);
    let driver = match ExtractionDriver::new(processor, config) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return exit_codes::INPUT_ERROR;
        }
    };

    let start = Instant::now();
    let result = if args.parallel {
        driver.run_parallel()
    } else {
        driver.run()
    };
    let tensor = match result {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{} {}", "Extraction failed:".red().bold(), e);
            return exit_codes::EXTRACTION_ERROR;
        }
    };
    log::info!("extraction finished in {:?}", start.elapsed());

    let metadata = TensorMetadata::new(&tensor, driver.config());
    let written = write_tensor_csv(&args.output, &tensor)
        .and_then(|_| write_metadata(metadata_path(&args.output), &metadata));
    if let Err(e) = written {
        eprintln!("{} {}", "Could not write output:".red().bold(), e);
        return exit_codes::OUTPUT_ERROR;
    }

    println!(
        "{} tensor {:?} -> {}",
        "Extracted".green().bold(),
        tensor.shape(),
        args.output.display()
    );
    exit_codes::SUCCESS
}

fn plan(args: PlanArgs) -> i32 {
    let config = match resolve_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return exit_codes::INPUT_ERROR;
        }
    };
    let info = DatasetInfo::from_config(&config);
    let processor = SyntheticProcessor::from_config(&config);
    let driver = match ExtractionDriver::new(processor, config) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return exit_codes::INPUT_ERROR;
        }
    };

    for block in driver.plan() {
        println!(
            "{} {}",
            format!("block {}", block.block).cyan().bold(),
            block.path.display()
        );
        for (label, hz) in block.labels.iter().zip(&info.frequencies) {
            println!("    {:<16} {} Hz", label, hz);
        }
    }
    println!(
        "reference channel {}, {} channels: {}",
        driver.config().reference_channel,
        info.channels.len(),
        info.channels.join(" ")
    );
    exit_codes::SUCCESS
}

fn inspect(args: InspectArgs) -> i32 {
    let tensor = match read_tensor_csv(&args.input) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return exit_codes::INPUT_ERROR;
        }
    };

    let (channels, samples, frequencies, blocks) = tensor.shape();
    println!(
        "{} channels={} samples={} frequencies={} blocks={}",
        "shape".bold(),
        channels,
        samples,
        frequencies,
        blocks
    );
    for block in 0..blocks {
        let mean = tensor.block_mean(block).unwrap_or(f64::NAN);
        println!("  block {}: mean {:.6}", block + 1, mean);
    }

    let meta = metadata_path(&args.input);
    if meta.exists() {
        match ssvep_extract::local::read_metadata(&meta) {
            Ok(m) => println!("  created {}", m.created_at.to_rfc3339()),
            Err(e) => log::warn!("could not read {}: {}", meta.display(), e),
        }
    }
    exit_codes::SUCCESS
}

fn init_config(args: InitConfigArgs) -> i32 {
    match save_config(&ExtractionConfig::default(), &args.output) {
        Ok(()) => {
            println!("{} {}", "Wrote".green().bold(), args.output.display());
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            exit_codes::OUTPUT_ERROR
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let exit_code = match cli.command {
        Command::Extract(args) => extract(args),
        Command::Plan(args) => plan(args),
        Command::Inspect(args) => inspect(args),
        Command::InitConfig(args) => init_config(args),
    };

    std::process::exit(exit_code);
}
