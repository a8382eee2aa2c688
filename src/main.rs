//! @ai:module:intent CLI entry point for the Doxygen to LOBSTER converter
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on converter, config, output

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use lobster_doxygen::{converter, output, Config, Error, OutputFormat, RuleConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lobster-doxygen")]
#[command(author, version, about = "Convert a Doxygen tree into a LOBSTER implementation trace")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    convert: ConvertArgs,
}

#[derive(Args)]
struct ConvertArgs {
    /// Doxygen tree as a JSON file or a directory of JSON files
    input: Option<PathBuf>,

    /// Output LOBSTER file
    #[arg(short, long, default_value = "lobster.json")]
    output: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Treat file-level and nested tags as errors
    #[arg(long)]
    strict: bool,

    /// Convert and report without writing the output file
    #[arg(long)]
    check: bool,

    /// Add doxygen group membership to each record
    #[arg(long)]
    include_groups: bool,

    /// Leave the status field out of each record
    #[arg(long)]
    no_status: bool,

    /// Report format
    #[arg(long, short, value_enum, default_value = "text")]
    format: Format,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    InitConfig {
        /// Path of the configuration file
        #[arg(short, long, default_value = "lobster-doxygen.toml")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.convert.verbose);

    let result = match cli.command {
        Some(Commands::InitConfig { output }) => init_config(&output),
        None => run(cli.convert),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            match e.downcast_ref::<Error>() {
                Some(Error::InputNotFound(_)) => ExitCode::from(3),
                _ => ExitCode::from(1),
            }
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lobster_doxygen={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: ConvertArgs) -> anyhow::Result<ExitCode> {
    let Some(input) = args.input else {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "the INPUT argument is required unless a subcommand is given",
            )
            .exit();
    };

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => Config::default(),
    };

    if args.strict {
        config.rules = RuleConfig::strict();
    }
    if args.include_groups {
        config.output.include_groups = true;
    }
    if args.no_status {
        config.output.include_status = false;
    }

    let conversion = converter::convert_path(&input, &config)?;

    let written = if args.check {
        None
    } else {
        conversion.write(&args.output)?;
        Some(args.output.display().to_string())
    };

    println!(
        "{}",
        output::format_report(&conversion, written.as_deref(), args.format.into())
    );

    Ok(ExitCode::SUCCESS)
}

fn init_config(path: &Path) -> anyhow::Result<ExitCode> {
    Config::default().save(path)?;
    println!(
        "{} Wrote default configuration to {}",
        "OK".green().bold(),
        path.display()
    );
    Ok(ExitCode::SUCCESS)
}
