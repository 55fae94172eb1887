pub mod commands;
pub mod session;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lapprice_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "lapprice",
    about = "Laptop price estimator CLI",
    long_about = "Estimate laptop prices from a selection of specs, compare against a budget, and \
                  suggest cheaper alternatives drawn from the reference catalog.",
    after_help = "Examples:\n  lapprice domains\n  lapprice predict --spec Company=Apple --spec RAM=16GB --budget 1500\n  lapprice suggest --spec Processor='Intel Core i7' --budget 900\n  lapprice doctor --json"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Args)]
struct GlobalArgs {
    #[arg(long, global = true, help = "Path to a lapprice.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the reference catalog CSV path")]
    catalog: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the feature schema JSON path")]
    schema: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the model artifact JSON path")]
    model: Option<PathBuf>,
    #[arg(long, global = true, help = "Currency label used when rendering prices")]
    currency: Option<String>,
    #[arg(long, global = true, help = "Log level written to stderr")]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List the selectable values for every schema attribute")]
    Domains,
    #[command(about = "Estimate the price of a selection and compare it to an optional budget")]
    Predict {
        #[arg(long = "spec", value_name = "ATTRIBUTE=VALUE", help = "One selected attribute value")]
        specs: Vec<String>,
        #[arg(long, help = "Budget in the configured currency; zero or absent means no budget")]
        budget: Option<f64>,
    },
    #[command(about = "Suggest downgrades for a selection that exceeds the budget")]
    Suggest {
        #[arg(long = "spec", value_name = "ATTRIBUTE=VALUE", help = "One selected attribute value")]
        specs: Vec<String>,
        #[arg(long, help = "Budget in the configured currency")]
        budget: f64,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and startup artifacts")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl GlobalArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                catalog_path: self.catalog.clone(),
                schema_path: self.schema.clone(),
                model_path: self.model.clone(),
                currency: self.currency.clone(),
                log_level: self.log_level.clone(),
                log_format: None,
            },
        }
    }
}

/// Installs the stderr subscriber. Stdout carries command output only.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(error) = installed {
        eprintln!("logging already initialized: {error}");
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.global.load_options();

    // Config errors are reported by the command itself.
    let loaded = AppConfig::load(options.clone());
    if let Ok(config) = &loaded {
        init_logging(config);
    }

    let result = match cli.command {
        Command::Domains => commands::domains::run(loaded),
        Command::Predict { specs, budget } => commands::predict::run(loaded, &specs, budget),
        Command::Suggest { specs, budget } => commands::suggest::run(loaded, &specs, budget),
        Command::Config => commands::config::run(&options, loaded),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(loaded, json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
