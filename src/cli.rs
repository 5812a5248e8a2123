//! The command line interface for the simulation.
use crate::input::load_simulation_input;
use crate::log;
use crate::output::{create_output_directory, get_output_dir, write_results};
use crate::portfolio::{DEFAULT_PORTFOLIO_NAME, Portfolio};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub mod demo;
use demo::DemoSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the simulation.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Where to find the rate tables
#[derive(Args, Default)]
pub struct RateTableOpts {
    /// Support rate table (CSV or YAML)
    #[arg(long)]
    pub support_rates: Option<PathBuf>,
    /// Full cost recovery rate table (CSV or YAML)
    #[arg(long)]
    pub fcr_rates: Option<PathBuf>,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Number of steps (months) to simulate
    #[arg(short, long)]
    pub steps: Option<u32>,
    /// Rate tables
    #[command(flatten)]
    pub rate_tables: RateTableOpts,
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a simulation.
    Run {
        /// Path to the configuration file.
        config_path: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage demo configurations.
    Demo {
        /// The available subcommands for managing demos.
        #[command(subcommand)]
        subcommand: DemoSubcommands,
    },
    /// Validate a configuration.
    Validate {
        /// The path to the configuration file.
        config_path: PathBuf,
        /// Rate tables
        #[command(flatten)]
        rate_tables: RateTableOpts,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { config_path, opts } => handle_run_command(&config_path, &opts, None),
            Self::Demo { subcommand } => subcommand.execute(),
            Self::Validate {
                config_path,
                rate_tables,
            } => handle_validate_command(&config_path, &rate_tables, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ projectsim --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // No command given: show help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    config_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(config_path)?;
        &pathbuf
    };

    let overwrite = create_output_directory(output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(Some(&settings.log_level), Some(output_path))
        .context("Failed to initialise logging.")?;

    // Load the configuration
    let input = load_simulation_input(
        config_path,
        opts.rate_tables.support_rates.as_deref(),
        opts.rate_tables.fcr_rates.as_deref(),
    )
    .context("Failed to load configuration.")?;
    info!("Loaded configuration from {}", config_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    // Run the simulation
    let steps = opts.steps.unwrap_or(settings.steps);
    let mut portfolio = Portfolio::new(DEFAULT_PORTFOLIO_NAME, Rc::new(input.assumptions));
    portfolio.set_portfolio(input.events);
    portfolio.run(steps).context("Simulation failed.")?;
    write_results(&portfolio, output_path)?;
    info!("Simulation complete!");

    Ok(())
}

/// Handle the `validate` command.
///
/// Every project is created (but not run), so policy configurations are checked too.
pub fn handle_validate_command(
    config_path: &Path,
    rate_tables: &RateTableOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    let input = load_simulation_input(
        config_path,
        rate_tables.support_rates.as_deref(),
        rate_tables.fcr_rates.as_deref(),
    )
    .context("Failed to validate configuration.")?;

    let mut portfolio = Portfolio::new(DEFAULT_PORTFOLIO_NAME, Rc::new(input.assumptions));
    for event in input.events {
        portfolio
            .create_project(event)
            .context("Failed to validate configuration.")?;
    }
    info!("Configuration validation successful!");

    Ok(())
}
