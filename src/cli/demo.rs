//! The bundled demo configurations and the CLI commands for working with them.
use super::{RateTableOpts, RunOpts, handle_run_command};
use crate::output::get_output_dir;
use crate::settings::Settings;
use anyhow::{Context, Result, bail, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The directory containing the demos.
static DEMOS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/demos");

/// The configuration file every demo contains
const DEMO_CONFIG_FILE_NAME: &str = "portfolio.yaml";

/// Support rate table, if the demo has one
const DEMO_SUPPORT_RATES_FILE_NAME: &str = "support_rates.csv";

/// FCR rate table, if the demo has one
const DEMO_FCR_RATES_FILE_NAME: &str = "fcr_rates.csv";

/// The available subcommands for managing demos.
#[derive(Subcommand)]
pub enum DemoSubcommands {
    /// List available demos.
    List,
    /// Provide information about the specified demo.
    Info {
        /// The name of the demo.
        name: String,
    },
    /// Extract a demo's files to a new directory.
    Extract {
        /// The name of the demo to extract.
        name: String,
        /// The destination folder for the demo.
        new_path: Option<PathBuf>,
    },
    /// Run a demo.
    Run {
        /// The name of the demo to run.
        name: String,
        /// Number of steps (months) to simulate
        #[arg(short, long)]
        steps: Option<u32>,
        /// Directory for output files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Whether to overwrite the output directory if it already exists
        #[arg(long)]
        overwrite: bool,
    },
}

impl DemoSubcommands {
    /// Execute the supplied demo subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => handle_demo_list_command(),
            Self::Info { name } => handle_demo_info_command(&name)?,
            Self::Extract {
                name,
                new_path: dest,
            } => handle_demo_extract_command(&name, dest.as_deref())?,
            Self::Run {
                name,
                steps,
                output_dir,
                overwrite,
            } => {
                let opts = RunOpts {
                    steps,
                    output_dir,
                    overwrite,
                    ..RunOpts::default()
                };
                handle_demo_run_command(&name, opts, None)?;
            }
        }

        Ok(())
    }
}

/// Names of the bundled demos
pub fn demo_names() -> impl Iterator<Item = &'static str> {
    DEMOS_DIR
        .dirs()
        .filter_map(|dir| dir.path().file_name()?.to_str())
}

/// Handle the `demo list` command.
fn handle_demo_list_command() {
    for name in demo_names() {
        println!("{name}");
    }
}

/// Handle the `demo info` command.
fn handle_demo_info_command(name: &str) -> Result<()> {
    let path: PathBuf = [name, "README.txt"].iter().collect();
    let readme = DEMOS_DIR
        .get_file(path)
        .context("Demo not found.")?
        .contents_utf8()
        .context("README.txt is not UTF-8 encoded")?;

    println!("{readme}");

    Ok(())
}

/// Handle the `demo extract` command
fn handle_demo_extract_command(name: &str, dest: Option<&Path>) -> Result<()> {
    let dest = dest.unwrap_or(Path::new(name));
    extract_demo(name, dest)
}

/// Extract the specified demo to a new directory
fn extract_demo(name: &str, new_path: &Path) -> Result<()> {
    let sub_dir = DEMOS_DIR.get_dir(name).context("Demo not found.")?;

    ensure!(
        !new_path.exists(),
        "Destination directory {} already exists",
        new_path.display()
    );

    // Copy the contents of the subdirectory to the destination
    fs::create_dir(new_path)?;
    for entry in sub_dir.entries() {
        match entry {
            DirEntry::Dir(_) => bail!("Subdirectories in demos are not supported"),
            DirEntry::File(f) => {
                let file_name = f
                    .path()
                    .file_name()
                    .context("Demo file has no file name")?;
                fs::write(new_path.join(file_name), f.contents())?;
            }
        }
    }

    Ok(())
}

/// Handle the `demo run` command.
///
/// The demo is extracted to a temporary folder and run with whichever rate tables it includes.
/// Unless an output folder is given, results go in a folder named after the demo.
pub fn handle_demo_run_command(
    name: &str,
    mut opts: RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let demo_path = temp_dir.path().join(name);
    extract_demo(name, &demo_path)?;

    let existing = |file_name: &str| Some(demo_path.join(file_name)).filter(|path| path.is_file());
    opts.rate_tables = RateTableOpts {
        support_rates: existing(DEMO_SUPPORT_RATES_FILE_NAME),
        fcr_rates: existing(DEMO_FCR_RATES_FILE_NAME),
    };
    if opts.output_dir.is_none() {
        opts.output_dir = Some(get_output_dir(Path::new(name))?);
    }

    handle_run_command(&demo_path.join(DEMO_CONFIG_FILE_NAME), &opts, settings)
}
