//! The module responsible for writing output data to disk.
use crate::account::TransactionRecord;
use crate::budget::BudgetRow;
use crate::portfolio::Portfolio;
use crate::project::ProjectRow;
use crate::units::Money;
use anyhow::{Context, Result, ensure};
use log::warn;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which config-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "projectsim_results";

/// The output file name for projects
const PROJECTS_FILE_NAME: &str = "projects.csv";

/// The output file name for transactions
const TRANSACTIONS_FILE_NAME: &str = "transactions.csv";

/// The output file name for the itemized budget
const BUDGET_FILE_NAME: &str = "budget.csv";

/// Get the default output directory for the given configuration file
pub fn get_output_dir(config_path: &Path) -> Result<PathBuf> {
    let config_name = config_path
        .file_stem()
        .context("Configuration path has no file name")?
        .to_str()
        .context("Invalid chars in configuration file name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, config_name].iter().collect())
}

/// Create a new output directory, optionally replacing an existing one.
///
/// # Returns
///
/// Whether an existing, non-empty directory is being overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Replace a non-finite amount with zero, with a warning
fn finite(amount: Money, what: &str) -> Money {
    if amount.0.is_finite() {
        amount
    } else {
        warn!("Non-finite value {amount} for {what} written as 0");
        Money::ZERO
    }
}

/// Writes the results of a run to CSV files
pub struct DataWriter {
    projects_writer: csv::Writer<File>,
    transactions_writer: csv::Writer<File>,
    budget_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            projects_writer: new_writer(PROJECTS_FILE_NAME)?,
            transactions_writer: new_writer(TRANSACTIONS_FILE_NAME)?,
            budget_writer: new_writer(BUDGET_FILE_NAME)?,
        })
    }

    /// Write the projects table
    pub fn write_projects<'a, I>(&mut self, projects: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a ProjectRow>,
    {
        for project in projects {
            let mut row = project.clone();
            row.budget = finite(row.budget, "project budget");
            row.cost = finite(row.cost, "project cost");
            row.income = finite(row.income, "project income");
            row.costs_thismonth = finite(row.costs_thismonth, "project costs this month");
            row.income_thismonth = finite(row.income_thismonth, "project income this month");
            self.projects_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the transactions table
    pub fn write_transactions<'a, I>(&mut self, transactions: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        for transaction in transactions {
            let mut row = transaction.clone();
            row.amount = finite(row.amount, "transaction amount");
            row.balance = finite(row.balance, "account balance");
            self.transactions_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the itemized budget table
    pub fn write_budget<'a, I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a BudgetRow>,
    {
        for row in rows {
            let mut row = row.clone();
            row.budget = finite(row.budget, "budget item");
            self.budget_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.projects_writer.flush()?;
        self.transactions_writer.flush()?;
        self.budget_writer.flush()?;

        Ok(())
    }
}

/// Write the projects, transactions and budget tables for a completed run
pub fn write_results(portfolio: &Portfolio, output_path: &Path) -> Result<()> {
    let mut writer = DataWriter::create(output_path)
        .with_context(|| format!("Failed to create output files in {}", output_path.display()))?;
    writer.write_projects(&portfolio.list_projects())?;
    writer.write_transactions(portfolio.list_transactions())?;
    writer.write_budget(&portfolio.budget())?;
    writer.flush()
}
