//! Simulation of the costs, income and cash flow of a portfolio of funded projects.
//!
//! Projects are described in a YAML configuration document (see [`input`]), scheduled to start
//! at given steps, and then advanced month by month. Each step, a project's staff, direct and
//! support costs are totalled, its policies (grants, subsidies, loans and so on) are applied and
//! the result is posted to a ledger shared by the whole [`portfolio::Portfolio`].
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod account;
pub mod assumptions;
pub mod budget;
pub mod calendar;
pub mod cli;
pub mod cost;
pub mod expression;
pub mod frequency;
pub mod input;
pub mod log;
pub mod output;
pub mod policy;
pub mod portfolio;
pub mod project;
pub mod settings;
pub mod units;
pub mod variables;
pub mod worker;

#[cfg(test)]
mod fixture;

/// Get config dir for program.
///
/// Falls back to the current directory if the user's config directory can't be determined.
pub fn get_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("projectsim");
    path
}
