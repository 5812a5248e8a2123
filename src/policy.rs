//! Funding and cost policies attached to projects.
//!
//! Policies are selected by name in configuration (`policy: Grant`) and are a closed set of
//! variants. Each one is constructed once, when its project is created, and then applied once per
//! project step in the order they were attached.
use crate::account::ConsolidatedAccount;
use crate::assumptions::Assumptions;
use crate::budget::BudgetRow;
use crate::units::Money;
use crate::worker::Worker;
use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use strum::{Display, EnumString, VariantNames};

pub mod carbon;
pub use carbon::{CarbonFinancing, CarbonReport};
pub mod fcr;
pub use fcr::FullCostRecovery;
pub mod finance;
pub use finance::Finance;
pub mod grant;
pub use grant::Grant;
pub mod rename;
pub use rename::Rename;
pub mod subsidy;
pub use subsidy::Subsidy;

/// The names by which policies can be selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(ascii_case_insensitive)]
pub enum PolicyKind {
    /// See [`FullCostRecovery`]
    FullCostRecovery,
    /// See [`Grant`]
    Grant,
    /// See [`Subsidy`]
    Subsidy,
    /// See [`Rename`]
    Rename,
    /// See [`Finance`]
    Finance,
    /// See [`CarbonFinancing`]
    CarbonFinancing,
}

/// Details of the project a policy is being attached to
#[derive(Debug, Clone, Copy)]
pub struct ProjectInfo<'a> {
    /// Project name
    pub name: &'a str,
    /// Project term in steps
    pub term: u32,
    /// The project's nominal budget
    pub budget: Money,
}

/// Cost and income accumulated by a project during the current step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepTally {
    /// Costs this step
    pub costs: Money,
    /// Income this step
    pub income: Money,
}

/// The parts of a project (and its portfolio) a policy can act on during a step
pub struct StepContext<'a> {
    /// The project's name, which a policy may change
    pub project_name: &'a mut String,
    /// The project's staff
    pub staff: &'a [Worker],
    /// The project's running totals for this step
    pub tally: &'a mut StepTally,
    /// The portfolio's ledger
    pub account: &'a mut ConsolidatedAccount,
}

/// A policy attached to a project
#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    /// Recover overhead costs for each member of staff
    FullCostRecovery(FullCostRecovery),
    /// One-off grant income
    Grant(Grant),
    /// Regular subsidy income, paid straight into the ledger
    Subsidy(Subsidy),
    /// Rename the project every step
    Rename(Rename),
    /// Capital received up front and repaid with interest
    Finance(Finance),
    /// Tree planting funded by carbon credits
    CarbonFinancing(CarbonFinancing),
}

/// Deserialise a policy's parameters from its configuration
fn parameters<T: DeserializeOwned>(config: &Value, kind: PolicyKind) -> Result<T> {
    serde_yaml::from_value(config.clone())
        .with_context(|| format!("Invalid parameters for {kind} policy"))
}

impl Policy {
    /// Create a policy from its configuration.
    ///
    /// The variant is chosen by the `policy` key (or, failing that, `cls`). Configurations which
    /// don't name a known policy are skipped with a warning, giving `Ok(None)`.
    ///
    /// Some policies post to the ledger as soon as they are created.
    pub fn from_config(
        config: &Value,
        project: &ProjectInfo,
        assumptions: &Assumptions,
        account: &mut ConsolidatedAccount,
    ) -> Result<Option<Policy>> {
        let Some(name) = config
            .get("policy")
            .or_else(|| config.get("cls"))
            .and_then(Value::as_str)
        else {
            warn!("Policy for project {} has no name; skipping", project.name);
            return Ok(None);
        };
        let Ok(kind) = name.parse::<PolicyKind>() else {
            warn!(
                "Unknown policy {name} for project {} (options: {}); skipping",
                project.name,
                PolicyKind::VARIANTS.join(", ")
            );
            return Ok(None);
        };

        let policy = match kind {
            PolicyKind::FullCostRecovery => Policy::FullCostRecovery(FullCostRecovery::new(
                parameters(config, kind)?,
                assumptions,
            )),
            PolicyKind::Grant => Policy::Grant(Grant::new(parameters(config, kind)?)),
            PolicyKind::Subsidy => Policy::Subsidy(Subsidy::new(parameters(config, kind)?)),
            PolicyKind::Rename => Policy::Rename(Rename::new(parameters(config, kind)?)),
            PolicyKind::Finance => {
                Policy::Finance(Finance::new(parameters(config, kind)?, project, account))
            }
            PolicyKind::CarbonFinancing => Policy::CarbonFinancing(CarbonFinancing::new(
                parameters(config, kind)?,
                project,
                account,
            )?),
        };

        Ok(Some(policy))
    }

    /// Which kind of policy this is
    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::FullCostRecovery(_) => PolicyKind::FullCostRecovery,
            Policy::Grant(_) => PolicyKind::Grant,
            Policy::Subsidy(_) => PolicyKind::Subsidy,
            Policy::Rename(_) => PolicyKind::Rename,
            Policy::Finance(_) => PolicyKind::Finance,
            Policy::CarbonFinancing(_) => PolicyKind::CarbonFinancing,
        }
    }

    /// Apply the policy for one project step
    pub fn calculate(&mut self, step: u32, ctx: &mut StepContext) -> Result<()> {
        match self {
            Policy::FullCostRecovery(policy) => policy.calculate(step, ctx),
            Policy::Grant(policy) => policy.calculate(step, ctx),
            Policy::Subsidy(policy) => policy.calculate(ctx),
            Policy::Rename(policy) => policy.calculate(step, ctx),
            Policy::Finance(policy) => policy.calculate(step, ctx)?,
            Policy::CarbonFinancing(policy) => policy.calculate(step, ctx),
        }

        Ok(())
    }

    /// The itemized rows this policy has produced so far.
    ///
    /// These are kept separately from the ledger and are only surfaced in the budget table.
    pub fn budget(&self) -> &[BudgetRow] {
        match self {
            Policy::FullCostRecovery(policy) => policy.register(),
            Policy::Grant(policy) => policy.register(),
            _ => &[],
        }
    }

    /// The full cost recovery policy, if this is one
    pub fn as_full_cost_recovery(&self) -> Option<&FullCostRecovery> {
        match self {
            Policy::FullCostRecovery(policy) => Some(policy),
            _ => None,
        }
    }
}
