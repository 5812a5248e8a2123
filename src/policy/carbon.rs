//! Tree planting funded by the sale of carbon credits.
use super::{ProjectInfo, StepContext};
use crate::account::{ConsolidatedAccount, Transaction};
use crate::input::deserialise_amount;
use crate::units::Money;
use anyhow::{Result, ensure};
use log::info;
use serde::{Deserialize, Serialize};

/// Carbon credits generated by one tree over its lifetime
const CREDITS_PER_TREE: f64 = 1.1;

/// Configuration for [`CarbonFinancing`]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CarbonFinancingParams {
    /// Total investment
    #[serde(deserialize_with = "deserialise_amount")]
    pub investment: Money,
    /// Cost of planting one tree
    #[serde(deserialize_with = "deserialise_amount")]
    pub tree_planting_cost_per_unit: Money,
    /// Price of one carbon credit
    #[serde(deserialize_with = "deserialise_amount")]
    pub carbon_credit_per_unit: Money,
}

/// Summary of a carbon financing scheme
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CarbonReport {
    /// Total investment
    pub investment: Money,
    /// Number of trees planted
    pub trees_planted: f64,
    /// Carbon credits the trees generate over their lifetime
    pub carbon_credits_generated: f64,
}

/// Invests in tree planting and earns carbon credits.
///
/// Whatever part of the investment the project's budget doesn't cover is spent on trees, and is
/// posted to the ledger as expenditure when the policy is created. At step 0, the whole investment
/// is also counted as project income.
#[derive(Debug, Clone, PartialEq)]
pub struct CarbonFinancing {
    /// Total investment
    pub investment: Money,
    /// Price of one carbon credit
    pub carbon_credit_per_unit: Money,
    trees_planted: f64,
}

impl CarbonFinancing {
    /// Create the scheme and post the capital cost of planting to the ledger
    pub fn new(
        params: CarbonFinancingParams,
        project: &ProjectInfo,
        account: &mut ConsolidatedAccount,
    ) -> Result<Self> {
        ensure!(
            !params.tree_planting_cost_per_unit.is_zero(),
            "Tree planting cost per unit must be non-zero"
        );

        let capital_cost = params.investment - project.budget;
        let policy = Self {
            investment: params.investment,
            carbon_credit_per_unit: params.carbon_credit_per_unit,
            trees_planted: capital_cost / params.tree_planting_cost_per_unit,
        };
        account.update(Transaction::expenditure(
            "capital cost tree planting",
            project.name,
            capital_cost,
        ));
        info!(
            "Trees planted: {:.0} will generate {:.0} carbon credits over 40 years worth {:.2}",
            policy.trees_planted,
            policy.carbon_credits(),
            policy.carbon_income().0
        );

        Ok(policy)
    }

    /// Number of trees planted
    pub fn trees_planted(&self) -> f64 {
        self.trees_planted
    }

    /// Carbon credits generated over the trees' lifetime
    pub fn carbon_credits(&self) -> f64 {
        self.trees_planted * CREDITS_PER_TREE
    }

    /// Value of the carbon credits
    pub fn carbon_income(&self) -> Money {
        self.carbon_credit_per_unit * self.carbon_credits()
    }

    /// Summarise the scheme
    pub fn report(&self) -> CarbonReport {
        CarbonReport {
            investment: self.investment,
            trees_planted: self.trees_planted,
            carbon_credits_generated: self.carbon_credits(),
        }
    }

    /// Count the investment as income at the first step
    pub fn calculate(&self, step: u32, ctx: &mut StepContext) {
        if step == 0 {
            ctx.tally.income += self.investment;
        }
    }
}
