//! One-off grant funding.
use super::StepContext;
use crate::budget::{BudgetRow, FUNDING_CATEGORY};
use crate::input::{deserialise_amount, deserialise_step};
use crate::units::Money;
use serde::Deserialize;

/// Configuration for [`Grant`]
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GrantParams {
    /// Amount of the grant
    #[serde(deserialize_with = "deserialise_amount")]
    pub amount: Money,
    /// Name of the fund
    pub fund: String,
    /// Project step at which the grant is received
    #[serde(deserialize_with = "deserialise_step")]
    pub step: u32,
}

impl Default for GrantParams {
    fn default() -> Self {
        Self {
            amount: Money::ZERO,
            fund: "unspecified".into(),
            step: 0,
        }
    }
}

/// Grant income received once, at a given step.
///
/// The grant counts towards the project's income for that step and is recorded as a budget row,
/// but is not posted to the ledger itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    /// Amount of the grant
    pub amount: Money,
    /// Name of the fund
    pub fund: String,
    /// Project step at which the grant is received
    pub step: u32,
    register: Vec<BudgetRow>,
}

impl Grant {
    /// Create a new grant
    pub fn new(params: GrantParams) -> Self {
        Self {
            amount: params.amount,
            fund: params.fund,
            step: params.step,
            register: Vec::new(),
        }
    }

    /// Add the grant to the project's income if it is due
    pub fn calculate(&mut self, step: u32, ctx: &mut StepContext) {
        if step == self.step {
            ctx.tally.income += self.amount;
            self.register.push(
                BudgetRow::new(step, format!("{} grant", self.fund), -self.amount)
                    .with_category(FUNDING_CATEGORY),
            );
        }
    }

    /// Rows recorded so far
    pub fn register(&self) -> &[BudgetRow] {
        &self.register
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::ConsolidatedAccount;
    use crate::policy::StepTally;

    #[test]
    fn test_grant_params_defaults() {
        let params: GrantParams = serde_yaml::from_str("policy: Grant").unwrap();
        assert_eq!(params.amount, Money::ZERO);
        assert_eq!(params.fund, "unspecified");
        assert_eq!(params.step, 0);
    }

    #[test]
    fn test_grant_received_once() {
        let params: GrantParams =
            serde_yaml::from_str("amount: 5000\nfund: Lottery\nstep: 2").unwrap();
        let mut grant = Grant::new(params);
        let mut account = ConsolidatedAccount::new();
        let mut name = "p1".to_string();

        let mut incomes = Vec::new();
        for step in 0..4 {
            let mut tally = StepTally::default();
            let mut ctx = StepContext {
                project_name: &mut name,
                staff: &[],
                tally: &mut tally,
                account: &mut account,
            };
            grant.calculate(step, &mut ctx);
            incomes.push(tally.income);
        }

        assert_eq!(
            incomes,
            [Money::ZERO, Money::ZERO, Money(5000.0), Money::ZERO]
        );
        assert_eq!(
            grant.register(),
            [BudgetRow::new(2, "Lottery grant", Money(-5000.0)).with_category(FUNDING_CATEGORY)]
        );

        // The grant stays off the ledger
        assert!(account.register().is_empty());
    }
}
