//! Regular subsidy payments.
use super::StepContext;
use crate::account::Transaction;
use crate::input::deserialise_amount;
use crate::units::Money;
use serde::Deserialize;

/// Configuration for [`Subsidy`]
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SubsidyParams {
    /// Payment received each step
    #[serde(deserialize_with = "deserialise_amount")]
    pub amount: Money,
}

impl Default for SubsidyParams {
    fn default() -> Self {
        Self {
            amount: Money(100_000.0),
        }
    }
}

/// A fixed payment every step, posted straight to the ledger as income
#[derive(Debug, Clone, PartialEq)]
pub struct Subsidy {
    /// Payment received each step
    pub amount: Money,
}

impl Subsidy {
    /// Create a new subsidy
    pub fn new(params: SubsidyParams) -> Self {
        Self {
            amount: params.amount,
        }
    }

    /// Receive this step's payment
    pub fn calculate(&self, ctx: &mut StepContext) {
        ctx.tally.income += self.amount;
        ctx.account.update(Transaction::income(
            "government subsidy",
            ctx.project_name.as_str(),
            self.amount,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{ConsolidatedAccount, TransactionType};
    use crate::policy::StepTally;

    #[test]
    fn test_subsidy_default_amount() {
        let params: SubsidyParams = serde_yaml::from_str("policy: Subsidy").unwrap();
        assert_eq!(Subsidy::new(params).amount, Money(100_000.0));
    }

    #[test]
    fn test_subsidy_paid_every_step() {
        let subsidy = Subsidy::new(SubsidyParams {
            amount: Money(250.0),
        });
        let mut account = ConsolidatedAccount::new();
        let mut name = "p1".to_string();
        let mut tally = StepTally::default();
        let mut ctx = StepContext {
            project_name: &mut name,
            staff: &[],
            tally: &mut tally,
            account: &mut account,
        };
        for _ in 0..3 {
            subsidy.calculate(&mut ctx);
        }

        assert_eq!(tally.income, Money(750.0));
        assert_eq!(account.total_income(), Money(750.0));
        assert_eq!(account.register().len(), 3);
        for record in account.register() {
            assert_eq!(record.kind, TransactionType::Income);
            assert_eq!(record.title, "government subsidy");
            assert_eq!(record.project, "p1");
            assert_eq!(record.amount, Money(-250.0));
        }
    }
}
