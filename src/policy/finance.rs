//! Capital received up front and repaid in equal instalments with interest.
use super::{ProjectInfo, StepContext};
use crate::account::{ConsolidatedAccount, Transaction};
use crate::calendar::timestamp;
use crate::input::{deserialise_amount, deserialise_number, deserialise_optional_step};
use crate::units::Money;
use anyhow::{Result, ensure};
use log::info;
use serde::Deserialize;

/// The party to which finance transactions are attributed
pub const HEAD_OFFICE: &str = "headoffice";

/// Configuration for [`Finance`]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FinanceParams {
    /// Number of repayment steps. Defaults to the project's term.
    #[serde(deserialize_with = "deserialise_optional_step")]
    pub term: Option<u32>,
    /// Capital received
    #[serde(deserialize_with = "deserialise_amount")]
    pub capital: Money,
    /// Interest rate per step, applied to the outstanding principal
    #[serde(deserialize_with = "deserialise_number")]
    pub rate: f64,
}

/// A loan taken out by head office.
///
/// The capital is posted to the ledger as income when the policy is created. Each step, a
/// straight-line repayment of `capital / term` plus interest on the principal still outstanding
/// is posted as expenditure.
#[derive(Debug, Clone, PartialEq)]
pub struct Finance {
    /// Number of repayment steps
    pub term: u32,
    /// Capital received
    pub capital: Money,
    /// Interest rate per step
    pub rate: f64,
    outstanding: Money,
    total_paid: Money,
}

impl Finance {
    /// Create the loan and post the capital to the ledger
    pub fn new(
        params: FinanceParams,
        project: &ProjectInfo,
        account: &mut ConsolidatedAccount,
    ) -> Self {
        info!("New capital received {:.2}", params.capital.0);
        account.update(Transaction::income(
            "finance capitalisation",
            HEAD_OFFICE,
            params.capital,
        ));

        Self {
            term: params.term.unwrap_or(project.term),
            capital: params.capital,
            rate: params.rate,
            outstanding: params.capital,
            total_paid: Money::ZERO,
        }
    }

    /// Principal not yet repaid
    pub fn outstanding(&self) -> Money {
        self.outstanding
    }

    /// Total repayments and interest paid so far
    pub fn total_paid(&self) -> Money {
        self.total_paid
    }

    /// Post one repayment (with interest) to the ledger, returning the amount paid
    pub fn service(&mut self, account: &mut ConsolidatedAccount) -> Result<Money> {
        ensure!(self.term > 0, "Finance term must be greater than zero");

        let repayment = self.capital / f64::from(self.term);
        let interest = self.outstanding * self.rate;
        self.outstanding -= repayment;
        let payment = repayment + interest;
        self.total_paid += payment;
        account.update(Transaction::expenditure(
            "finance servicing",
            HEAD_OFFICE,
            payment,
        ));

        Ok(payment)
    }

    /// Service the loan for this step.
    ///
    /// Payments continue for as long as the project is active, even beyond the loan's term.
    pub fn calculate(&mut self, step: u32, ctx: &mut StepContext) -> Result<()> {
        self.service(ctx.account)?;
        if step + 1 == self.term {
            self.finalize(ctx.account.step());
        }

        Ok(())
    }

    /// Report the final state of the loan
    pub fn finalize(&self, now: u32) {
        info!(
            "{}: Finance: Final account {:.2}, total paid {:.2}",
            timestamp(now),
            self.outstanding.0,
            self.total_paid.0
        );
    }
}
