//! Full cost recovery: charging overheads for each member of staff.
use super::StepContext;
use crate::assumptions::{Assumptions, FcrRate};
use crate::budget::{BudgetRow, FULL_COST_RECOVERY_CATEGORY, total};
use crate::units::Money;
use crate::worker::Worker;
use serde::Deserialize;

/// FCR items charged at the person's line manager rate rather than the table's day rate
const LINE_MANAGEMENT_ITEM: &str = "Line Management";

/// Configuration for [`FullCostRecovery`]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FullCostRecoveryParams {
    /// Rates to use instead of the portfolio's FCR table
    pub fcrdata: Option<Vec<FcrRate>>,
}

/// Charges each overhead item in the FCR table for every member of staff, every step.
///
/// The cost of an item for one person is `fte * daysperfte * dayrate`. One-off items are charged
/// at step 0 and annual items every twelve steps.
#[derive(Debug, Clone, PartialEq)]
pub struct FullCostRecovery {
    rates: Vec<FcrRate>,
    register: Vec<BudgetRow>,
}

impl FullCostRecovery {
    /// Create a new policy, taking rates from the parameters or else from the portfolio's table
    pub fn new(params: FullCostRecoveryParams, assumptions: &Assumptions) -> Self {
        Self {
            rates: params
                .fcrdata
                .unwrap_or_else(|| assumptions.fcr_rates.clone()),
            register: Vec::new(),
        }
    }

    /// The FCR rows for one person at one step. These are not recorded in the register.
    pub fn rows_for(&self, person: &Worker, step: u32) -> Vec<BudgetRow> {
        self.rates
            .iter()
            .map(|rate| {
                let dayrate = if rate.item == LINE_MANAGEMENT_ITEM {
                    person.line_manager_rate
                } else {
                    rate.dayrate
                };
                let cost = if rate.frequency.is_due(step, 0) {
                    dayrate * (person.fte * rate.daysperfte)
                } else {
                    Money::ZERO
                };

                BudgetRow::new(step, rate.item.clone(), cost)
                    .with_category(FULL_COST_RECOVERY_CATEGORY)
                    .with_description(format!("FCR: {}", rate.item))
            })
            .collect()
    }

    /// Charge FCR for every member of staff, recording the rows in the register
    pub fn calculate(&mut self, step: u32, ctx: &mut StepContext) {
        let mut cost = Money::ZERO;
        for person in ctx.staff {
            let rows = self.rows_for(person, step);
            cost += total(&rows);
            self.register.extend(rows);
        }
        ctx.tally.costs += cost;
    }

    /// Rows charged so far
    pub fn register(&self) -> &[BudgetRow] {
        &self.register
    }
}
