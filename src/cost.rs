//! Direct and support costs attached to a project.
use crate::assumptions::Assumptions;
use crate::budget::{BudgetRow, STANDARD_CATEGORY};
use crate::frequency::Frequency;
use crate::input::{deserialise_amount, deserialise_number, deserialise_step};
use crate::units::Money;
use serde::Deserialize;

/// Default item name for costs which don't give one
fn unspecified() -> String {
    "unspecified".into()
}

/// A cost paid directly by the project
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectCost {
    /// What the cost is for
    pub item: String,
    /// Amount paid whenever the cost falls due
    #[serde(deserialize_with = "deserialise_amount")]
    pub cost: Money,
    /// How often the cost falls due
    pub frequency: Frequency,
    /// Step at which one-off and annual costs are triggered
    #[serde(deserialize_with = "deserialise_step")]
    pub step: u32,
    /// Free-text description
    pub description: String,
    /// Category tag
    #[serde(rename = "type")]
    pub category: String,
}

impl Default for DirectCost {
    fn default() -> Self {
        Self {
            item: unspecified(),
            cost: Money::ZERO,
            frequency: Frequency::default(),
            step: 0,
            description: String::new(),
            category: STANDARD_CATEGORY.into(),
        }
    }
}

impl DirectCost {
    /// The cost at `step`, which is zero unless the cost falls due
    pub fn cost_at(&self, step: u32) -> Money {
        if self.frequency.is_due(step, self.step) {
            self.cost
        } else {
            Money::ZERO
        }
    }

    /// The budget row for this cost at `step`. A row is produced even when nothing is due.
    pub fn row(&self, step: u32) -> BudgetRow {
        BudgetRow::new(step, self.item.clone(), self.cost_at(step))
            .with_category(self.category.clone())
            .with_description(self.description.clone())
    }
}

/// Units of support bought in by the project, priced from the support rate table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SupportCost {
    /// The support item, which is looked up in the support rate table
    pub item: String,
    /// Number of units
    #[serde(deserialize_with = "deserialise_number")]
    pub units: f64,
    /// Step at which one-off and annual support is triggered
    #[serde(deserialize_with = "deserialise_step")]
    pub step: u32,
    /// How often the support is needed
    pub frequency: Frequency,
    /// Free-text description
    pub description: String,
}

impl Default for SupportCost {
    fn default() -> Self {
        Self {
            item: unspecified(),
            units: 0.0,
            step: 0,
            frequency: Frequency::default(),
            description: String::new(),
        }
    }
}

impl SupportCost {
    /// The cost at `step`: `units * dayrate * daysperunit` if due, or zero if not due or the item
    /// has no rate
    pub fn cost_at(&self, step: u32, assumptions: &Assumptions) -> Money {
        if !self.frequency.is_due(step, self.step) {
            return Money::ZERO;
        }

        assumptions
            .support_rate(&self.item)
            .map_or(Money::ZERO, |rate| {
                rate.dayrate * (self.units * rate.daysperunit)
            })
    }

    /// The budget row for this support at `step`
    pub fn row(&self, step: u32, assumptions: &Assumptions) -> BudgetRow {
        BudgetRow::new(step, self.item.clone(), self.cost_at(step, assumptions))
            .with_description(self.description.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assumptions;
    use rstest::rstest;

    fn direct_cost(frequency: Frequency, step: u32) -> DirectCost {
        DirectCost {
            item: "Rent".into(),
            cost: Money(100.0),
            frequency,
            step,
            ..DirectCost::default()
        }
    }

    #[test]
    fn test_direct_cost_monthly() {
        let cost = direct_cost(Frequency::Monthly, 0);
        assert!((0..12).all(|step| cost.cost_at(step) == Money(100.0)));
    }

    #[test]
    fn test_direct_cost_oneoff() {
        let cost = direct_cost(Frequency::OneOff, 3);
        for step in 0..12 {
            let expected = if step == 3 { 100.0 } else { 0.0 };
            assert_eq!(cost.cost_at(step), Money(expected));
        }
    }

    #[test]
    fn test_direct_cost_annual() {
        let cost = direct_cost(Frequency::Annual, 0);
        let due: Vec<u32> = (0..36).filter(|&step| !cost.cost_at(step).is_zero()).collect();
        assert_eq!(due, [0, 12, 24]);
    }

    #[test]
    fn test_direct_cost_row() {
        let row = direct_cost(Frequency::OneOff, 3).row(2);
        assert_eq!(
            row,
            BudgetRow::new(2, "Rent", Money::ZERO)
                .with_category(STANDARD_CATEGORY)
                .with_description("")
        );
    }

    #[rstest]
    #[case("Training", 0, 2.0 * 300.0 * 0.5)]
    #[case("Training", 1, 0.0)]
    #[case("Catering", 0, 0.0)] // no rate
    fn test_support_cost(
        assumptions: Assumptions,
        #[case] item: &str,
        #[case] step: u32,
        #[case] expected: f64,
    ) {
        let support = SupportCost {
            item: item.into(),
            units: 2.0,
            ..SupportCost::default()
        };
        let row = support.row(step, &assumptions);
        assert_eq!(row.budget, Money(expected));
        assert!(row.category.is_none());
    }
}
