//! Rows of the itemized budget table.
use crate::units::Money;
use serde::{Deserialize, Serialize};

/// Category for salary, National Insurance and pension rows
pub const STAFFING_CATEGORY: &str = "1. Staffing";

/// Default category for direct costs
pub const STANDARD_CATEGORY: &str = "2. Standard";

/// Category for full cost recovery rows
pub const FULL_COST_RECOVERY_CATEGORY: &str = "3. FullCostRecovery";

/// Category for funding rows (e.g. grants)
pub const FUNDING_CATEGORY: &str = "4. Funding";

/// A single itemized cost or income entry.
///
/// Costs are positive and income is negative, so summing a column gives the net cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRow {
    /// The step at which the amount applies
    pub step: u32,
    /// The name of the budget item
    pub item: String,
    /// The amount
    pub budget: Money,
    /// The category tag used to group rows in reports
    #[serde(rename = "type")]
    pub category: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// The staff member the row relates to, if any
    pub name: Option<String>,
}

impl BudgetRow {
    /// Create a new row with no category, description or staff name
    pub fn new(step: u32, item: impl Into<String>, budget: Money) -> Self {
        Self {
            step,
            item: item.into(),
            budget,
            category: None,
            description: None,
            name: None,
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the staff member's name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Sum the amounts of some budget rows
pub fn total<'a, I>(rows: I) -> Money
where
    I: IntoIterator<Item = &'a BudgetRow>,
{
    rows.into_iter().map(|row| row.budget).sum()
}
