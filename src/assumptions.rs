//! Rates and lookup tables which parameterise a simulation run.
//!
//! These are loaded once, before the run starts, and shared by every project in a portfolio.
use crate::frequency::Frequency;
use crate::input::{deserialise_amount, deserialise_number};
use crate::units::Money;
use serde::Deserialize;

/// Rates used when calculating staff costs
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct StaffingRates {
    /// Employer's National Insurance rate
    #[serde(deserialize_with = "deserialise_number")]
    pub ni_rate: f64,
    /// Weekly earnings threshold above which National Insurance is payable
    #[serde(deserialize_with = "deserialise_amount")]
    pub ni_weekly_threshold: Money,
    /// Default employer pension contribution rate
    #[serde(deserialize_with = "deserialise_number")]
    pub employer_pension_rate: f64,
    /// Staff whose FTE does not exceed this don't receive employer pension contributions
    #[serde(deserialize_with = "deserialise_number")]
    pub pension_fte_threshold: f64,
}

impl Default for StaffingRates {
    fn default() -> Self {
        Self {
            ni_rate: 0.138,
            ni_weekly_threshold: Money(175.0),
            employer_pension_rate: 0.09,
            pension_fte_threshold: 0.2,
        }
    }
}

impl StaffingRates {
    /// The National Insurance threshold expressed per month
    pub fn ni_monthly_threshold(&self) -> Money {
        self.ni_weekly_threshold / 7.0 * 365.0 / 12.0
    }
}

/// The cost of a unit of support, looked up by item name
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SupportRate {
    /// The support item
    pub item: String,
    /// Cost per day
    #[serde(default, deserialize_with = "deserialise_amount")]
    pub dayrate: Money,
    /// Number of days in one unit of support
    #[serde(default, deserialize_with = "deserialise_number")]
    pub daysperunit: f64,
}

/// An overhead item recovered for each member of staff
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FcrRate {
    /// The overhead item. "Line Management" is charged at each person's line manager rate.
    pub item: String,
    /// Days of the item needed per full-time equivalent
    #[serde(default, deserialize_with = "deserialise_number")]
    pub daysperfte: f64,
    /// Cost per day
    #[serde(default, deserialize_with = "deserialise_amount")]
    pub dayrate: Money,
    /// How often the cost is incurred
    #[serde(default)]
    pub frequency: Frequency,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything a portfolio needs to know beyond its event list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assumptions {
    /// Rates for staff costs
    pub staffing: StaffingRates,
    /// Support rate lookup table
    pub support_rates: Vec<SupportRate>,
    /// Full cost recovery rate table
    pub fcr_rates: Vec<FcrRate>,
}

impl Assumptions {
    /// Find the first support rate for the given item
    pub fn support_rate(&self, item: &str) -> Option<&SupportRate> {
        self.support_rates.iter().find(|rate| rate.item == item)
    }
}
