//! Staff members and their salary-related costs.
use crate::assumptions::StaffingRates;
use crate::budget::{BudgetRow, STAFFING_CATEGORY};
use crate::input::event::WorkerRaw;
use crate::units::Money;

/// A member of staff assigned to a project
#[derive(Debug, Clone, PartialEq)]
pub struct Worker {
    /// Job title
    pub position: String,
    /// Name
    pub name: String,
    /// Age in years
    pub age: u32,
    /// Department
    pub department: String,
    /// Contact number
    pub mobilephone: String,
    /// Day rate of this person's line manager, used for full cost recovery
    pub line_manager_rate: Money,
    /// Employer pension contribution rate
    pub employer_pension_rate: f64,
    /// Annual salary for a full-time equivalent
    pub fte_salary: Money,
    /// Full-time equivalent fraction
    pub fte: f64,
    /// Actual annual salary (`fte_salary * fte`)
    pub salary: Money,
    rates: StaffingRates,
}

impl Worker {
    /// Create a worker from its configuration
    pub fn new(raw: WorkerRaw, rates: &StaffingRates) -> Self {
        Self {
            position: raw.position,
            name: raw.name,
            age: raw.age,
            department: raw.department,
            mobilephone: raw.mobilephone,
            line_manager_rate: raw.linemanagerrate,
            employer_pension_rate: raw
                .employerpensionrate
                .unwrap_or(rates.employer_pension_rate),
            fte_salary: raw.salary,
            fte: raw.fte,
            salary: raw.salary * raw.fte,
            rates: *rates,
        }
    }

    /// Salary for one month
    pub fn monthly_salary(&self) -> Money {
        self.salary / 12.0
    }

    /// Employer's National Insurance due on a month's salary.
    ///
    /// NB: The eligibility check compares the *annual* salary against the *monthly* threshold, so
    /// in practice any non-trivial salary passes it and the threshold only affects the amount.
    pub fn national_insurance(&self, monthly_salary: Money) -> Money {
        let threshold = self.rates.ni_monthly_threshold();
        if self.salary > threshold {
            let taxable = monthly_salary - threshold;
            if taxable > Money::ZERO {
                taxable * self.rates.ni_rate
            } else {
                Money::ZERO
            }
        } else {
            Money::ZERO
        }
    }

    /// Employer pension contribution on `amount`, for someone working `fte`
    pub fn pension(&self, amount: Money, fte: f64) -> Money {
        if fte > self.rates.pension_fte_threshold {
            amount * self.employer_pension_rate
        } else {
            Money::ZERO
        }
    }

    /// Total monthly cost of employing this person: salary, NI and pension
    pub fn monthly_salary_cost(&self) -> Money {
        let salary = self.monthly_salary();
        salary + self.national_insurance(salary) + self.pension(salary, self.fte)
    }

    /// Total annual cost of employing this person
    pub fn annual_salary_cost(&self) -> Money {
        self.monthly_salary_cost() * 12.0
    }

    /// Salary, NI and pension rows for the given step
    pub fn breakdown(&self, step: u32) -> Vec<BudgetRow> {
        let salary = self.monthly_salary();
        let row = |item: &str, amount: Money, description: &str| {
            BudgetRow::new(step, item, amount)
                .with_category(STAFFING_CATEGORY)
                .with_description(description)
        };

        vec![
            row("salary", salary, "Monthly salary"),
            row("ni", self.national_insurance(salary), "National Insurance"),
            row("pension", self.pension(salary, self.fte), "Pension contribution"),
        ]
    }
}
