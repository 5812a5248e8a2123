//! Projects: the units of work whose costs and income make up a portfolio.
use crate::account::{ConsolidatedAccount, Transaction};
use crate::assumptions::Assumptions;
use crate::budget::BudgetRow;
use crate::calendar::timestamp;
use crate::cost::{DirectCost, SupportCost};
use crate::input::EventSpec;
use crate::policy::{FullCostRecovery, Policy, ProjectInfo, StepContext, StepTally};
use crate::units::Money;
use crate::worker::Worker;
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A project's scalar attributes, as listed in the projects table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    /// Project name
    pub name: String,
    /// Number of steps the project runs for
    pub term: u32,
    /// Portfolio step at which the project started
    pub start_step: u32,
    /// Nominal budget
    pub budget: Money,
    /// Costs so far
    pub cost: Money,
    /// Income so far
    pub income: Money,
    /// Costs in the most recent step
    pub costs_thismonth: Money,
    /// Income in the most recent step
    pub income_thismonth: Money,
    /// Number of steps completed
    pub current_step: u32,
}

/// A project with staff, costs and policies, advanced one step at a time
#[derive(Debug)]
pub struct Project {
    /// Project name. Policies may change this.
    pub name: String,
    /// Number of steps the project runs for
    pub term: u32,
    /// Portfolio step at which the project started
    pub start_step: u32,
    /// Nominal budget, for reporting only
    pub budget: Money,
    /// Direct costs
    pub direct_costs: Vec<DirectCost>,
    /// Support costs
    pub supports: Vec<SupportCost>,
    /// Staff
    pub staff: Vec<Worker>,
    policies: Vec<Policy>,
    assumptions: Rc<Assumptions>,
    tally: StepTally,
    cost: Money,
    income: Money,
    current_step: u32,
}

impl Project {
    /// Create a project from its event record.
    ///
    /// Policies are created before staff are assigned. Some policies post to the account as soon
    /// as they are created.
    pub fn new(
        event: EventSpec,
        assumptions: Rc<Assumptions>,
        account: &mut ConsolidatedAccount,
    ) -> Result<Self> {
        let info = ProjectInfo {
            name: &event.name,
            term: event.term,
            budget: event.budget,
        };

        let mut policies = Vec::new();
        for config in &event.policies {
            let policy = Policy::from_config(config, &info, &assumptions, account)
                .with_context(|| format!("Failed to create policy for project {}", event.name))?;
            policies.extend(policy);
        }

        let staff = event
            .staffing
            .into_iter()
            .map(|raw| Worker::new(raw, &assumptions.staffing))
            .collect();

        Ok(Self {
            name: event.name,
            term: event.term,
            start_step: event.time,
            budget: event.budget,
            direct_costs: event.directcosts,
            supports: event.supports,
            staff,
            policies,
            assumptions,
            tally: StepTally::default(),
            cost: Money::ZERO,
            income: Money::ZERO,
            current_step: 0,
        })
    }

    /// Attached policies, in the order they are applied
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// The attached full cost recovery policy, if any
    pub fn full_cost_recovery(&self) -> Option<&FullCostRecovery> {
        self.policies
            .iter()
            .find_map(Policy::as_full_cost_recovery)
    }

    /// Lifetime costs so far
    pub fn cost(&self) -> Money {
        self.cost
    }

    /// Lifetime income so far
    pub fn income(&self) -> Money {
        self.income
    }

    /// Cost and income for the most recent step
    pub fn step_tally(&self) -> StepTally {
        self.tally
    }

    /// Number of steps completed
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// Whether the project has run for its full term
    pub fn is_complete(&self) -> bool {
        self.current_step >= self.term
    }

    /// Direct cost rows for `step`
    pub fn direct_costs(&self, step: u32) -> Vec<BudgetRow> {
        self.direct_costs.iter().map(|cost| cost.row(step)).collect()
    }

    /// Support cost rows for `step`
    pub fn support_costs(&self, step: u32) -> Vec<BudgetRow> {
        self.supports
            .iter()
            .map(|support| support.row(step, &self.assumptions))
            .collect()
    }

    /// Staff cost rows, labelled with each person's name.
    ///
    /// Each person's salary, NI and pension rows are followed by their full cost recovery rows, if
    /// the project has a full cost recovery policy. If `step` is `None`, rows are given for every
    /// step of the term.
    pub fn staff_costs(&self, step: Option<u32>) -> Vec<BudgetRow> {
        let fcr = self.full_cost_recovery();
        let rows_at = |step: u32| {
            self.staff.iter().flat_map(move |person| {
                let fcr_rows = fcr.map(|fcr| fcr.rows_for(person, step)).unwrap_or_default();
                person
                    .breakdown(step)
                    .into_iter()
                    .chain(fcr_rows)
                    .map(|row| row.with_name(person.name.clone()))
            })
        };

        match step {
            Some(step) => rows_at(step).collect(),
            None => (0..self.term).flat_map(rows_at).collect(),
        }
    }

    /// Total monthly salary cost (salary, NI and pension) of all staff
    pub fn salary_costs(&self) -> Money {
        self.staff.iter().map(Worker::monthly_salary_cost).sum()
    }

    /// Add this step's direct, support and salary costs to the step's running total
    pub fn calculate(&mut self, step: u32) {
        let direct: Money = self.direct_costs.iter().map(|cost| cost.cost_at(step)).sum();
        let support: Money = self
            .supports
            .iter()
            .map(|support| support.cost_at(step, &self.assumptions))
            .sum();
        self.tally.costs += self.salary_costs() + direct + support;
    }

    /// Apply every policy for `step`, in the order they were attached
    pub fn sweep_policies(&mut self, step: u32, account: &mut ConsolidatedAccount) -> Result<()> {
        let mut ctx = StepContext {
            project_name: &mut self.name,
            staff: &self.staff,
            tally: &mut self.tally,
            account,
        };
        for policy in &mut self.policies {
            policy
                .calculate(step, &mut ctx)
                .with_context(|| format!("{} policy failed at step {step}", policy.kind()))?;
        }

        Ok(())
    }

    /// Advance the project by one step, posting its costs and income to the account.
    ///
    /// Does nothing once the project has completed its term.
    ///
    /// # Returns
    ///
    /// Whether the project is still active after this step
    pub fn step(&mut self, account: &mut ConsolidatedAccount) -> Result<bool> {
        if self.is_complete() {
            return Ok(false);
        }

        let step = self.current_step;
        self.tally = StepTally::default();
        self.calculate(step);
        self.sweep_policies(step, account)
            .with_context(|| format!("Failed to step project {}", self.name))?;
        self.cost += self.tally.costs;
        self.income += self.tally.income;

        account.update(Transaction::expenditure(
            "project costs",
            self.name.as_str(),
            self.tally.costs,
        ));
        account.update(Transaction::income(
            "project income",
            self.name.as_str(),
            self.tally.income,
        ));

        self.current_step += 1;
        if self.is_complete() {
            info!(
                "{}: Project {} cost {:.2} and generated {:.2} with budget {:.2}",
                timestamp(account.step()),
                self.name,
                self.cost.0,
                self.income.0,
                self.budget.0
            );
        }

        Ok(!self.is_complete())
    }

    /// Every itemized row for the project's term, followed by the rows recorded by its policies.
    ///
    /// Steps are relative to the project's start.
    pub fn budget(&self) -> Vec<BudgetRow> {
        let mut rows = Vec::new();
        for step in 0..self.term {
            rows.extend(self.direct_costs(step));
            rows.extend(self.support_costs(step));
            for person in &self.staff {
                rows.extend(person.breakdown(step));
            }
        }
        for policy in &self.policies {
            rows.extend_from_slice(policy.budget());
        }

        rows
    }

    /// As [`Project::budget`], but with steps relative to the start of the portfolio
    pub fn budget_adjusted(&self) -> Vec<BudgetRow> {
        let mut rows = self.budget();
        for row in &mut rows {
            row.step += self.start_step;
        }

        rows
    }

    /// The project's scalar attributes
    pub fn summary(&self) -> ProjectRow {
        ProjectRow {
            name: self.name.clone(),
            term: self.term,
            start_step: self.start_step,
            budget: self.budget,
            cost: self.cost,
            income: self.income,
            costs_thismonth: self.tally.costs,
            income_thismonth: self.tally.income,
            current_step: self.current_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::TransactionType;
    use crate::budget::{FULL_COST_RECOVERY_CATEGORY, STAFFING_CATEGORY, total};
    use crate::fixture::{assumptions, event, worker_raw};
    use crate::frequency::Frequency;
    use crate::input::WorkerRaw;
    use crate::policy::PolicyKind;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use serde_yaml::Value;

    fn policy(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn new_project(event: EventSpec, assumptions: Assumptions) -> (Project, ConsolidatedAccount) {
        let mut account = ConsolidatedAccount::new();
        let project = Project::new(event, Rc::new(assumptions), &mut account).unwrap();
        (project, account)
    }

    #[rstest]
    fn test_step_posts_costs_then_income(event: EventSpec, assumptions: Assumptions) {
        let (mut project, mut account) = new_project(event, assumptions);
        assert!(project.step(&mut account).unwrap());

        let register = account.register();
        assert_eq!(register.len(), 2);
        assert_eq!(register[0].kind, TransactionType::Expenditure);
        assert_eq!(register[0].title, "project costs");
        assert_eq!(register[0].amount, Money(100.0));
        assert_eq!(register[1].kind, TransactionType::Income);
        assert_eq!(register[1].title, "project income");
        assert!(register[1].amount.is_zero());
    }

    #[rstest]
    fn test_step_until_complete(event: EventSpec, assumptions: Assumptions) {
        let (mut project, mut account) = new_project(event, assumptions);
        let active: Vec<bool> = (0..5)
            .map(|_| project.step(&mut account).unwrap())
            .collect();
        assert_eq!(active, [true, true, false, false, false]);
        assert!(project.is_complete());
        assert_eq!(project.cost(), Money(300.0));
        // No postings once complete
        assert_eq!(account.register().len(), 6);
    }

    #[rstest]
    fn test_budget(event: EventSpec, assumptions: Assumptions) {
        let (project, _) = new_project(event, assumptions);
        let rows = project.budget();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.item == "Rent" && row.budget == Money(100.0)));
        assert_eq!(
            rows.iter().map(|row| row.step).collect::<Vec<_>>(),
            [0, 1, 2]
        );
    }

    #[rstest]
    fn test_budget_adjusted(mut event: EventSpec, assumptions: Assumptions) {
        event.time = 5;
        let (project, _) = new_project(event, assumptions);
        assert_eq!(
            project
                .budget_adjusted()
                .iter()
                .map(|row| row.step)
                .collect::<Vec<_>>(),
            [5, 6, 7]
        );
    }

    #[rstest]
    fn test_support_costs(mut event: EventSpec, assumptions: Assumptions) {
        event.supports = vec![SupportCost {
            item: "Training".into(),
            units: 4.0,
            frequency: Frequency::Monthly,
            ..SupportCost::default()
        }];
        let (mut project, mut account) = new_project(event, assumptions);
        assert_eq!(project.support_costs(1)[0].budget, Money(600.0));
        project.step(&mut account).unwrap();
        assert_eq!(project.step_tally().costs, Money(700.0));
    }

    #[rstest]
    fn test_staff_costs_with_fcr(
        mut event: EventSpec,
        assumptions: Assumptions,
        worker_raw: WorkerRaw,
    ) {
        event.staffing = vec![worker_raw];
        event.policies = vec![policy("policy: FullCostRecovery")];
        let (project, _) = new_project(event, assumptions);

        let rows = project.staff_costs(Some(0));
        let categories: Vec<_> = rows.iter().map(|row| row.category.as_deref()).collect();
        assert_eq!(
            categories,
            [
                Some(STAFFING_CATEGORY),
                Some(STAFFING_CATEGORY),
                Some(STAFFING_CATEGORY),
                Some(FULL_COST_RECOVERY_CATEGORY),
                Some(FULL_COST_RECOVERY_CATEGORY),
                Some(FULL_COST_RECOVERY_CATEGORY),
            ]
        );
        assert!(rows.iter().all(|row| row.name.as_deref() == Some("Alice")));
        assert_eq!(project.staff_costs(None).len(), 6 * 3);

        // FCR rows only appear in the budget once the policy has been applied
        assert!(
            project
                .budget()
                .iter()
                .all(|row| row.category.as_deref() != Some(FULL_COST_RECOVERY_CATEGORY))
        );
    }

    #[rstest]
    fn test_fcr_applied_on_step(
        mut event: EventSpec,
        assumptions: Assumptions,
        worker_raw: WorkerRaw,
    ) {
        event.directcosts.clear();
        event.staffing = vec![worker_raw];
        event.policies = vec![policy("policy: FullCostRecovery")];
        let (mut project, mut account) = new_project(event, assumptions);
        project.step(&mut account).unwrap();

        let salary = project.salary_costs();
        let fcr = total(project.policies()[0].budget());
        assert_approx_eq!(f64, fcr.0, 950.0);
        assert_approx_eq!(f64, project.step_tally().costs.0, (salary + fcr).0);
        assert_eq!(project.budget().len(), 3 * 3 + 3);
    }

    #[rstest]
    fn test_grant(mut event: EventSpec, assumptions: Assumptions) {
        event.term = 1;
        event.directcosts.clear();
        event.policies = vec![policy("policy: Grant\namount: 5000\nfund: Lottery")];
        let (mut project, mut account) = new_project(event, assumptions);
        project.step(&mut account).unwrap();

        assert_eq!(project.step_tally().income, Money(5000.0));
        let grant_row = project.budget().pop().unwrap();
        assert_eq!(grant_row.item, "Lottery grant");
        assert_eq!(grant_row.step, 0);
        assert_eq!(grant_row.budget, Money(-5000.0));

        // Only the project's own aggregate postings reach the ledger
        let titles: Vec<_> = account.register().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["project costs", "project income"]);
        assert_eq!(account.register()[1].amount, Money(-5000.0));
    }

    #[rstest]
    fn test_subsidy_and_rename(mut event: EventSpec, assumptions: Assumptions) {
        event.policies = vec![
            policy("policy: Subsidy\namount: 250"),
            policy("policy: Rename"),
        ];
        let (mut project, mut account) = new_project(event, assumptions);
        project.step(&mut account).unwrap();
        project.step(&mut account).unwrap();

        assert_eq!(project.name, "Fancy project in step 1");
        let register = account.register();
        assert_eq!(register[0].title, "government subsidy");
        assert_eq!(register[0].project, "p1");
        assert_eq!(register[2].project, "Fancy project in step 0");
        assert_eq!(project.income(), Money(500.0));
    }

    #[rstest]
    fn test_policies_in_order(mut event: EventSpec, assumptions: Assumptions) {
        event.policies = vec![
            policy("policy: Rename"),
            policy("policy: Unknown"),
            policy("policy: Grant"),
        ];
        let (project, _) = new_project(event, assumptions);
        let kinds: Vec<_> = project.policies().iter().map(Policy::kind).collect();
        assert_eq!(kinds, [PolicyKind::Rename, PolicyKind::Grant]);
    }

    #[rstest]
    fn test_finance_zero_term_fails_step(mut event: EventSpec, assumptions: Assumptions) {
        event.policies = vec![policy("policy: Finance\nterm: 0\ncapital: 100")];
        let (mut project, mut account) = new_project(event, assumptions);
        assert!(project.step(&mut account).is_err());
    }

    #[rstest]
    fn test_summary(event: EventSpec, assumptions: Assumptions) {
        let (mut project, mut account) = new_project(event, assumptions);
        project.step(&mut account).unwrap();
        let summary = project.summary();
        assert_eq!(summary.name, "p1");
        assert_eq!(summary.cost, Money(100.0));
        assert_eq!(summary.costs_thismonth, Money(100.0));
        assert_eq!(summary.current_step, 1);
    }
}
