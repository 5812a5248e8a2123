//! The portfolio: a set of projects sharing one account, driven by a step loop.
use crate::account::{ConsolidatedAccount, TransactionRecord};
use crate::assumptions::Assumptions;
use crate::budget::BudgetRow;
use crate::calendar::timestamp;
use crate::input::EventSpec;
use crate::policy::ProjectInfo;
use crate::policy::finance::{Finance, FinanceParams, HEAD_OFFICE};
use crate::project::{Project, ProjectRow};
use crate::units::Money;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::info;
use std::mem;
use std::rc::Rc;

/// Default portfolio name
pub const DEFAULT_PORTFOLIO_NAME: &str = "My Portfolio";

/// Round to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A collection of projects which start at scheduled steps and share a consolidated account
#[derive(Debug)]
pub struct Portfolio {
    /// Portfolio name
    pub name: String,
    now: u32,
    account: ConsolidatedAccount,
    projects: Vec<Project>,
    pending: Vec<EventSpec>,
    assumptions: Rc<Assumptions>,
}

impl Portfolio {
    /// Create an empty portfolio
    pub fn new(name: impl Into<String>, assumptions: Rc<Assumptions>) -> Self {
        Self {
            name: name.into(),
            now: 0,
            account: ConsolidatedAccount::new(),
            projects: Vec::new(),
            pending: Vec::new(),
            assumptions,
        }
    }

    /// The current step
    pub fn now(&self) -> u32 {
        self.now
    }

    /// The consolidated account
    pub fn account(&self) -> &ConsolidatedAccount {
        &self.account
    }

    /// Projects created so far, in creation order
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Events which haven't yet started, in order of start time
    pub fn pending_events(&self) -> &[EventSpec] {
        &self.pending
    }

    /// Schedule an event. Events with the same start time keep the order they were added in.
    pub fn set_event(&mut self, event: EventSpec) {
        self.pending.push(event);
        self.pending.sort_by_key(|event| event.time);
    }

    /// Schedule several events
    pub fn set_portfolio<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = EventSpec>,
    {
        for event in events {
            self.set_event(event);
        }
    }

    /// Run the simulation for `steps` steps.
    ///
    /// At each step, projects whose events are due are created first, then every project is
    /// stepped in the order it was created.
    pub fn run(&mut self, steps: u32) -> Result<()> {
        for step in 0..steps {
            self.now = step;
            self.account.set_step(step);

            let (starting, pending): (Vec<_>, Vec<_>) = mem::take(&mut self.pending)
                .into_iter()
                .partition(|event| event.time == step);
            self.pending = pending;
            for event in starting {
                info!("{}: Event {} succeeds", timestamp(step), event.message());
                self.create_project(event)?;
            }

            for project in &mut self.projects {
                project.step(&mut self.account)?;
            }
        }

        Ok(())
    }

    /// Create a project now, regardless of its scheduled start time
    pub fn create_project(&mut self, event: EventSpec) -> Result<&Project> {
        let name = event.name.clone();
        let project = Project::new(event, Rc::clone(&self.assumptions), &mut self.account)
            .with_context(|| format!("Failed to create project {name}"))?;
        info!(
            "Project {} created with budget {:.2} and assigned staff {}",
            project.name,
            project.budget.0,
            project.staff.iter().map(|person| &person.name).join(", ")
        );

        let index = self.projects.len();
        self.projects.push(project);
        Ok(&self.projects[index])
    }

    /// Every project's itemized budget, with steps relative to the start of the portfolio
    pub fn budget(&self) -> Vec<BudgetRow> {
        self.projects
            .iter()
            .flat_map(Project::budget_adjusted)
            .collect()
    }

    /// One row per project, with amounts rounded to two decimal places
    pub fn list_projects(&self) -> Vec<ProjectRow> {
        self.projects
            .iter()
            .map(|project| {
                let mut row = project.summary();
                for amount in [
                    &mut row.budget,
                    &mut row.cost,
                    &mut row.income,
                    &mut row.costs_thismonth,
                    &mut row.income_thismonth,
                ] {
                    *amount = Money(round2(amount.0));
                }
                row
            })
            .collect()
    }

    /// Every transaction posted to the account. Also logs a summary of the account.
    pub fn list_transactions(&self) -> &[TransactionRecord] {
        self.account.report();
        self.account.register()
    }

    /// Take out a loan for head office.
    ///
    /// The capital is received and all `term` repayments are posted to the account immediately.
    pub fn finance(&mut self, term: u32, capital: Money, rate: f64) -> Result<Finance> {
        ensure!(term > 0, "Finance term must be greater than zero");

        let info = ProjectInfo {
            name: HEAD_OFFICE,
            term,
            budget: Money::ZERO,
        };
        let params = FinanceParams {
            term: Some(term),
            capital,
            rate,
        };
        let mut finance = Finance::new(params, &info, &mut self.account);
        for _ in 0..term {
            finance.service(&mut self.account)?;
        }
        finance.finalize(self.now);

        Ok(finance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::TransactionType;
    use crate::fixture::{assumptions, event};
    use crate::frequency::Frequency;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn portfolio(assumptions: Assumptions) -> Portfolio {
        Portfolio::new(DEFAULT_PORTFOLIO_NAME, Rc::new(assumptions))
    }

    fn event_at(name: &str, time: u32) -> EventSpec {
        EventSpec {
            name: name.into(),
            time,
            term: 2,
            ..EventSpec::default()
        }
    }

    #[rstest]
    fn test_set_event_orders_by_time(mut portfolio: Portfolio) {
        portfolio.set_portfolio([event_at("a", 3), event_at("b", 1), event_at("c", 3)]);
        let names: Vec<_> = portfolio
            .pending_events()
            .iter()
            .map(|event| event.name.as_str())
            .collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[rstest]
    fn test_run_single_project(mut portfolio: Portfolio, event: EventSpec) {
        portfolio.set_event(event);
        portfolio.run(3).unwrap();

        let budget = portfolio.budget();
        assert_eq!(budget.len(), 3);
        assert!(budget.iter().all(|row| row.budget == Money(100.0)));

        let transactions = portfolio.list_transactions();
        assert_eq!(transactions.len(), 6);
        for (step, pair) in (0..).zip(transactions.chunks(2)) {
            assert_eq!(pair[0].kind, TransactionType::Expenditure);
            assert_eq!(pair[0].amount, Money(100.0));
            assert_eq!(pair[0].step, step);
            assert_eq!(pair[1].kind, TransactionType::Income);
            assert!(pair[1].amount.is_zero());
        }
    }

    #[rstest]
    fn test_run_starts_projects_on_time(mut portfolio: Portfolio) {
        portfolio.set_portfolio([event_at("late", 2), event_at("early", 0)]);
        portfolio.run(2).unwrap();
        assert_eq!(portfolio.projects().len(), 1);
        assert_eq!(portfolio.pending_events().len(), 1);

        // A project created at a step is also stepped at that step
        portfolio.run(3).unwrap();
        let late = &portfolio.projects()[1];
        assert_eq!(late.name, "late");
        assert_eq!(late.current_step(), 1);
        assert!(portfolio.pending_events().is_empty());
    }

    #[rstest]
    fn test_run_never_started(mut portfolio: Portfolio) {
        portfolio.set_event(event_at("future", 10));
        portfolio.run(5).unwrap();
        assert!(portfolio.projects().is_empty());
        assert!(portfolio.list_transactions().is_empty());
    }

    #[rstest]
    fn test_budget_is_offset_by_start(mut portfolio: Portfolio, mut event: EventSpec) {
        event.time = 2;
        event.directcosts[0].frequency = Frequency::OneOff;
        portfolio.set_event(event);
        portfolio.run(5).unwrap();
        let steps: Vec<_> = portfolio.budget().iter().map(|row| row.step).collect();
        assert_eq!(steps, [2, 3, 4]);
    }

    #[rstest]
    fn test_list_projects_rounds(mut portfolio: Portfolio) {
        let mut event = event_at("p", 0);
        event.budget = Money(1234.5678);
        portfolio.set_event(event);
        portfolio.run(1).unwrap();
        let rows = portfolio.list_projects();
        assert_eq!(rows[0].budget, Money(1234.57));
        assert_eq!(rows[0].start_step, 0);
    }

    #[rstest]
    fn test_run_propagates_errors(mut portfolio: Portfolio) {
        let mut event = event_at("forest", 0);
        event.policies = vec![
            serde_yaml::from_str("policy: CarbonFinancing\ninvestment: 100").unwrap(),
        ];
        portfolio.set_event(event);
        assert!(portfolio.run(1).is_err());
    }

    #[rstest]
    fn test_finance(mut portfolio: Portfolio) {
        let finance = portfolio.finance(4, Money(1000.0), 0.05).unwrap();
        let register = portfolio.account().register();
        assert_eq!(register.len(), 5);
        assert!(register.iter().all(|record| record.project == HEAD_OFFICE));
        // Interest: 5% of 1000, 750, 500 and 250
        assert_approx_eq!(f64, finance.total_paid().0, 1125.0);
        assert_approx_eq!(f64, portfolio.account().balance().0, -125.0);
        assert_approx_eq!(f64, finance.outstanding().0, 0.0);
    }

    #[rstest]
    fn test_finance_zero_term(mut portfolio: Portfolio) {
        assert!(portfolio.finance(0, Money(1000.0), 0.05).is_err());
        assert!(portfolio.account().register().is_empty());
    }
}
