//! The records describing projects to be started during a run.
use super::{deserialise_amount, deserialise_number, deserialise_step, parse_document};
use crate::cost::{DirectCost, SupportCost};
use crate::units::Money;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::Value;

/// A scheduled project start: when it happens and the project to create
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EventSpec {
    /// Project name
    pub name: String,
    /// Number of steps the project runs for
    #[serde(deserialize_with = "deserialise_step")]
    pub term: u32,
    /// Portfolio step at which the project starts
    #[serde(deserialize_with = "deserialise_step")]
    pub time: u32,
    /// The project's nominal budget
    #[serde(deserialize_with = "deserialise_amount")]
    pub budget: Money,
    /// Message logged when the project starts
    pub message: Option<String>,
    /// Direct costs
    pub directcosts: Vec<DirectCost>,
    /// Support costs
    pub supports: Vec<SupportCost>,
    /// Staff assigned to the project
    pub staffing: Vec<WorkerRaw>,
    /// Policy configurations, each selected by its `policy` key
    pub policies: Vec<Value>,
}

impl Default for EventSpec {
    fn default() -> Self {
        Self {
            name: "New Project".into(),
            term: 0,
            time: 0,
            budget: Money::ZERO,
            message: None,
            directcosts: Vec::new(),
            supports: Vec::new(),
            staffing: Vec::new(),
            policies: Vec::new(),
        }
    }
}

impl EventSpec {
    /// The message to log when the project starts, falling back to the project name
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.name)
    }
}

/// A member of staff as written in configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkerRaw {
    /// Job title
    pub position: String,
    /// Name
    pub name: String,
    /// Age in years
    #[serde(deserialize_with = "deserialise_step")]
    pub age: u32,
    /// Department
    pub department: String,
    /// Contact number
    pub mobilephone: String,
    /// Day rate of this person's line manager
    #[serde(deserialize_with = "deserialise_amount")]
    pub linemanagerrate: Money,
    /// Employer pension rate, if different from the default
    pub employerpensionrate: Option<f64>,
    /// Annual salary for a full-time equivalent
    #[serde(deserialize_with = "deserialise_amount")]
    pub salary: Money,
    /// Full-time equivalent fraction
    #[serde(deserialize_with = "deserialise_number")]
    pub fte: f64,
}

impl Default for WorkerRaw {
    fn default() -> Self {
        Self {
            position: "undesignated".into(),
            name: "staff member".into(),
            age: 49,
            department: "unspecified".into(),
            mobilephone: "not assigned".into(),
            linemanagerrate: Money::ZERO,
            employerpensionrate: None,
            salary: Money::ZERO,
            fte: 1.0,
        }
    }
}

/// Deserialise parsed event records
pub fn events_from_values(values: Vec<Value>) -> Result<Vec<EventSpec>> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_yaml::from_value(value).with_context(|| format!("Invalid event at index {index}"))
        })
        .collect()
}

/// Parse a configuration document into event records
pub fn parse_events(text: &str) -> Result<Vec<EventSpec>> {
    events_from_values(parse_document(text)?.events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::frequency::Frequency;

    #[test]
    fn test_parse_events_defaults() {
        let events = parse_events("events:\n  - {}\n").unwrap();
        assert_eq!(events, [EventSpec::default()]);
        assert_eq!(events[0].message(), "New Project");
    }

    #[test]
    fn test_parse_events() {
        let events = parse_events(
            "variables:
  salary: 30000
events:
  - name: Project A
    message: Project A wins funding
    term: \"{2 * 12}\"
    time: 3
    budget: 150000
    directcosts:
      - item: Laptop
        cost: 1200
        step: 1
    supports:
      - item: Training
        units: 2
        frequency: annual
    staffing:
      - name: Alice
        salary: \"{salary * 2}\"
        fte: 0.5
    policies:
      - policy: Grant
        amount: 5000
",
        )
        .unwrap();

        let event = &events[0];
        assert_eq!(event.name, "Project A");
        assert_eq!(event.message(), "Project A wins funding");
        assert_eq!(event.term, 24);
        assert_eq!(event.time, 3);
        assert_eq!(event.budget, Money(150_000.0));
        assert_eq!(event.directcosts[0].item, "Laptop");
        assert_eq!(event.directcosts[0].step, 1);
        assert_eq!(event.directcosts[0].frequency, Frequency::OneOff);
        assert_eq!(event.supports[0].frequency, Frequency::Annual);
        assert_eq!(
            event.staffing[0],
            WorkerRaw {
                name: "Alice".into(),
                salary: Money(60000.0),
                fte: 0.5,
                ..WorkerRaw::default()
            }
        );
        assert_eq!(event.policies.len(), 1);
    }

    #[test]
    fn test_parse_events_bad_term() {
        assert_error!(
            parse_events("events:\n  - name: p1\n  - term: -3\n"),
            "Invalid event at index 1"
        );
    }
}
