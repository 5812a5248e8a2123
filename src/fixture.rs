//! Fixtures for tests
use crate::assumptions::{Assumptions, FcrRate, StaffingRates, SupportRate};
use crate::cost::DirectCost;
use crate::frequency::Frequency;
use crate::input::{EventSpec, WorkerRaw};
use crate::units::Money;
use crate::worker::Worker;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn worker_raw() -> WorkerRaw {
    WorkerRaw {
        position: "Engineer".into(),
        name: "Alice".into(),
        salary: Money(36000.0),
        fte: 1.0,
        linemanagerrate: Money(400.0),
        ..WorkerRaw::default()
    }
}

#[fixture]
pub fn worker(worker_raw: WorkerRaw) -> Worker {
    Worker::new(worker_raw, &StaffingRates::default())
}

#[fixture]
pub fn fcr_rates() -> Vec<FcrRate> {
    let rate = |item: &str, daysperfte: f64, dayrate: f64, frequency: Frequency| FcrRate {
        item: item.into(),
        daysperfte,
        dayrate: Money(dayrate),
        frequency,
        description: None,
    };

    vec![
        rate("IT", 2.0, 250.0, Frequency::OneOff),
        rate("Line Management", 1.0, 0.0, Frequency::Monthly),
        rate("Accommodation", 0.5, 100.0, Frequency::Annual),
    ]
}

#[fixture]
pub fn assumptions(fcr_rates: Vec<FcrRate>) -> Assumptions {
    Assumptions {
        staffing: StaffingRates::default(),
        support_rates: vec![SupportRate {
            item: "Training".into(),
            dayrate: Money(300.0),
            daysperunit: 0.5,
        }],
        fcr_rates,
    }
}

/// A three-step project with one monthly cost of 100
#[fixture]
pub fn event() -> EventSpec {
    EventSpec {
        name: "p1".into(),
        term: 3,
        directcosts: vec![DirectCost {
            item: "Rent".into(),
            cost: Money(100.0),
            frequency: Frequency::Monthly,
            ..DirectCost::default()
        }],
        ..EventSpec::default()
    }
}
