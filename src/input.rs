//! Common routines for handling input data.
use crate::assumptions::{Assumptions, FcrRate, StaffingRates, SupportRate};
use crate::units::Money;
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::de::{Deserialize, DeserializeOwned, Deserializer, Error as _};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

pub mod document;
pub use document::{Document, parse_document};
pub mod event;
pub use event::{EventSpec, WorkerRaw, events_from_values, parse_events};

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a series of type `T`s from a CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?;

    let vec = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .with_context(|| input_err_msg(file_path))?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read a configuration document from a YAML file
pub fn read_document(file_path: &Path) -> Result<Document> {
    let text = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    parse_document(&text).with_context(|| input_err_msg(file_path))
}

/// Read a table of records from either a CSV file or a YAML configuration document.
///
/// The format is chosen by file extension. YAML tables are a list of records (optionally with
/// `variables`) and so may use braced expressions.
pub fn read_table<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let is_csv = file_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        return read_csv(file_path);
    }

    read_document(file_path)?
        .events
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_yaml::from_value(value)
                .with_context(|| format!("Invalid row {index} in {}", file_path.display()))
        })
        .collect()
}

/// Load the rates and lookup tables shared by every project in a run.
///
/// Tables which aren't provided are left empty, so any costs depending on them come to zero.
pub fn load_assumptions(
    staffing: StaffingRates,
    support_rates_path: Option<&Path>,
    fcr_rates_path: Option<&Path>,
) -> Result<Assumptions> {
    let support_rates: Vec<SupportRate> = match support_rates_path {
        Some(path) => read_table(path).context("Failed to read support rates")?,
        None => Vec::new(),
    };
    let fcr_rates: Vec<FcrRate> = match fcr_rates_path {
        Some(path) => read_table(path).context("Failed to read full cost recovery rates")?,
        None => Vec::new(),
    };

    Ok(Assumptions {
        staffing,
        support_rates,
        fcr_rates,
    })
}

/// Everything needed to set up a portfolio
#[derive(Debug, PartialEq)]
pub struct SimulationInput {
    /// Events to schedule
    pub events: Vec<EventSpec>,
    /// Rates and lookup tables
    pub assumptions: Assumptions,
}

/// Load a configuration document and the rate tables to go with it.
///
/// Staffing rates come from the document's `rates` section if it has one, otherwise the defaults
/// are used.
pub fn load_simulation_input(
    config_path: &Path,
    support_rates_path: Option<&Path>,
    fcr_rates_path: Option<&Path>,
) -> Result<SimulationInput> {
    let document = read_document(config_path)?;
    let staffing = match document.rates {
        Some(rates) => serde_yaml::from_value(rates)
            .with_context(|| format!("Invalid rates section in {}", config_path.display()))?,
        None => StaffingRates::default(),
    };
    let events = events_from_values(document.events).with_context(|| input_err_msg(config_path))?;
    let assumptions = load_assumptions(staffing, support_rates_path, fcr_rates_path)?;

    Ok(SimulationInput {
        events,
        assumptions,
    })
}

/// Interpret a loosely-typed value as a number.
///
/// Numbers and numeric strings are accepted. Missing values and blank strings count as zero.
fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Number(number) => number.as_f64(),
        Value::String(text) if text.trim().is_empty() => Some(0.0),
        Value::String(text) => text.trim().parse().ok(),
        Value::Tagged(tagged) => lenient_number(&tagged.value),
        _ => None,
    }
}

/// Read a number leniently, using zero (with a warning) for anything non-numeric
pub fn deserialise_number<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserialiser)?;
    Ok(lenient_number(&value).unwrap_or_else(|| {
        warn!("Could not read {value:?} as a number; using 0 instead");
        0.0
    }))
}

/// Read an amount of money leniently (see [`deserialise_number`])
pub fn deserialise_amount<'de, D>(deserialiser: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    deserialise_number(deserialiser).map(Money)
}

/// Interpret a value as a step index
fn step_from_value(value: &Value) -> Option<u32> {
    let step = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse().ok()?,
        Value::Tagged(tagged) => return step_from_value(&tagged.value),
        _ => return None,
    };

    (step >= 0.0 && step.fract() == 0.0 && step <= f64::from(u32::MAX)).then_some(step as u32)
}

/// Read a step index (or number of steps), which must be a non-negative integer
pub fn deserialise_step<'de, D>(deserialiser: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserialiser)?;
    step_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("{value:?} is not a non-negative integer")))
}

/// Read an optional step index. A null value gives `None`.
pub fn deserialise_optional_step<'de, D>(deserialiser: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserialiser)?;
    if value.is_null() {
        return Ok(None);
    }

    step_from_value(&value)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("{value:?} is not a non-negative integer")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::Frequency;
    use rstest::rstest;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        #[serde(default, deserialize_with = "deserialise_number")]
        value: f64,
        #[serde(default, deserialize_with = "deserialise_step")]
        step: u32,
    }

    fn record(yaml: &str) -> Result<Record, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    #[rstest]
    #[case("value: 1.5", 1.5)]
    #[case("value: 2", 2.0)]
    #[case("value: \" 3.25 \"", 3.25)]
    #[case("value: \"\"", 0.0)]
    #[case("value: null", 0.0)]
    #[case("value: lots", 0.0)]
    #[case("value: [1]", 0.0)]
    fn test_deserialise_number(#[case] yaml: &str, #[case] expected: f64) {
        assert_eq!(record(yaml).unwrap().value, expected);
    }

    #[rstest]
    #[case("step: 3", Some(3))]
    #[case("step: 3.0", Some(3))]
    #[case("step: \"7\"", Some(7))]
    #[case("step: -1", None)]
    #[case("step: 1.5", None)]
    #[case("step: soon", None)]
    fn test_deserialise_step(#[case] yaml: &str, #[case] expected: Option<u32>) {
        assert_eq!(record(yaml).ok().map(|record| record.step), expected);
    }

    /// Write a file with the given contents into `dir`, returning its path
    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "support.csv",
            "item,dayrate,daysperunit\nTraining, 300 ,0.5\nCatering,,1\n",
        );
        let rates: Vec<SupportRate> = read_csv(&path).unwrap();
        assert_eq!(
            rates,
            [
                SupportRate {
                    item: "Training".into(),
                    dayrate: Money(300.0),
                    daysperunit: 0.5,
                },
                SupportRate {
                    item: "Catering".into(),
                    dayrate: Money::ZERO,
                    daysperunit: 1.0,
                },
            ]
        );
    }

    #[test]
    fn test_read_csv_empty() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "support.csv", "item,dayrate,daysperunit\n");
        assert!(read_csv::<SupportRate>(&path).is_err());
    }

    #[test]
    fn test_read_table_yaml_with_expressions() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "fcr.yaml",
            "variables:
  rate: 200
events:
  - item: IT
    daysperfte: \"{2/4}\"
    dayrate: \"{rate * 2}\"
    frequency: annual
",
        );
        let rates: Vec<FcrRate> = read_table(&path).unwrap();
        assert_eq!(
            rates,
            [FcrRate {
                item: "IT".into(),
                daysperfte: 0.5,
                dayrate: Money(400.0),
                frequency: Frequency::Annual,
                description: None,
            }]
        );
    }

    #[test]
    fn test_load_assumptions_without_tables() {
        let assumptions = load_assumptions(StaffingRates::default(), None, None).unwrap();
        assert_eq!(assumptions, Assumptions::default());
    }

    #[test]
    fn test_load_simulation_input() {
        let dir = tempdir().unwrap();
        let config = write_file(
            dir.path(),
            "portfolio.yaml",
            "rates:
  ni_rate: 0.1
events:
  - name: p1
    term: 3
",
        );
        let support = write_file(
            dir.path(),
            "support.csv",
            "item,dayrate,daysperunit\nTraining,300,0.5\n",
        );

        let input = load_simulation_input(&config, Some(&support), None).unwrap();
        assert_eq!(input.events.len(), 1);
        assert_eq!(input.events[0].term, 3);
        assert_eq!(input.assumptions.staffing.ni_rate, 0.1);
        assert_eq!(input.assumptions.support_rates.len(), 1);
        assert!(input.assumptions.fcr_rates.is_empty());
    }

    #[test]
    fn test_read_toml_missing_file() {
        let dir = tempdir().unwrap();
        let result: Result<toml::Table> = read_toml(&dir.path().join("missing.toml"));
        assert!(result.is_err());
    }
}
