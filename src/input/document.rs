//! Parsing of YAML configuration documents.
//!
//! A document is either a mapping:
//!
//! ```yaml
//! variables:
//!   rate: 350
//!   monthly: "{rate * 20}"
//! events:
//!   - name: Project A
//!     budget: "{monthly * 12}"
//! ```
//!
//! or a bare list of events, the first of which may hold the variables instead. Every string in
//! the document may embed braced expressions, which are evaluated against the resolved variables.
use crate::expression::Expr;
use crate::policy::PolicyKind;
use crate::variables::{
    EMBEDDED_EXPRESSION, VariableMap, builtin_constants, coerce_numeric, literal_text,
    resolve_variables,
};
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use regex::Captures;
use serde_yaml::{Mapping, Value};

/// Key for the variables section
const VARIABLES_KEY: &str = "variables";

/// Key for the optional staffing rates section
const RATES_KEY: &str = "rates";

/// Keys under which the event list may be given, in order of preference
const EVENTS_KEYS: [&str; 2] = ["events", "projects"];

/// Key used to select an implementation by name
const CLASS_KEY: &str = "cls";

/// A parsed configuration document
#[derive(Debug, Default, PartialEq)]
pub struct Document {
    /// The built-in constants plus every resolved variable
    pub variables: VariableMap,
    /// The interpolated event records
    pub events: Vec<Value>,
    /// The interpolated `rates` section, if present
    pub rates: Option<Value>,
}

/// Parse a configuration document.
///
/// Variables are resolved first, then every string value in the rest of the document has its
/// braced expressions substituted. Expressions which can't be evaluated are left as they are.
pub fn parse_document(text: &str) -> Result<Document> {
    let data: Value = serde_yaml::from_str(text).context("Failed to parse YAML")?;
    let (raw_variables, events, rates) = split_document(data)?;

    let variables = resolve_variables(&raw_variables, &builtin_constants())?;
    debug!("Resolved variables: {variables:?}");

    let events = events
        .into_iter()
        .map(|event| select_policy_classes(interpolate(event, &variables)))
        .collect();
    let rates = rates.map(|rates| interpolate(rates, &variables));

    Ok(Document {
        variables,
        events,
        rates,
    })
}

/// Split a document into its raw variables, event list and rates section
fn split_document(data: Value) -> Result<(VariableMap, Vec<Value>, Option<Value>)> {
    match data {
        Value::Null => Ok(Default::default()),
        Value::Mapping(mut root) => {
            let variables = match root.remove(VARIABLES_KEY) {
                Some(variables) => variable_map(variables)?,
                None => VariableMap::new(),
            };
            let rates = root.remove(RATES_KEY);
            let events = match EVENTS_KEYS.iter().find_map(|key| root.remove(*key)) {
                Some(events) => events,
                None => take_only_value(root)?,
            };

            Ok((variables, event_list(events)?, rates))
        }
        Value::Sequence(mut items) => {
            let variables = match items.first().and_then(|first| first.get(VARIABLES_KEY)) {
                Some(variables) => {
                    let variables = variable_map(variables.clone())?;
                    items.remove(0);
                    variables
                }
                None => VariableMap::new(),
            };

            Ok((variables, items, None))
        }
        _ => bail!("Configuration must be a mapping or a list of events"),
    }
}

/// If there is no events section, the sole remaining section is used instead
fn take_only_value(root: Mapping) -> Result<Value> {
    match root.len() {
        0 => Ok(Value::Null),
        1 => Ok(root.into_iter().map(|(_, value)| value).next().unwrap_or(Value::Null)),
        _ => {
            let keys: Vec<String> = root
                .keys()
                .map(|key| key.as_str().unwrap_or("?").to_string())
                .collect();
            bail!(
                "Expected an events or projects section, found: {}",
                keys.join(", ")
            )
        }
    }
}

/// Read the variables section
fn variable_map(value: Value) -> Result<VariableMap> {
    if value.is_null() {
        return Ok(VariableMap::new());
    }

    serde_yaml::from_value(value).context("Variables must be a mapping from names to values")
}

/// The events section must be a list (or empty)
fn event_list(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => Ok(items),
        _ => bail!("Events must be given as a list"),
    }
}

/// Substitute braced expressions in every string within `value`
pub fn interpolate(value: Value, variables: &VariableMap) -> Value {
    match value {
        Value::String(text) => interpolate_str(text, variables),
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| interpolate(item, variables))
                .collect(),
        ),
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, value)| (key, interpolate(value, variables)))
                .collect(),
        ),
        Value::Tagged(mut tagged) => {
            tagged.value = interpolate(tagged.value, variables);
            Value::Tagged(tagged)
        }
        other => other,
    }
}

/// Substitute the braced expressions in a string, then convert it to a number if possible.
///
/// Strings without any braced expressions are returned unchanged.
fn interpolate_str(text: String, variables: &VariableMap) -> Value {
    if !EMBEDDED_EXPRESSION.is_match(&text) {
        return Value::String(text);
    }

    let result = EMBEDDED_EXPRESSION.replace_all(&text, |caps: &Captures| {
        let expr = &caps[1];
        let outcome = Expr::parse(expr).and_then(|parsed| {
            literal_text(&parsed, variables).unwrap_or_else(|| {
                let number = parsed.eval(variables)?;
                if number.is_finite() {
                    Ok(number.to_string())
                } else {
                    warn!("Expression '{expr}' is not finite, using 0 instead");
                    Ok("0".to_string())
                }
            })
        });

        outcome.unwrap_or_else(|err| {
            warn!("Could not evaluate expression '{expr}': {err}");
            caps[0].to_string()
        })
    });

    coerce_numeric(result.into_owned())
}

/// Replace any `cls` value naming a policy with that policy's canonical name
fn select_policy_classes(value: Value) -> Value {
    match value {
        Value::Sequence(items) => {
            Value::Sequence(items.into_iter().map(select_policy_classes).collect())
        }
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, value)| {
                    let value = match value.as_str().map(str::parse::<PolicyKind>) {
                        Some(Ok(kind)) if key.as_str() == Some(CLASS_KEY) => {
                            Value::String(kind.to_string())
                        }
                        _ => select_policy_classes(value),
                    };
                    (key, value)
                })
                .collect(),
        ),
        other => other,
    }
}
