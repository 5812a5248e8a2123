//! Resolution of named configuration variables.
//!
//! Variables are given as a mapping from name to value. A value is either a literal (copied
//! through as-is) or an expression wrapped entirely in braces, e.g. `"{rate * 12}"`, which may
//! refer to other variables, including ones defined later in the mapping. Literal strings may
//! also embed braced expressions (e.g. `"Phase {phase + 1}"`), which are substituted in place once
//! their dependencies are available.
use crate::expression::{Bindings, Expr, ExpressionError, Number};
use indexmap::{IndexMap, IndexSet};
use log::warn;
use regex::{Captures, Regex};
use serde_yaml::Value;
use std::sync::LazyLock;
use thiserror::Error;

/// A mapping from variable name to its (possibly unresolved) value
pub type VariableMap = IndexMap<String, Value>;

/// Matches each `{...}` occurrence within a string, capturing the text between the braces
pub static EMBEDDED_EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("Invalid regex"));

/// Errors which can occur when resolving variables
#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    /// Resolution stalled: the listed names are either undefined or part of a cycle
    #[error("Unresolvable or circular references: {}", names.join(", "))]
    CircularOrUnresolvedReference {
        /// The names which could not be resolved, sorted alphabetically
        names: Vec<String>,
    },
    /// A variable's expression could not be parsed or evaluated
    #[error("Invalid expression for variable {name}")]
    Expression {
        /// The variable being resolved
        name: String,
        /// The underlying error
        #[source]
        source: ExpressionError,
    },
}

/// The built-in constants available to every configuration document
pub fn builtin_constants() -> VariableMap {
    IndexMap::from([
        ("pi".to_string(), Value::from(std::f64::consts::PI)),
        ("e".to_string(), Value::from(std::f64::consts::E)),
    ])
}

impl<S: std::hash::BuildHasher> Bindings for IndexMap<String, Value, S> {
    fn lookup(&self, name: &str) -> Result<Number, ExpressionError> {
        let value = self
            .get(name)
            .ok_or_else(|| ExpressionError::UnknownVariable(name.to_string()))?;
        value_as_number(value).ok_or_else(|| ExpressionError::NonNumericVariable(name.to_string()))
    }
}

/// The value of a variable referenced on its own, if it isn't numeric.
///
/// An expression consisting of just a variable name stands for that variable's value, whatever
/// its type. Only arithmetic requires numbers.
pub fn literal_reference<'a>(expr: &Expr, variables: &'a VariableMap) -> Option<&'a Value> {
    let Expr::Variable(name) = expr else {
        return None;
    };
    variables
        .get(name)
        .filter(|value| value_as_number(value).is_none())
}

/// The text substituted into a string for a bare reference to a non-numeric variable, if `expr`
/// is one. Only strings and booleans can be substituted.
pub fn literal_text(expr: &Expr, variables: &VariableMap) -> Option<Result<String, ExpressionError>> {
    let Expr::Variable(name) = expr else {
        return None;
    };
    let text = match literal_reference(expr, variables)? {
        Value::String(text) => Ok(text.clone()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(ExpressionError::NonNumericVariable(name.clone())),
    };

    Some(text)
}

/// Interpret a YAML value as a number, if it is one
pub fn value_as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(Number::Int)
            .or_else(|| number.as_f64().map(Number::Float)),
        Value::Tagged(tagged) => value_as_number(&tagged.value),
        _ => None,
    }
}

/// Convert a number into a YAML value
pub fn number_to_value(number: Number) -> Value {
    match number {
        Number::Int(value) => Value::from(value),
        Number::Float(value) => Value::from(value),
    }
}

/// Convert a string to a number if the whole string is numeric.
///
/// Strings containing a decimal point become floats, others integers. Non-finite floats are
/// replaced with zero. Anything else is returned unchanged as a string.
pub fn coerce_numeric(text: String) -> Value {
    if text.contains('.') {
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Value::from(value),
            Ok(_) => {
                warn!("Value '{text}' is not finite, using 0 instead");
                Value::from(0)
            }
            Err(_) => Value::String(text),
        }
    } else {
        text.parse::<i64>()
            .map_or_else(|_| Value::String(text), Value::from)
    }
}

/// How a raw variable value should be treated
enum Entry<'a> {
    /// The whole value is a single braced expression
    Expression(&'a str),
    /// A string which embeds one or more braced expressions
    Template(&'a str),
    /// Anything else
    Literal,
}

impl<'a> Entry<'a> {
    fn classify(value: &'a Value) -> Self {
        let Value::String(text) = value else {
            return Entry::Literal;
        };

        let trimmed = text.trim();
        if let Some(inner) = trimmed
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            && !inner.contains(['{', '}'])
        {
            return Entry::Expression(inner);
        }

        if EMBEDDED_EXPRESSION.is_match(text) {
            Entry::Template(text)
        } else {
            Entry::Literal
        }
    }
}

/// Parse an expression, attributing any error to the named variable
fn parse_for(name: &str, expr: &str) -> Result<Expr, ResolveError> {
    Expr::parse(expr).map_err(|source| ResolveError::Expression {
        name: name.to_string(),
        source,
    })
}

/// The variables an entry depends on
fn entry_dependencies(name: &str, entry: &Entry) -> Result<IndexSet<String>, ResolveError> {
    match entry {
        Entry::Expression(expr) => Ok(parse_for(name, expr)?.dependencies()),
        Entry::Template(text) => {
            let mut deps = IndexSet::new();
            // Embedded expressions which can't be parsed are left as text, so have no dependencies
            for caps in EMBEDDED_EXPRESSION.captures_iter(text) {
                if let Ok(expr) = Expr::parse(&caps[1]) {
                    deps.extend(expr.dependencies());
                }
            }
            Ok(deps)
        }
        Entry::Literal => Ok(IndexSet::new()),
    }
}

/// Substitute those embedded expressions whose dependencies are all resolved.
///
/// Embedded expressions which can't be parsed are left as text, with a warning.
///
/// Returns the new text and whether any expressions are still waiting on dependencies.
fn substitute_ready(
    name: &str,
    text: &str,
    resolved: &VariableMap,
) -> Result<(String, bool), ResolveError> {
    let mut pending = false;
    let mut error = None;
    let result = EMBEDDED_EXPRESSION.replace_all(text, |caps: &Captures| {
        let original = caps[0].to_string();
        let expr = match Expr::parse(&caps[1]) {
            Ok(expr) => expr,
            Err(err) => {
                warn!("Variable {name}: leaving '{original}' as text: {err}");
                return original;
            }
        };
        let outcome = if expr.dependencies().iter().all(|dep| resolved.contains_key(dep)) {
            literal_text(&expr, resolved)
                .unwrap_or_else(|| expr.eval(resolved).map(|value| value.to_string()))
                .map(Some)
                .map_err(|source| ResolveError::Expression {
                    name: name.to_string(),
                    source,
                })
        } else {
            Ok(None)
        };

        match outcome {
            Ok(Some(value)) => value,
            Ok(None) => {
                pending = true;
                original
            }
            Err(err) => {
                error.get_or_insert(err);
                original
            }
        }
    });

    match error {
        Some(err) => Err(err),
        None => Ok((result.into_owned(), pending)),
    }
}

/// Resolve a set of variables to concrete values.
///
/// Entries are repeatedly scanned, resolving each one whose dependencies have already been
/// resolved, until no further progress can be made. Forward references are allowed but cycles
/// are not.
///
/// # Arguments
///
/// * `raw` - Variables as written in the configuration
/// * `seed` - Pre-resolved values (e.g. built-in constants) which expressions may reference
///
/// # Returns
///
/// The seed values plus every resolved variable, or an error naming the references that could
/// not be resolved.
pub fn resolve_variables(raw: &VariableMap, seed: &VariableMap) -> Result<VariableMap, ResolveError> {
    let mut resolved = seed.clone();
    let mut unresolved = raw.clone();

    while !unresolved.is_empty() {
        let mut progress = false;
        let names: Vec<String> = unresolved.keys().cloned().collect();
        for name in names {
            let value = unresolved[&name].clone();
            match Entry::classify(&value) {
                Entry::Literal => {
                    unresolved.shift_remove(&name);
                    resolved.insert(name, value.clone());
                    progress = true;
                }
                Entry::Expression(expr) => {
                    let expr = parse_for(&name, expr)?;
                    if expr.dependencies().iter().all(|dep| resolved.contains_key(dep)) {
                        let value = match literal_reference(&expr, &resolved) {
                            Some(value) => value.clone(),
                            None => expr.eval(&resolved).map(number_to_value).map_err(
                                |source| ResolveError::Expression {
                                    name: name.clone(),
                                    source,
                                },
                            )?,
                        };
                        unresolved.shift_remove(&name);
                        resolved.insert(name, value);
                        progress = true;
                    }
                }
                Entry::Template(text) => {
                    let (result, pending) = substitute_ready(&name, text, &resolved)?;
                    if !pending {
                        unresolved.shift_remove(&name);
                        resolved.insert(name, coerce_numeric(result));
                        progress = true;
                    } else if result != text {
                        unresolved.insert(name, Value::String(result));
                        progress = true;
                    }
                }
            }
        }

        if !progress {
            let mut missing = IndexSet::new();
            for (name, value) in &unresolved {
                let deps = entry_dependencies(name, &Entry::classify(value))?;
                missing.extend(deps.into_iter().filter(|dep| !resolved.contains_key(dep)));
            }
            let mut names: Vec<String> = missing.into_iter().collect();
            names.sort();
            return Err(ResolveError::CircularOrUnresolvedReference { names });
        }
    }

    Ok(resolved)
}
