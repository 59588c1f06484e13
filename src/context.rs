//! # Build Context
//!
//! Descriptors select their active parts with conditions over a small set of
//! named flags ("is this an editor build", "which platform", "which engine
//! era"). This module defines:
//!
//! - **`FlagSpec`** / **`ContextSchema`**: the flags a descriptor set may
//!   reference, each either a boolean or an enumeration of allowed values.
//! - **`FlagValue`**: a concrete value of a flag.
//! - **`Condition`**: a `when:` block, matched against a context.
//! - **`BuildContext`**: the externally supplied values for one resolution,
//!   typed against the schema with defaults filled in.
//!
//! A `BuildContext` is never stored on a descriptor; it is consulted once per
//! resolution session by the context filter phase.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Declaration of a single context flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum FlagSpec {
    /// A true/false switch such as `editor`.
    Bool {
        #[serde(default)]
        default: bool,
    },
    /// One of a fixed list of values such as `platform` or `engine`.
    Enum {
        values: Vec<String>,
        /// Defaults to the first entry of `values`.
        #[serde(default)]
        default: Option<String>,
    },
}

impl FlagSpec {
    /// The value a flag takes when the caller does not set it.
    pub fn default_value(&self) -> Option<FlagValue> {
        match self {
            FlagSpec::Bool { default } => Some(FlagValue::Bool(*default)),
            FlagSpec::Enum { values, default } => default
                .as_ref()
                .or_else(|| values.first())
                .map(|v| FlagValue::Text(v.clone())),
        }
    }

    /// Rejects declarations no context could satisfy: an enum without
    /// values, or a default outside the listed values.
    pub fn check(&self, flag: &str) -> Result<()> {
        let FlagSpec::Enum { values, default } = self else {
            return Ok(());
        };
        if values.is_empty() {
            return Err(Error::InvalidDescriptor {
                name: flag.to_string(),
                message: "enum flag declares no values".to_string(),
            });
        }
        match default {
            Some(default) if !values.contains(default) => Err(Error::InvalidDescriptor {
                name: flag.to_string(),
                message: format!("default '{}' is not {}", default, self.describe()),
            }),
            _ => Ok(()),
        }
    }

    /// Checks that `value` is something this flag can hold.
    fn admits(&self, value: &FlagValue) -> bool {
        match (self, value) {
            (FlagSpec::Bool { .. }, FlagValue::Bool(_)) => true,
            (FlagSpec::Enum { values, .. }, FlagValue::Text(text)) => values.contains(text),
            _ => false,
        }
    }

    fn describe(&self) -> String {
        match self {
            FlagSpec::Bool { .. } => "true or false".to_string(),
            FlagSpec::Enum { values, .. } => format!("one of [{}]", values.join(", ")),
        }
    }
}

/// All flags a descriptor set may reference, keyed by flag name.
pub type ContextSchema = BTreeMap<String, FlagSpec>;

/// A concrete flag value.
///
/// Descriptor files may write enum values as bare numbers (`engine: 5.4`);
/// those are read as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
}

impl<'de> Deserialize<'de> for FlagValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct FlagValueVisitor;

        impl serde::de::Visitor<'_> for FlagValueVisitor {
            type Value = FlagValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a boolean, string or number")
            }

            fn visit_bool<E: serde::de::Error>(self, v: bool) -> std::result::Result<FlagValue, E> {
                Ok(FlagValue::Bool(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<FlagValue, E> {
                Ok(FlagValue::Text(v.to_string()))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<FlagValue, E> {
                Ok(FlagValue::Text(v.to_string()))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<FlagValue, E> {
                Ok(FlagValue::Text(v.to_string()))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<FlagValue, E> {
                Ok(FlagValue::Text(v.to_string()))
            }
        }

        deserializer.deserialize_any(FlagValueVisitor)
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{}", b),
            FlagValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The right-hand side of a condition entry: one value or any of several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    One(FlagValue),
    AnyOf(Vec<FlagValue>),
}

impl ConditionValue {
    fn values(&self) -> &[FlagValue] {
        match self {
            ConditionValue::One(value) => std::slice::from_ref(value),
            ConditionValue::AnyOf(values) => values,
        }
    }
}

/// A `when:` block. Every listed flag must hold one of the listed values.
///
/// An empty condition always matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(pub BTreeMap<String, ConditionValue>);

impl Condition {
    /// Checks every flag and value in the condition against the schema.
    ///
    /// `owner` names the descriptor the condition belongs to and only
    /// appears in the error.
    pub fn validate(&self, schema: &ContextSchema, owner: &str) -> Result<()> {
        for (flag, expected) in &self.0 {
            let spec = schema.get(flag).ok_or_else(|| Error::UnknownConditional {
                owner: owner.to_string(),
                flag: flag.clone(),
                detail: "is not declared in the context schema".to_string(),
            })?;
            if expected.values().is_empty() {
                return Err(Error::UnknownConditional {
                    owner: owner.to_string(),
                    flag: flag.clone(),
                    detail: format!("lists no values (expected {})", spec.describe()),
                });
            }
            if let Some(bad) = expected.values().iter().find(|v| !spec.admits(v)) {
                return Err(Error::UnknownConditional {
                    owner: owner.to_string(),
                    flag: flag.clone(),
                    detail: format!("cannot be '{}' (expected {})", bad, spec.describe()),
                });
            }
        }
        Ok(())
    }

    /// Evaluates the condition. Assumes it passed `validate`.
    pub fn matches(&self, context: &BuildContext) -> bool {
        self.0.iter().all(|(flag, expected)| {
            context
                .get(flag)
                .is_some_and(|actual| expected.values().contains(actual))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(flag, value)| match value {
                ConditionValue::One(v) => format!("{}={}", flag, v),
                ConditionValue::AnyOf(vs) => format!(
                    "{}=[{}]",
                    flag,
                    vs.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("|")
                ),
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Flag values for one resolution session.
///
/// Always complete with respect to the schema it was built from: every
/// declared flag has a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildContext {
    values: BTreeMap<String, FlagValue>,
}

impl BuildContext {
    /// Builds a context from `(flag, raw value)` pairs, filling the rest with
    /// schema defaults.
    ///
    /// Raw values are typed by the flag's spec: booleans accept `true`/`false`
    /// (also `1`/`0`, `yes`/`no`, `on`/`off`), enums accept their listed values.
    pub fn from_assignments<'s, I>(schema: &ContextSchema, assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'s str, &'s str)>,
    {
        let mut values = BTreeMap::new();
        for (flag, spec) in schema {
            if let Some(default) = spec.default_value() {
                values.insert(flag.clone(), default);
            }
        }

        let mut assigned = BTreeSet::new();
        for (flag, raw) in assignments {
            if !assigned.insert(flag) {
                return Err(Error::UnknownConditional {
                    owner: "build context".to_string(),
                    flag: flag.to_string(),
                    detail: "is assigned more than once".to_string(),
                });
            }
            let spec = schema.get(flag).ok_or_else(|| Error::UnknownConditional {
                owner: "build context".to_string(),
                flag: flag.to_string(),
                detail: "is not declared in the context schema".to_string(),
            })?;
            let value = match spec {
                FlagSpec::Bool { .. } => parse_bool(raw).map(FlagValue::Bool),
                FlagSpec::Enum { .. } => Some(FlagValue::Text(raw.to_string())),
            };
            match value {
                Some(value) if spec.admits(&value) => {
                    values.insert(flag.to_string(), value);
                }
                _ => {
                    return Err(Error::UnknownConditional {
                        owner: "build context".to_string(),
                        flag: flag.to_string(),
                        detail: format!("cannot be '{}' (expected {})", raw, spec.describe()),
                    })
                }
            }
        }

        Ok(Self { values })
    }

    /// Builds the all-defaults context for a schema.
    pub fn defaults(schema: &ContextSchema) -> Self {
        let values = schema
            .iter()
            .filter_map(|(flag, spec)| spec.default_value().map(|v| (flag.clone(), v)))
            .collect();
        Self { values }
    }

    /// Every context the schema admits, in a stable order.
    ///
    /// Used by `validate --all-contexts`; the count is the product of the
    /// number of values of each flag.
    pub fn enumerate(schema: &ContextSchema) -> Vec<Self> {
        let mut contexts = vec![BTreeMap::new()];
        for (flag, spec) in schema {
            let choices: Vec<FlagValue> = match spec {
                FlagSpec::Bool { .. } => vec![FlagValue::Bool(false), FlagValue::Bool(true)],
                FlagSpec::Enum { values, .. } => {
                    values.iter().cloned().map(FlagValue::Text).collect()
                }
            };
            contexts = contexts
                .into_iter()
                .flat_map(|partial| {
                    choices.iter().map(move |choice| {
                        let mut next = partial.clone();
                        next.insert(flag.clone(), choice.clone());
                        next
                    })
                })
                .collect();
        }
        contexts.into_iter().map(|values| Self { values }).collect()
    }

    pub fn get(&self, flag: &str) -> Option<&FlagValue> {
        self.values.get(flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The context as `flag -> rendered value`, the shape used in plans.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

impl fmt::Display for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Splits a `KEY=VALUE` command-line assignment.
pub fn parse_assignment(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(Error::ConfigParse {
            message: format!("Invalid context assignment '{}'", raw),
            hint: Some("Use KEY=VALUE, for example --set editor=true".to_string()),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
