//! Filter by event severity code

use super::Filter;
use crate::core::{Event, LoggerError, Result};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Comparison applied as `event.priority <op> threshold`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    Lt,
    #[default]
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Operator {
    pub fn compare(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            Operator::Lt => lhs < rhs,
            Operator::Le => lhs <= rhs,
            Operator::Gt => lhs > rhs,
            Operator::Ge => lhs >= rhs,
            Operator::Eq => lhs == rhs,
            Operator::Ne => lhs != rhs,
        }
    }
}

impl FromStr for Operator {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "<" | "lt" => Ok(Operator::Lt),
            "<=" | "le" => Ok(Operator::Le),
            ">" | "gt" => Ok(Operator::Gt),
            ">=" | "ge" => Ok(Operator::Ge),
            "==" | "=" | "eq" => Ok(Operator::Eq),
            "!=" | "<>" | "ne" => Ok(Operator::Ne),
            _ => Err(LoggerError::invalid_argument(format!(
                "Unknown comparison operator \"{}\"",
                s
            ))),
        }
    }
}

/// Options accepted by [`PriorityFilter`]
#[derive(Debug, Clone, Deserialize)]
pub struct PriorityFilterConfig {
    #[serde(deserialize_with = "int_or_digits")]
    pub priority: i64,
    #[serde(default)]
    pub operator: Option<String>,
}

fn int_or_digits<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom("Priority must be a number, received \"double\"")),
        serde_json::Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
            .parse()
            .map_err(|_| D::Error::custom(format!("Priority must be a number, received \"{}\"", s))),
        other => Err(D::Error::custom(format!(
            "Priority must be a number, received \"{}\"",
            crate::core::FieldValue::from(other).type_label()
        ))),
    }
}

/// Accepts events whose priority compares true against a threshold.
///
/// With the default `<=` operator this accepts everything at least as
/// severe as the threshold.
#[derive(Debug, Clone)]
pub struct PriorityFilter {
    priority: i64,
    operator: Operator,
}

impl PriorityFilter {
    pub fn new(priority: i64) -> Self {
        Self {
            priority,
            operator: Operator::default(),
        }
    }

    #[must_use]
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn from_config(config: PriorityFilterConfig) -> Result<Self> {
        let operator = match config.operator.as_deref() {
            Some(op) => op.parse()?,
            None => Operator::default(),
        };
        Ok(Self::new(config.priority).with_operator(operator))
    }

    pub fn from_options(options: &serde_json::Value) -> Result<Self> {
        let config = PriorityFilterConfig::deserialize(options)
            .map_err(|e| LoggerError::invalid_options("priority filter", e))?;
        Self::from_config(config)
    }
}

impl Filter for PriorityFilter {
    fn filter(&self, event: &Event) -> bool {
        self.operator.compare(event.priority, self.priority)
    }
}
