use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// A single submitted utilization record. Entries are append-only: nothing in
/// the service updates or deletes one once it has been written.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UtilizationEntry {
    pub id: Uuid,
    pub user: String,
    pub project: String,
    pub description: Option<String>,
    pub week_ending: NaiveDate,
    pub value: EntryValue,
    pub submitted_at: DateTime<Utc>,
}

/// The two entry schemas seen across deployments: raw hours against a weekly
/// capacity, or a percentage of available time. A deployment runs exactly one
/// of them (see [`ValueSchema`]); keeping the value tagged lets a single
/// aggregation path serve both.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum EntryValue {
    Hours(f64),
    Percentage(f64),
}

impl EntryValue {
    pub fn amount(&self) -> f64 {
        match self {
            EntryValue::Hours(amount) | EntryValue::Percentage(amount) => *amount,
        }
    }

    /// Validates a submitted value against the active schema. Runs before the
    /// entry reaches the store; a rejected value is never persisted.
    pub fn validate(&self, schema: &ValueSchema) -> Result<(), AppError> {
        let amount = self.amount();
        if !amount.is_finite() || amount < 0.0 {
            return Err(AppError::Validation(format!(
                "value must be a non-negative number, got {}",
                amount
            )));
        }
        match (self, schema) {
            (EntryValue::Hours(hours), ValueSchema::Hours { weekly_capacity }) => {
                if hours > weekly_capacity {
                    return Err(AppError::Validation(format!(
                        "hours {} exceed the weekly capacity of {}",
                        hours, weekly_capacity
                    )));
                }
            }
            (EntryValue::Percentage(percentage), ValueSchema::Percentage) => {
                if *percentage > 100.0 {
                    return Err(AppError::Validation(format!(
                        "percentage {} exceeds 100",
                        percentage
                    )));
                }
            }
            _ => {
                return Err(AppError::Validation(
                    "entry value does not match the configured schema".to_string(),
                ))
            }
        }
        Ok(())
    }
}

/// Which value schema a deployment accepts, built from configuration. Only
/// one schema is active at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueSchema {
    Hours { weekly_capacity: f64 },
    Percentage,
}
