//! Batch-scheduler notification types.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{DriverError, ErrorInfo};

/// Events for which the scheduler sends a notification email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailType {
    /// No notifications.
    None,
    /// Job start.
    Begin,
    /// Job end.
    End,
    /// Job failure.
    Fail,
    /// Job requeue.
    Requeue,
    /// Burst buffer stage out and teardown completed.
    StageOut,
    /// Every event.
    All,
    /// Time limit reached.
    TimeLimit,
    /// 90 percent of the time limit reached.
    TimeLimit90,
    /// 80 percent of the time limit reached.
    TimeLimit80,
    /// 50 percent of the time limit reached.
    TimeLimit50,
    /// One email per array task.
    ArrayTasks,
}

impl EmailType {
    /// Every notification type, in declaration order.
    pub const ALL_TYPES: [EmailType; 12] = [
        EmailType::None,
        EmailType::Begin,
        EmailType::End,
        EmailType::Fail,
        EmailType::Requeue,
        EmailType::StageOut,
        EmailType::All,
        EmailType::TimeLimit,
        EmailType::TimeLimit90,
        EmailType::TimeLimit80,
        EmailType::TimeLimit50,
        EmailType::ArrayTasks,
    ];

    /// Declared names, usable as enumerant variants.
    pub const NAMES: &'static [&'static str] = &[
        "NONE",
        "BEGIN",
        "END",
        "FAIL",
        "REQUEUE",
        "STAGE_OUT",
        "ALL",
        "TIME_LIMIT",
        "TIME_LIMIT_90",
        "TIME_LIMIT_80",
        "TIME_LIMIT_50",
        "ARRAY_TASKS",
    ];

    /// Returns the directive value for the notification type.
    pub fn name(&self) -> &'static str {
        match self {
            EmailType::None => "NONE",
            EmailType::Begin => "BEGIN",
            EmailType::End => "END",
            EmailType::Fail => "FAIL",
            EmailType::Requeue => "REQUEUE",
            EmailType::StageOut => "STAGE_OUT",
            EmailType::All => "ALL",
            EmailType::TimeLimit => "TIME_LIMIT",
            EmailType::TimeLimit90 => "TIME_LIMIT_90",
            EmailType::TimeLimit80 => "TIME_LIMIT_80",
            EmailType::TimeLimit50 => "TIME_LIMIT_50",
            EmailType::ArrayTasks => "ARRAY_TASKS",
        }
    }
}

impl Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmailType {
    type Err = DriverError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EmailType::ALL_TYPES
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                DriverError::TypeCoercion(
                    ErrorInfo::new("unknown_email_type", format!("unrecognized email type \"{value}\""))
                        .with_context("value", value)
                        .with_hint(format!("must be one of {}", EmailType::NAMES.join(", "))),
                )
            })
    }
}
