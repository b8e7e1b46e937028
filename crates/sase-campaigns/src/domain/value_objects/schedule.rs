//! Schedule descriptor

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    #[default]
    Now,
    Later,
    Draft,
}

/// Editable schedule; `Later` may be missing its date or time until validated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub mode: ScheduleMode,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<NaiveTime>,
}

impl ScheduleDraft {
    pub fn now() -> Self {
        Self::default()
    }

    pub fn later(date: NaiveDate, time: NaiveTime) -> Self {
        Self { mode: ScheduleMode::Later, date: Some(date), time: Some(time) }
    }

    pub fn draft() -> Self {
        Self { mode: ScheduleMode::Draft, ..Self::default() }
    }

    /// Combined send instant, interpreted as UTC.
    pub fn send_at(&self) -> Option<DateTime<Utc>> {
        match (self.date, self.time) {
            (Some(date), Some(time)) => Some(date.and_time(time).and_utc()),
            _ => None,
        }
    }
}

/// Validated schedule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "at", rename_all = "snake_case")]
pub enum Schedule {
    Now,
    Later(DateTime<Utc>),
    Draft,
}

impl Schedule {
    pub fn mode(&self) -> ScheduleMode {
        match self {
            Self::Now => ScheduleMode::Now,
            Self::Later(_) => ScheduleMode::Later,
            Self::Draft => ScheduleMode::Draft,
        }
    }
}
