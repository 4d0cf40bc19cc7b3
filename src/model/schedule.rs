//! Weekly in-game schedule (arenas, bosses, sieges)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

const DAY_NAMES: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

/// One recurring entry of the weekly schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u8,
    /// `HH:MM`, server time
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

impl WeeklySchedule {
    pub fn new(title: impl Into<String>, day_of_week: u8, start_time: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            day_of_week,
            start_time: start_time.into(),
            end_time: None,
            description: None,
            sort_order: 0,
        }
    }

    pub fn day_name(&self) -> &'static str {
        DAY_NAMES.get(self.day_of_week as usize).copied().unwrap_or("?")
    }

    pub fn validate(&self) -> Result<()> {
        super::validate_not_empty("title", &self.title)?;
        if self.day_of_week > 6 {
            return Err(Error::Validation(format!(
                "day_of_week must be 0..=6, got {}",
                self.day_of_week
            )));
        }
        validate_time("start_time", &self.start_time)?;
        if let Some(end) = &self.end_time {
            validate_time("end_time", end)?;
        }
        Ok(())
    }
}

/// Accepts `HH:MM` with a 24h clock
fn validate_time(field: &str, value: &str) -> Result<()> {
    let invalid = || Error::Validation(format!("{} must be HH:MM, got '{}'", field, value));

    let (hours, minutes) = value.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: u8 = hours.parse().map_err(|_| invalid())?;
    let minutes: u8 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(())
}
