//! Skills and talents
//!
//! Both carry a description template plus a per-level value table that the
//! [`crate::describe`] formatter expands.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-level parameter table: level -> (parameter key -> value).
///
/// Stored as JSON, e.g. `{"1": {"damage": 10, "damage_pvp": 8}, "2": {...}}`.
pub type LevelValues = BTreeMap<u32, BTreeMap<String, f64>>;

/// Highest level a skill or talent may declare
pub const MAX_LEVEL: u32 = 100;

/// A class skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default)]
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Description template with `{key}` placeholders
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    #[serde(default)]
    pub level_values: LevelValues,
    #[serde(default)]
    pub skill_type_id: Option<i64>,
}

impl Skill {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, description: impl Into<String>, max_level: u32) -> Self {
        Self {
            id: 0,
            slug: slug.into(),
            name: name.into(),
            icon: None,
            description: description.into(),
            max_level,
            level_values: LevelValues::new(),
            skill_type_id: None,
        }
    }

    /// Set the value of `key` at `level`
    pub fn with_value(mut self, level: u32, key: &str, value: f64) -> Self {
        self.level_values.entry(level).or_default().insert(key.to_string(), value);
        self
    }

    pub fn validate(&self) -> Result<()> {
        super::validate_slug(&self.slug)?;
        super::validate_not_empty("name", &self.name)?;
        validate_max_level(self.max_level)
    }
}

/// A talent in a class talent tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Talent {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub class_id: i64,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    #[serde(default)]
    pub level_values: LevelValues,
}

impl Talent {
    pub fn new(class_id: i64, name: impl Into<String>, description: impl Into<String>, max_level: u32) -> Self {
        Self {
            id: 0,
            class_id,
            name: name.into(),
            icon: None,
            description: description.into(),
            max_level,
            level_values: LevelValues::new(),
        }
    }

    pub fn with_value(mut self, level: u32, key: &str, value: f64) -> Self {
        self.level_values.entry(level).or_default().insert(key.to_string(), value);
        self
    }

    pub fn validate(&self) -> Result<()> {
        super::validate_not_empty("name", &self.name)?;
        validate_max_level(self.max_level)
    }
}

fn default_max_level() -> u32 {
    1
}

fn validate_max_level(max_level: u32) -> Result<()> {
    if max_level == 0 || max_level > MAX_LEVEL {
        return Err(Error::Validation(format!(
            "max_level must be between 1 and {}, got {}",
            MAX_LEVEL, max_level
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_values_from_json() {
        let skill: Skill = serde_json::from_str(
            r#"{
                "slug": "shield-bash",
                "name": "Shield Bash",
                "description": "Deals {damage} damage",
                "max_level": 2,
                "level_values": {"1": {"damage": 10}, "2": {"damage": 20.5}}
            }"#,
        )
        .unwrap();
        assert_eq!(skill.level_values[&2]["damage"], 20.5);
        assert!(skill.validate().is_ok());
    }

    #[test]
    fn test_zero_max_level_rejected() {
        let talent = Talent::new(1, "Fury", "", 0);
        assert!(matches!(talent.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_max_level_upper_bound() {
        assert!(Skill::new("x", "X", "{d}", MAX_LEVEL).validate().is_ok());
        let err = Skill::new("x", "X", "{d}", u32::MAX).validate().unwrap_err();
        assert_eq!(err.to_string(), format!("Validation failed: max_level must be between 1 and 100, got {}", u32::MAX));
    }
}
