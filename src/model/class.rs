//! Playable classes

use crate::talent_grid::TalentTree;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The two factions every class belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Chosen,
    Forsaken,
}

impl Faction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Faction::Chosen => "chosen",
            Faction::Forsaken => "forsaken",
        }
    }
}

impl FromStr for Faction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "chosen" => Ok(Faction::Chosen),
            "forsaken" => Ok(Faction::Forsaken),
            _ => Err(Error::InvalidValue(format!("Unknown faction: {}", s))),
        }
    }
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A playable class (Blade Dancer, Warden, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameClass {
    #[serde(default)]
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub faction: Faction,
    /// Free-form role label ("tank", "healer", "melee dps")
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Talent layout, absent until someone fills it in
    #[serde(default)]
    pub talent_tree: Option<TalentTree>,
}

impl GameClass {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, faction: Faction) -> Self {
        Self {
            id: 0,
            slug: slug.into(),
            name: name.into(),
            faction,
            role: None,
            description: String::new(),
            icon: None,
            talent_tree: None,
        }
    }

    pub fn with_talent_tree(mut self, tree: TalentTree) -> Self {
        self.talent_tree = Some(tree);
        self
    }

    pub fn validate(&self) -> Result<()> {
        super::validate_slug(&self.slug)?;
        super::validate_not_empty("name", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faction_parse() {
        assert_eq!(Faction::from_str("Chosen").unwrap(), Faction::Chosen);
        assert_eq!(Faction::from_str("FORSAKEN").unwrap(), Faction::Forsaken);
        assert!(Faction::from_str("neutral").is_err());
    }

    #[test]
    fn test_class_deserialize_defaults() {
        let class: GameClass = serde_json::from_str(
            r#"{"slug": "warden", "name": "Warden", "faction": "chosen"}"#,
        )
        .unwrap();
        assert_eq!(class.id, 0);
        assert!(class.talent_tree.is_none());
        assert!(class.validate().is_ok());
    }
}
