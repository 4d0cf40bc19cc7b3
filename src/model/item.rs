//! Items and the type catalogue shared by skills and items

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a type row classifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCategory {
    Skill,
    Item,
}

impl TypeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeCategory::Skill => "skill",
            TypeCategory::Item => "item",
        }
    }
}

impl FromStr for TypeCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "skill" => Ok(TypeCategory::Skill),
            "item" => Ok(TypeCategory::Item),
            _ => Err(Error::InvalidValue(format!("Unknown type category: {}", s))),
        }
    }
}

impl std::fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named type ("active", "passive", "weapon", "armor", ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    #[serde(default)]
    pub id: i64,
    pub category: TypeCategory,
    pub name: String,
}

impl EntityType {
    pub fn new(category: TypeCategory, name: impl Into<String>) -> Self {
        Self { id: 0, category, name: name.into() }
    }

    pub fn validate(&self) -> Result<()> {
        super::validate_not_empty("name", &self.name)
    }
}

/// A game item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub item_type_id: Option<i64>,
    /// Required character level
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl Item {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            slug: slug.into(),
            name: name.into(),
            icon: None,
            item_type_id: None,
            level: None,
            rarity: None,
            description: String::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        super::validate_slug(&self.slug)?;
        super::validate_not_empty("name", &self.name)
    }
}
