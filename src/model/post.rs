//! Guides, lore and news articles

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[default]
    Guide,
    Lore,
    News,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Guide => "guide",
            PostKind::Lore => "lore",
            PostKind::News => "news",
        }
    }
}

impl FromStr for PostKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "guide" | "guides" => Ok(PostKind::Guide),
            "lore" => Ok(PostKind::Lore),
            "news" => Ok(PostKind::News),
            _ => Err(Error::InvalidValue(format!("Unknown post kind: {}", s))),
        }
    }
}

impl std::fmt::Display for PostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A long-form HTML article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// HTML body as produced by the editor
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub kind: PostKind,
    #[serde(default)]
    pub published: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Tag names
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Post {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            slug: slug.into(),
            title: title.into(),
            summary: None,
            content: content.into(),
            kind: PostKind::Guide,
            published: false,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn published(mut self) -> Self {
        self.published = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        super::validate_slug(&self.slug)?;
        super::validate_not_empty("title", &self.title)?;
        for tag in &self.tags {
            super::validate_not_empty("tag", tag)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    /// Number of posts carrying the tag
    pub posts: usize,
}
