//! Domain records - the content shown on the wiki
//!
//! Every record carries an `id` assigned by the database. Records built for
//! insertion use `id: 0`; the store fills in the real id.

pub mod class;
pub mod skill;
pub mod item;
pub mod post;
pub mod schedule;
pub mod event;

pub use class::{Faction, GameClass};
pub use event::Event;
pub use item::{EntityType, Item, TypeCategory};
pub use post::{Post, PostKind, Tag};
pub use schedule::WeeklySchedule;
pub use skill::{LevelValues, Skill, Talent, MAX_LEVEL};

use crate::{Error, Result};

/// Slugs are lower-case ASCII letters, digits and dashes.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(Error::Validation("slug must not be empty".to_string()));
    }
    if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(Error::Validation(format!(
            "slug '{}' may only contain a-z, 0-9 and '-'",
            slug
        )));
    }
    Ok(())
}

pub(crate) fn validate_not_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Derive a slug from a display name ("Blade Dancer" -> "blade-dancer")
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("blade-dancer").is_ok());
        assert!(validate_slug("warden2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Blade Dancer").is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Blade Dancer"), "blade-dancer");
        assert_eq!(slugify("  Death Knight!! "), "death-knight");
        assert_eq!(slugify("Arena 2x2"), "arena-2x2");
    }
}
