//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - classes, skills, class_skills, talents
//! - types, items
//! - posts, tags, post_tags
//! - weekly_schedules, events

pub mod schema;
pub mod sqlite;
mod classes;
mod skills;
mod items;
mod posts;
mod schedules;
mod events;

pub use posts::PostFilter;
pub use sqlite::{DbStats, WikiStore};
