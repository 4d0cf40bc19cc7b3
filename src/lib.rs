//! # Warspear Wiki - content backend
//!
//! Serves the game data behind the Warspear Online wiki.
//!
//! Warspear Wiki provides:
//! - Domain records for classes, skills, talents, items, guides and events
//! - A description formatter that expands per-level values (with PvP variants)
//! - A fixed-grid talent tree renderer
//! - SQLite-backed storage with bulk JSON import
//! - An HTTP API, a local media browser and a cron-driven news sync job

pub mod model;
pub mod html;
pub mod describe;
pub mod talent_grid;
pub mod storage;
pub mod import;
pub mod media;
pub mod sync;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use describe::{format_description, FormattedDescription, Segment};
pub use model::{Event, GameClass, Item, LevelValues, Post, Skill, Talent, WeeklySchedule};
pub use storage::WikiStore;
pub use talent_grid::{Grid, RenderedCell, SlotKind, TalentTree};

/// Result type alias for wiki operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for wiki operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl Error {
    /// True when the underlying SQLite error is a UNIQUE/FOREIGN KEY violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Error::Storage(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
