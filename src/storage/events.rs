//! Synced news event persistence

use rusqlite::{params, OptionalExtension};
use crate::Result;
use crate::model::Event;
use super::sqlite::WikiStore;

const EVENT_COLUMNS: &str = "id, external_id, title, content, original_title, link, published_at, created_at";

impl WikiStore {
    /// Insert unless an event with the same external id exists.
    ///
    /// Returns true when a row was inserted.
    pub fn insert_event_if_new(&self, event: &Event) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO events (external_id, title, content, original_title, link, published_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                event.external_id,
                event.title,
                event.content,
                event.original_title,
                event.link,
                event.published_at,
                event.created_at,
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn event_exists(&self, external_id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT id FROM events WHERE external_id = ?1", [external_id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_event(&self, id: i64) -> Result<Option<Event>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS),
                [id],
                Self::row_to_event,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Newest first (by publication date, falling back to sync time)
    pub fn list_events(&self, limit: usize) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM events ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ?1",
            EVENT_COLUMNS
        ))?;
        let events = stmt
            .query_map([limit as i64], Self::row_to_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    pub fn delete_event(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM events WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<Event> {
        Ok(Event {
            id: row.get(0)?,
            external_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            original_title: row.get(4)?,
            link: row.get(5)?,
            published_at: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}
