//! Weekly schedule persistence

use rusqlite::{params, OptionalExtension};
use crate::Result;
use crate::model::WeeklySchedule;
use super::sqlite::WikiStore;

const SCHEDULE_COLUMNS: &str = "id, title, day_of_week, start_time, end_time, description, sort_order";

impl WikiStore {
    /// The whole week, Monday first
    pub fn list_schedules(&self) -> Result<Vec<WeeklySchedule>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM weekly_schedules ORDER BY day_of_week, sort_order, start_time, id",
            SCHEDULE_COLUMNS
        ))?;
        let entries = stmt
            .query_map([], Self::row_to_schedule)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn get_schedule(&self, id: i64) -> Result<Option<WeeklySchedule>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM weekly_schedules WHERE id = ?1", SCHEDULE_COLUMNS),
                [id],
                Self::row_to_schedule,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Insert an entry and return it with its new id
    pub fn insert_schedule(&self, entry: &WeeklySchedule) -> Result<WeeklySchedule> {
        entry.validate()?;
        self.conn.execute(
            r#"
            INSERT INTO weekly_schedules (title, day_of_week, start_time, end_time, description, sort_order)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.title,
                entry.day_of_week,
                entry.start_time,
                entry.end_time,
                entry.description,
                entry.sort_order,
            ],
        )?;
        Ok(WeeklySchedule { id: self.conn.last_insert_rowid(), ..entry.clone() })
    }

    /// Update the entry with `entry.id`; false when it does not exist
    pub fn update_schedule(&self, entry: &WeeklySchedule) -> Result<bool> {
        entry.validate()?;
        let changed = self.conn.execute(
            r#"
            UPDATE weekly_schedules
            SET title = ?2, day_of_week = ?3, start_time = ?4, end_time = ?5, description = ?6, sort_order = ?7
            WHERE id = ?1
            "#,
            params![
                entry.id,
                entry.title,
                entry.day_of_week,
                entry.start_time,
                entry.end_time,
                entry.description,
                entry.sort_order,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_schedule(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM weekly_schedules WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    /// Drop every entry; used when an import replaces the week wholesale
    pub fn clear_schedules(&self) -> Result<()> {
        self.conn.execute("DELETE FROM weekly_schedules", [])?;
        Ok(())
    }

    fn row_to_schedule(row: &rusqlite::Row) -> rusqlite::Result<WeeklySchedule> {
        Ok(WeeklySchedule {
            id: row.get(0)?,
            title: row.get(1)?,
            day_of_week: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            description: row.get(5)?,
            sort_order: row.get(6)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;
    use crate::model::WeeklySchedule;
    use crate::storage::WikiStore;

    #[test]
    fn test_schedule_crud_and_order() {
        let store = WikiStore::open_in_memory().unwrap();
        store.insert_schedule(&WeeklySchedule::new("Sunday siege", 6, "20:00")).unwrap();
        let late = store.insert_schedule(&WeeklySchedule::new("Arena late", 0, "21:00")).unwrap();
        store.insert_schedule(&WeeklySchedule::new("Arena early", 0, "09:00")).unwrap();

        let titles: Vec<String> = store.list_schedules().unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["Arena early", "Arena late", "Sunday siege"]);

        let mut moved = late.clone();
        moved.day_of_week = 3;
        assert!(store.update_schedule(&moved).unwrap());
        assert_eq!(store.get_schedule(late.id).unwrap().unwrap().day_of_week, 3);

        assert!(store.delete_schedule(late.id).unwrap());
        assert!(!store.update_schedule(&moved).unwrap());
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let store = WikiStore::open_in_memory().unwrap();
        let err = store.insert_schedule(&WeeklySchedule::new("Bad", 9, "10:00")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
