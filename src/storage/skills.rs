//! Skill persistence

use rusqlite::{params, OptionalExtension};
use crate::Result;
use crate::model::Skill;
use super::sqlite::{json_column, to_json, WikiStore};

const SKILL_COLUMNS: &str = "id, slug, name, icon, description, max_level, level_values, skill_type_id";

impl WikiStore {
    pub fn insert_skill(&self, skill: &Skill) -> Result<i64> {
        skill.validate()?;
        self.conn.execute(
            r#"
            INSERT INTO skills (slug, name, icon, description, max_level, level_values, skill_type_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                skill.slug,
                skill.name,
                skill.icon,
                skill.description,
                skill.max_level,
                to_json(&skill.level_values)?,
                skill.skill_type_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert or update a skill keyed by slug
    pub fn upsert_skill(&self, skill: &Skill) -> Result<i64> {
        skill.validate()?;
        let id = self.conn.query_row(
            r#"
            INSERT INTO skills (slug, name, icon, description, max_level, level_values, skill_type_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(slug) DO UPDATE SET
                name = excluded.name,
                icon = excluded.icon,
                description = excluded.description,
                max_level = excluded.max_level,
                level_values = excluded.level_values,
                skill_type_id = excluded.skill_type_id
            RETURNING id
            "#,
            params![
                skill.slug,
                skill.name,
                skill.icon,
                skill.description,
                skill.max_level,
                to_json(&skill.level_values)?,
                skill.skill_type_id,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get_skill(&self, id: i64) -> Result<Option<Skill>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM skills WHERE id = ?1", SKILL_COLUMNS),
                [id],
                Self::row_to_skill,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_skill_by_slug(&self, slug: &str) -> Result<Option<Skill>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM skills WHERE slug = ?1", SKILL_COLUMNS),
                [slug],
                Self::row_to_skill,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_skills(&self) -> Result<Vec<Skill>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM skills ORDER BY name", SKILL_COLUMNS))?;
        let skills = stmt
            .query_map([], Self::row_to_skill)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(skills)
    }

    /// Search skills by name or description (LIKE query)
    pub fn search_skills(&self, query: &str, limit: usize) -> Result<Vec<Skill>> {
        let pattern = format!("%{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM skills WHERE name LIKE ?1 OR description LIKE ?1 ORDER BY name LIMIT ?2",
            SKILL_COLUMNS
        ))?;
        let skills = stmt
            .query_map(params![pattern, limit as i64], Self::row_to_skill)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(skills)
    }

    pub fn update_skill(&self, skill: &Skill) -> Result<bool> {
        skill.validate()?;
        let changed = self.conn.execute(
            r#"
            UPDATE skills
            SET slug = ?2, name = ?3, icon = ?4, description = ?5, max_level = ?6,
                level_values = ?7, skill_type_id = ?8
            WHERE id = ?1
            "#,
            params![
                skill.id,
                skill.slug,
                skill.name,
                skill.icon,
                skill.description,
                skill.max_level,
                to_json(&skill.level_values)?,
                skill.skill_type_id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_skill(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM skills WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub(super) fn row_to_skill(row: &rusqlite::Row) -> rusqlite::Result<Skill> {
        Ok(Skill {
            id: row.get(0)?,
            slug: row.get(1)?,
            name: row.get(2)?,
            icon: row.get(3)?,
            description: row.get(4)?,
            max_level: row.get(5)?,
            level_values: json_column(row, 6)?,
            skill_type_id: row.get(7)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{EntityType, Skill, TypeCategory};
    use crate::storage::WikiStore;

    fn shield_bash() -> Skill {
        Skill::new("shield-bash", "Shield Bash", "Stuns for {stun} sec", 3)
            .with_value(1, "stun", 1.0)
            .with_value(2, "stun", 1.5)
            .with_value(3, "stun", 2.0)
    }

    #[test]
    fn test_skill_roundtrip_keeps_level_values() {
        let store = WikiStore::open_in_memory().unwrap();
        let skill = shield_bash();
        let id = store.insert_skill(&skill).unwrap();

        let loaded = store.get_skill_by_slug("shield-bash").unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.level_values, skill.level_values);
        assert_eq!(loaded.max_level, 3);
    }

    #[test]
    fn test_upsert_skill() {
        let store = WikiStore::open_in_memory().unwrap();
        let id = store.upsert_skill(&shield_bash()).unwrap();

        let mut changed = shield_bash();
        changed.max_level = 4;
        assert_eq!(store.upsert_skill(&changed).unwrap(), id);
        assert_eq!(store.get_skill(id).unwrap().unwrap().max_level, 4);
        assert_eq!(store.list_skills().unwrap().len(), 1);
    }

    #[test]
    fn test_search_skills() {
        let store = WikiStore::open_in_memory().unwrap();
        store.insert_skill(&shield_bash()).unwrap();
        store.insert_skill(&Skill::new("heal", "Heal", "Restores health", 1)).unwrap();

        let found = store.search_skills("stun", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "shield-bash");
    }

    #[test]
    fn test_deleting_type_clears_reference() {
        let store = WikiStore::open_in_memory().unwrap();
        let type_id = store.upsert_type(&EntityType::new(TypeCategory::Skill, "active")).unwrap();
        let mut skill = shield_bash();
        skill.skill_type_id = Some(type_id);
        let id = store.insert_skill(&skill).unwrap();

        assert!(store.delete_type(type_id).unwrap());
        assert_eq!(store.get_skill(id).unwrap().unwrap().skill_type_id, None);
    }
}
