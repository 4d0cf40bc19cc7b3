//! Class, class-skill link and talent persistence

use rusqlite::{params, OptionalExtension};
use crate::Result;
use crate::model::{GameClass, Skill, Talent};
use crate::talent_grid::TalentTree;
use super::sqlite::{enum_column, json_column, optional_json_column, to_json, WikiStore};

const CLASS_COLUMNS: &str = "id, slug, name, faction, role, description, icon, talent_tree";
const TALENT_COLUMNS: &str = "id, class_id, name, icon, description, max_level, level_values";

impl WikiStore {
    // ========== Class Operations ==========

    /// Insert a class, returning its id
    pub fn insert_class(&self, class: &GameClass) -> Result<i64> {
        class.validate()?;
        let tree = class.talent_tree.as_ref().map(to_json).transpose()?;
        self.conn.execute(
            r#"
            INSERT INTO classes (slug, name, faction, role, description, icon, talent_tree)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                class.slug,
                class.name,
                class.faction.as_str(),
                class.role,
                class.description,
                class.icon,
                tree,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert or update a class keyed by slug, returning its id
    pub fn upsert_class(&self, class: &GameClass) -> Result<i64> {
        class.validate()?;
        let tree = class.talent_tree.as_ref().map(to_json).transpose()?;
        let id = self.conn.query_row(
            r#"
            INSERT INTO classes (slug, name, faction, role, description, icon, talent_tree)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(slug) DO UPDATE SET
                name = excluded.name,
                faction = excluded.faction,
                role = excluded.role,
                description = excluded.description,
                icon = excluded.icon,
                talent_tree = COALESCE(excluded.talent_tree, classes.talent_tree)
            RETURNING id
            "#,
            params![
                class.slug,
                class.name,
                class.faction.as_str(),
                class.role,
                class.description,
                class.icon,
                tree,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get_class(&self, id: i64) -> Result<Option<GameClass>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM classes WHERE id = ?1", CLASS_COLUMNS),
                [id],
                Self::row_to_class,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_class_by_slug(&self, slug: &str) -> Result<Option<GameClass>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM classes WHERE slug = ?1", CLASS_COLUMNS),
                [slug],
                Self::row_to_class,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All classes, grouped by faction
    pub fn list_classes(&self) -> Result<Vec<GameClass>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM classes ORDER BY faction, name", CLASS_COLUMNS))?;
        let classes = stmt
            .query_map([], Self::row_to_class)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(classes)
    }

    /// Update a class by id; false when no such class
    pub fn update_class(&self, class: &GameClass) -> Result<bool> {
        class.validate()?;
        let tree = class.talent_tree.as_ref().map(to_json).transpose()?;
        let changed = self.conn.execute(
            r#"
            UPDATE classes
            SET slug = ?2, name = ?3, faction = ?4, role = ?5, description = ?6, icon = ?7, talent_tree = ?8
            WHERE id = ?1
            "#,
            params![
                class.id,
                class.slug,
                class.name,
                class.faction.as_str(),
                class.role,
                class.description,
                class.icon,
                tree,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Replace a class' talent layout
    pub fn set_talent_tree(&self, class_id: i64, tree: &TalentTree) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE classes SET talent_tree = ?2 WHERE id = ?1",
            params![class_id, to_json(tree)?],
        )?;
        Ok(changed > 0)
    }

    /// Delete a class together with its talents and skill links
    pub fn delete_class(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM classes WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    fn row_to_class(row: &rusqlite::Row) -> rusqlite::Result<GameClass> {
        Ok(GameClass {
            id: row.get(0)?,
            slug: row.get(1)?,
            name: row.get(2)?,
            faction: enum_column(row, 3)?,
            role: row.get(4)?,
            description: row.get(5)?,
            icon: row.get(6)?,
            talent_tree: optional_json_column(row, 7)?,
        })
    }

    // ========== Class <-> Skill Links ==========

    pub fn link_class_skill(&self, class_id: i64, skill_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO class_skills (class_id, skill_id) VALUES (?1, ?2)",
            params![class_id, skill_id],
        )?;
        Ok(())
    }

    pub fn unlink_class_skill(&self, class_id: i64, skill_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM class_skills WHERE class_id = ?1 AND skill_id = ?2",
            params![class_id, skill_id],
        )?;
        Ok(changed > 0)
    }

    /// Skills of a class, by name
    pub fn skills_for_class(&self, class_id: i64) -> Result<Vec<Skill>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.slug, s.name, s.icon, s.description, s.max_level, s.level_values, s.skill_type_id
            FROM skills s
            JOIN class_skills cs ON cs.skill_id = s.id
            WHERE cs.class_id = ?1
            ORDER BY s.name
            "#,
        )?;
        let skills = stmt
            .query_map([class_id], Self::row_to_skill)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(skills)
    }

    /// Classes that can use a skill
    pub fn classes_for_skill(&self, skill_id: i64) -> Result<Vec<GameClass>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT c.id, c.slug, c.name, c.faction, c.role, c.description, c.icon, c.talent_tree
            FROM classes c
            JOIN class_skills cs ON cs.class_id = c.id
            WHERE cs.skill_id = ?1
            ORDER BY c.name
            "#,
        )?;
        let classes = stmt
            .query_map([skill_id], Self::row_to_class)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(classes)
    }

    // ========== Talent Operations ==========

    pub fn insert_talent(&self, talent: &Talent) -> Result<i64> {
        talent.validate()?;
        self.conn.execute(
            r#"
            INSERT INTO talents (class_id, name, icon, description, max_level, level_values)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                talent.class_id,
                talent.name,
                talent.icon,
                talent.description,
                talent.max_level,
                to_json(&talent.level_values)?,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert or update a talent keyed by (class, name)
    pub fn upsert_talent(&self, talent: &Talent) -> Result<i64> {
        talent.validate()?;
        let id = self.conn.query_row(
            r#"
            INSERT INTO talents (class_id, name, icon, description, max_level, level_values)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(class_id, name) DO UPDATE SET
                icon = excluded.icon,
                description = excluded.description,
                max_level = excluded.max_level,
                level_values = excluded.level_values
            RETURNING id
            "#,
            params![
                talent.class_id,
                talent.name,
                talent.icon,
                talent.description,
                talent.max_level,
                to_json(&talent.level_values)?,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get_talent(&self, id: i64) -> Result<Option<Talent>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM talents WHERE id = ?1", TALENT_COLUMNS),
                [id],
                Self::row_to_talent,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn talents_for_class(&self, class_id: i64) -> Result<Vec<Talent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM talents WHERE class_id = ?1 ORDER BY name",
            TALENT_COLUMNS
        ))?;
        let talents = stmt
            .query_map([class_id], Self::row_to_talent)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(talents)
    }

    pub fn update_talent(&self, talent: &Talent) -> Result<bool> {
        talent.validate()?;
        let changed = self.conn.execute(
            r#"
            UPDATE talents
            SET class_id = ?2, name = ?3, icon = ?4, description = ?5, max_level = ?6, level_values = ?7
            WHERE id = ?1
            "#,
            params![
                talent.id,
                talent.class_id,
                talent.name,
                talent.icon,
                talent.description,
                talent.max_level,
                to_json(&talent.level_values)?,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_talent(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM talents WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    fn row_to_talent(row: &rusqlite::Row) -> rusqlite::Result<Talent> {
        Ok(Talent {
            id: row.get(0)?,
            class_id: row.get(1)?,
            name: row.get(2)?,
            icon: row.get(3)?,
            description: row.get(4)?,
            max_level: row.get(5)?,
            level_values: json_column(row, 6)?,
        })
    }
}
