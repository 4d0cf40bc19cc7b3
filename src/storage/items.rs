//! Type catalogue and item persistence

use rusqlite::{params, OptionalExtension};
use crate::Result;
use crate::model::{EntityType, Item, TypeCategory};
use super::sqlite::{enum_column, WikiStore};

const ITEM_COLUMNS: &str = "id, slug, name, icon, item_type_id, level, rarity, description";

impl WikiStore {
    // ========== Type Operations ==========

    /// Insert a type if missing, returning its id either way
    pub fn upsert_type(&self, entity_type: &EntityType) -> Result<i64> {
        entity_type.validate()?;
        let id = self.conn.query_row(
            r#"
            INSERT INTO types (category, name) VALUES (?1, ?2)
            ON CONFLICT(category, name) DO UPDATE SET name = excluded.name
            RETURNING id
            "#,
            params![entity_type.category.as_str(), entity_type.name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn find_type(&self, category: TypeCategory, name: &str) -> Result<Option<EntityType>> {
        self.conn
            .query_row(
                "SELECT id, category, name FROM types WHERE category = ?1 AND name = ?2",
                params![category.as_str(), name],
                Self::row_to_type,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_types(&self, category: Option<TypeCategory>) -> Result<Vec<EntityType>> {
        let types = match category {
            Some(category) => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT id, category, name FROM types WHERE category = ?1 ORDER BY name")?;
                stmt.query_map([category.as_str()], Self::row_to_type)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT id, category, name FROM types ORDER BY category, name")?;
                stmt.query_map([], Self::row_to_type)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(types)
    }

    pub fn delete_type(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM types WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    fn row_to_type(row: &rusqlite::Row) -> rusqlite::Result<EntityType> {
        Ok(EntityType {
            id: row.get(0)?,
            category: enum_column(row, 1)?,
            name: row.get(2)?,
        })
    }

    // ========== Item Operations ==========

    /// Insert or update an item keyed by slug
    pub fn upsert_item(&self, item: &Item) -> Result<i64> {
        item.validate()?;
        let id = self.conn.query_row(
            r#"
            INSERT INTO items (slug, name, icon, item_type_id, level, rarity, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(slug) DO UPDATE SET
                name = excluded.name,
                icon = excluded.icon,
                item_type_id = excluded.item_type_id,
                level = excluded.level,
                rarity = excluded.rarity,
                description = excluded.description
            RETURNING id
            "#,
            params![
                item.slug,
                item.name,
                item.icon,
                item.item_type_id,
                item.level,
                item.rarity,
                item.description,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get_item_by_slug(&self, slug: &str) -> Result<Option<Item>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM items WHERE slug = ?1", ITEM_COLUMNS),
                [slug],
                Self::row_to_item,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Items, optionally restricted to one type, ordered by level then name
    pub fn list_items(&self, item_type_id: Option<i64>) -> Result<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM items WHERE (?1 IS NULL OR item_type_id = ?1) ORDER BY level, name",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map([item_type_id], Self::row_to_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn delete_item(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM items WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
        Ok(Item {
            id: row.get(0)?,
            slug: row.get(1)?,
            name: row.get(2)?,
            icon: row.get(3)?,
            item_type_id: row.get(4)?,
            level: row.get(5)?,
            rarity: row.get(6)?,
            description: row.get(7)?,
        })
    }
}
