//! Bulk JSON import
//!
//! An import bundle is a JSON document with optional sections:
//!
//! ```json
//! {
//!   "types":   [{"category": "skill", "name": "active"}],
//!   "classes": [{"slug": "warden", "name": "Warden", "faction": "chosen"}],
//!   "skills":  [{"slug": "eagle-eye", "name": "Eagle Eye", "classes": ["warden"],
//!                "skill_type": "active", "max_level": 3,
//!                "description": "+{acc}% accuracy",
//!                "level_values": {"1": {"acc": 5}, "2": {"acc": 10}, "3": {"acc": 15}}}],
//!   "talents": [{"class": "warden", "name": "Sharp Eye", "position": "0,0"}],
//!   "items":   [{"slug": "iron-bow", "name": "Iron Bow", "item_type": "weapon"}],
//!   "posts":   [{"slug": "warden-guide", "title": "Warden guide", "tags": ["pve"]}],
//!   "weekly_schedules": [{"title": "Arena", "day_of_week": 4, "start_time": "19:00"}]
//! }
//! ```
//!
//! Everything runs in one transaction. Records are upserted by natural key,
//! so importing the same bundle twice leaves the database unchanged. A
//! non-empty `weekly_schedules` section replaces the whole week.

use crate::model::{
    EntityType, GameClass, Item, LevelValues, Post, Skill, Talent, TypeCategory, WeeklySchedule,
};
use crate::storage::WikiStore;
use crate::talent_grid::{cell_key, parse_key, slot_kind, SlotKind, TreeCell, GRID_COLUMNS, GRID_ROWS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportBundle {
    #[serde(default)]
    pub types: Vec<EntityType>,
    #[serde(default)]
    pub classes: Vec<GameClass>,
    #[serde(default)]
    pub skills: Vec<ImportSkill>,
    #[serde(default)]
    pub talents: Vec<ImportTalent>,
    #[serde(default)]
    pub items: Vec<ImportItem>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub weekly_schedules: Vec<WeeklySchedule>,
}

/// A skill plus the classes that use it
#[derive(Debug, Clone, Deserialize)]
pub struct ImportSkill {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "one")]
    pub max_level: u32,
    #[serde(default)]
    pub level_values: LevelValues,
    /// Name of a `skill` type; created when missing
    #[serde(default)]
    pub skill_type: Option<String>,
    /// Class slugs
    #[serde(default)]
    pub classes: Vec<String>,
}

/// A talent addressed by class slug, optionally placed on the grid
#[derive(Debug, Clone, Deserialize)]
pub struct ImportTalent {
    pub class: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "one")]
    pub max_level: u32,
    #[serde(default)]
    pub level_values: LevelValues,
    /// Grid key (`"x,y"`) in the class talent tree
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportItem {
    #[serde(flatten)]
    pub item: Item,
    /// Name of an `item` type; created when missing
    #[serde(default)]
    pub item_type: Option<String>,
}

fn one() -> u32 {
    1
}

/// Number of records written per section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub types: usize,
    pub classes: usize,
    pub skills: usize,
    pub class_skill_links: usize,
    pub talents: usize,
    pub items: usize,
    pub posts: usize,
    pub weekly_schedules: usize,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.types
            + self.classes
            + self.skills
            + self.talents
            + self.items
            + self.posts
            + self.weekly_schedules
    }
}

impl std::fmt::Display for ImportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Import Summary:")?;
        writeln!(f, "  Types: {}", self.types)?;
        writeln!(f, "  Classes: {}", self.classes)?;
        writeln!(f, "  Skills: {} ({} class links)", self.skills, self.class_skill_links)?;
        writeln!(f, "  Talents: {}", self.talents)?;
        writeln!(f, "  Items: {}", self.items)?;
        writeln!(f, "  Posts: {}", self.posts)?;
        writeln!(f, "  Weekly schedules: {}", self.weekly_schedules)
    }
}

/// Read and parse a bundle file
pub fn load_bundle(path: &Path) -> Result<ImportBundle> {
    let contents = std::fs::read_to_string(path)?;
    parse_bundle(&contents)
}

pub fn parse_bundle(json: &str) -> Result<ImportBundle> {
    Ok(serde_json::from_str(json)?)
}

/// Write a bundle to the store atomically
pub fn run_import(store: &mut WikiStore, bundle: &ImportBundle) -> Result<ImportReport> {
    store.in_transaction(|store| import_all(store, bundle))
}

fn import_all(store: &WikiStore, bundle: &ImportBundle) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for (i, entity_type) in bundle.types.iter().enumerate() {
        store.upsert_type(entity_type).map_err(|e| annotate("types", i, e))?;
        report.types += 1;
    }

    for (i, class) in bundle.classes.iter().enumerate() {
        store.upsert_class(class).map_err(|e| annotate("classes", i, e))?;
        report.classes += 1;
    }

    for (i, entry) in bundle.skills.iter().enumerate() {
        report.class_skill_links += import_skill(store, entry).map_err(|e| annotate("skills", i, e))?;
        report.skills += 1;
    }

    // talent grid placements are collected per class and written once
    let mut placements: BTreeMap<i64, Vec<(String, i64)>> = BTreeMap::new();
    for (i, entry) in bundle.talents.iter().enumerate() {
        let (class_id, talent_id) = import_talent(store, entry).map_err(|e| annotate("talents", i, e))?;
        if let Some(position) = &entry.position {
            placements.entry(class_id).or_default().push((position.clone(), talent_id));
        }
        report.talents += 1;
    }
    for (class_id, cells) in placements {
        place_talents(store, class_id, &cells)?;
    }

    for (i, entry) in bundle.items.iter().enumerate() {
        import_item(store, entry).map_err(|e| annotate("items", i, e))?;
        report.items += 1;
    }

    for (i, post) in bundle.posts.iter().enumerate() {
        store.upsert_post(post).map_err(|e| annotate("posts", i, e))?;
        report.posts += 1;
    }

    if !bundle.weekly_schedules.is_empty() {
        store.clear_schedules()?;
        for (i, entry) in bundle.weekly_schedules.iter().enumerate() {
            store.insert_schedule(entry).map_err(|e| annotate("weekly_schedules", i, e))?;
            report.weekly_schedules += 1;
        }
    }

    tracing::info!("Imported {} records", report.total());
    Ok(report)
}

/// Returns the number of class links written
fn import_skill(store: &WikiStore, entry: &ImportSkill) -> Result<usize> {
    let skill_type_id = entry
        .skill_type
        .as_deref()
        .map(|name| store.upsert_type(&EntityType::new(TypeCategory::Skill, name)))
        .transpose()?;

    let skill = Skill {
        id: 0,
        slug: entry.slug.clone(),
        name: entry.name.clone(),
        icon: entry.icon.clone(),
        description: entry.description.clone(),
        max_level: entry.max_level,
        level_values: entry.level_values.clone(),
        skill_type_id,
    };
    let skill_id = store.upsert_skill(&skill)?;

    for slug in &entry.classes {
        let class = store
            .get_class_by_slug(slug)?
            .ok_or_else(|| Error::Validation(format!("unknown class '{}'", slug)))?;
        store.link_class_skill(class.id, skill_id)?;
    }
    Ok(entry.classes.len())
}

fn import_talent(store: &WikiStore, entry: &ImportTalent) -> Result<(i64, i64)> {
    let class = store
        .get_class_by_slug(&entry.class)?
        .ok_or_else(|| Error::Validation(format!("unknown class '{}'", entry.class)))?;

    if let Some(position) = &entry.position {
        let (x, y) = parse_key(position)?;
        if x >= GRID_COLUMNS || y >= GRID_ROWS {
            return Err(Error::Validation(format!("position '{}' is outside the grid", position)));
        }
        if slot_kind(x, y) != SlotKind::Talent {
            return Err(Error::Validation(format!(
                "position '{}' is a connector slot; talents need even x and y",
                position
            )));
        }
    }

    let talent = Talent {
        id: 0,
        class_id: class.id,
        name: entry.name.clone(),
        icon: entry.icon.clone(),
        description: entry.description.clone(),
        max_level: entry.max_level,
        level_values: entry.level_values.clone(),
    };
    let talent_id = store.upsert_talent(&talent)?;
    Ok((class.id, talent_id))
}

fn place_talents(store: &WikiStore, class_id: i64, cells: &[(String, i64)]) -> Result<()> {
    let Some(class) = store.get_class(class_id)? else {
        return Err(Error::NotFound(format!("class {}", class_id)));
    };
    let mut tree = class.talent_tree.unwrap_or_default();
    for (position, talent_id) in cells {
        let (x, y) = parse_key(position)?;
        tree.cells.insert(cell_key(x, y), TreeCell::Talent { talent_id: *talent_id });
    }
    store.set_talent_tree(class_id, &tree)?;
    Ok(())
}

fn import_item(store: &WikiStore, entry: &ImportItem) -> Result<()> {
    let mut item = entry.item.clone();
    if let Some(name) = &entry.item_type {
        item.item_type_id = Some(store.upsert_type(&EntityType::new(TypeCategory::Item, name.as_str()))?);
    }
    store.upsert_item(&item)?;
    Ok(())
}

/// Prefix validation messages with the offending record
fn annotate(section: &str, index: usize, err: Error) -> Error {
    match err {
        Error::Validation(msg) => Error::Validation(format!("{}[{}]: {}", section, index, msg)),
        Error::InvalidValue(msg) => Error::Validation(format!("{}[{}]: {}", section, index, msg)),
        other => other,
    }
}
