//! Talent tree grid
//!
//! A talent tree is laid out on a fixed 17 x 53 grid. Cells at even/even
//! coordinates hold talent icons; every other cell (odd x or odd y) is a
//! connector slot that may hold an arrow. The layout itself is a sparse map
//! keyed by `"x,y"` strings, so anything not in the map renders empty.

use crate::html::escape_html;
use crate::model::Talent;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Number of columns (x runs `0..GRID_COLUMNS`)
pub const GRID_COLUMNS: u32 = 17;
/// Number of rows (y runs `0..GRID_ROWS`)
pub const GRID_ROWS: u32 = 53;

/// What a grid position is allowed to hold, decided purely by parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Talent,
    Arrow,
}

pub fn slot_kind(x: u32, y: u32) -> SlotKind {
    if x % 2 == 0 && y % 2 == 0 {
        SlotKind::Talent
    } else {
        SlotKind::Arrow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrowDirection::Up => "up",
            ArrowDirection::Down => "down",
            ArrowDirection::Left => "left",
            ArrowDirection::Right => "right",
        }
    }

    fn glyph(&self) -> char {
        match self {
            ArrowDirection::Up => '↑',
            ArrowDirection::Down => '↓',
            ArrowDirection::Left => '←',
            ArrowDirection::Right => '→',
        }
    }
}

/// An entry of the sparse layout map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeCell {
    Talent { talent_id: i64 },
    Arrow { direction: ArrowDirection },
}

impl TreeCell {
    pub fn slot_kind(&self) -> SlotKind {
        match self {
            TreeCell::Talent { .. } => SlotKind::Talent,
            TreeCell::Arrow { .. } => SlotKind::Arrow,
        }
    }
}

/// A cell as it appears on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderedCell {
    Empty,
    Talent { talent_id: i64 },
    Arrow { direction: ArrowDirection },
}

/// Problems found in a stored layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum GridIssue {
    /// Key is not of the form `x,y`
    BadKey { key: String },
    /// Coordinates fall outside the grid
    OutOfBounds { key: String },
    /// A talent on a connector slot, or an arrow on a talent slot
    WrongSlot { key: String, expected: SlotKind },
}

impl std::fmt::Display for GridIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridIssue::BadKey { key } => write!(f, "'{}' is not an x,y key", key),
            GridIssue::OutOfBounds { key } => write!(f, "'{}' is outside the {}x{} grid", key, GRID_COLUMNS, GRID_ROWS),
            GridIssue::WrongSlot { key, expected } => {
                let expected = match expected {
                    SlotKind::Talent => "talent",
                    SlotKind::Arrow => "arrow",
                };
                write!(f, "'{}' only holds {} cells", key, expected)
            }
        }
    }
}

/// Format grid coordinates as a layout key
pub fn cell_key(x: u32, y: u32) -> String {
    format!("{},{}", x, y)
}

/// Parse a `"x,y"` layout key.
///
/// Only the form written by [`cell_key`] is accepted, so `"00,+2"` is rejected
/// rather than aliasing `"0,2"`.
pub fn parse_key(key: &str) -> Result<(u32, u32)> {
    let (x, y) = key
        .split_once(',')
        .ok_or_else(|| Error::InvalidValue(format!("Grid key must be 'x,y': {}", key)))?;
    let x: u32 = x
        .parse()
        .map_err(|_| Error::InvalidValue(format!("Invalid grid x in '{}'", key)))?;
    let y: u32 = y
        .parse()
        .map_err(|_| Error::InvalidValue(format!("Invalid grid y in '{}'", key)))?;
    if cell_key(x, y) != key {
        return Err(Error::InvalidValue(format!("Grid key '{}' is not in x,y form", key)));
    }
    Ok((x, y))
}

/// Sparse talent tree layout, serialized as a plain `"x,y" -> cell` map
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TalentTree {
    pub cells: BTreeMap<String, TreeCell>,
}

impl TalentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_talent(mut self, x: u32, y: u32, talent_id: i64) -> Self {
        self.cells.insert(cell_key(x, y), TreeCell::Talent { talent_id });
        self
    }

    pub fn with_arrow(mut self, x: u32, y: u32, direction: ArrowDirection) -> Self {
        self.cells.insert(cell_key(x, y), TreeCell::Arrow { direction });
        self
    }

    /// Resolve a single position.
    ///
    /// Positions missing from the map, positions off the grid, and entries
    /// that do not fit the position's slot kind render empty.
    pub fn cell_at(&self, x: u32, y: u32) -> RenderedCell {
        if x >= GRID_COLUMNS || y >= GRID_ROWS {
            return RenderedCell::Empty;
        }
        match self.cells.get(&cell_key(x, y)) {
            Some(cell) if cell.slot_kind() == slot_kind(x, y) => match *cell {
                TreeCell::Talent { talent_id } => RenderedCell::Talent { talent_id },
                TreeCell::Arrow { direction } => RenderedCell::Arrow { direction },
            },
            _ => RenderedCell::Empty,
        }
    }

    /// Lay out the whole grid, row by row
    pub fn render(&self) -> Grid {
        let rows = (0..GRID_ROWS)
            .map(|y| (0..GRID_COLUMNS).map(|x| self.cell_at(x, y)).collect())
            .collect();
        Grid { rows }
    }

    /// Ids of every talent placed on a valid slot
    pub fn talent_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .cells
            .keys()
            .filter_map(|key| parse_key(key).ok())
            .filter_map(|(x, y)| match self.cell_at(x, y) {
                RenderedCell::Talent { talent_id } => Some(talent_id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn validate(&self) -> Vec<GridIssue> {
        let mut issues = Vec::new();
        for (key, cell) in &self.cells {
            let Ok((x, y)) = parse_key(key) else {
                issues.push(GridIssue::BadKey { key: key.clone() });
                continue;
            };
            if x >= GRID_COLUMNS || y >= GRID_ROWS {
                issues.push(GridIssue::OutOfBounds { key: key.clone() });
                continue;
            }
            let expected = slot_kind(x, y);
            if cell.slot_kind() != expected {
                issues.push(GridIssue::WrongSlot { key: key.clone(), expected });
            }
        }
        issues
    }
}

/// A fully rendered grid: `rows[y][x]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub rows: Vec<Vec<RenderedCell>>,
}

impl Grid {
    pub fn get(&self, x: u32, y: u32) -> Option<RenderedCell> {
        self.rows.get(y as usize)?.get(x as usize).copied()
    }

    /// Rows up to and including the last one holding anything
    fn used_rows(&self) -> &[Vec<RenderedCell>] {
        let used = self
            .rows
            .iter()
            .rposition(|row| row.iter().any(|c| *c != RenderedCell::Empty))
            .map(|last| last + 1)
            .unwrap_or(0);
        &self.rows[..used]
    }

    /// HTML table fragment; talents are looked up for their name and icon
    pub fn to_html(&self, talents: &HashMap<i64, Talent>) -> String {
        let mut out = String::from(r#"<table class="talent-grid">"#);
        for (y, row) in self.rows.iter().enumerate() {
            out.push_str("<tr>");
            for (x, cell) in row.iter().enumerate() {
                match cell {
                    RenderedCell::Empty => out.push_str(r#"<td class="cell-empty"></td>"#),
                    RenderedCell::Arrow { direction } => {
                        out.push_str(&format!(
                            r#"<td class="cell-arrow arrow-{}"></td>"#,
                            direction.as_str()
                        ));
                    }
                    RenderedCell::Talent { talent_id } => match talents.get(talent_id) {
                        Some(talent) => {
                            let name = escape_html(&talent.name);
                            let icon = talent
                                .icon
                                .as_deref()
                                .map(|src| format!(r#"<img src="{}" alt="{}">"#, escape_html(src), name))
                                .unwrap_or_else(|| name.clone());
                            out.push_str(&format!(
                                r#"<td class="cell-talent" data-talent-id="{}" data-x="{}" data-y="{}" title="{}">{}</td>"#,
                                talent_id, x, y, name, icon
                            ));
                        }
                        None => out.push_str(&format!(
                            r#"<td class="cell-talent cell-unknown" data-talent-id="{}">?</td>"#,
                            talent_id
                        )),
                    },
                }
            }
            out.push_str("</tr>");
        }
        out.push_str("</table>");
        out
    }

    /// Terminal preview; trailing empty rows are dropped
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for row in self.used_rows() {
            let line: String = row
                .iter()
                .map(|cell| match cell {
                    RenderedCell::Empty => '·',
                    RenderedCell::Talent { .. } => 'T',
                    RenderedCell::Arrow { direction } => direction.glyph(),
                })
                .collect();
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_kind_by_parity() {
        for y in 0..GRID_ROWS {
            for x in 0..GRID_COLUMNS {
                let expected = if x % 2 == 0 && y % 2 == 0 { SlotKind::Talent } else { SlotKind::Arrow };
                assert_eq!(slot_kind(x, y), expected, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_grid_dimensions() {
        let grid = TalentTree::new().render();
        assert_eq!(grid.rows.len(), GRID_ROWS as usize);
        assert!(grid.rows.iter().all(|row| row.len() == GRID_COLUMNS as usize));
        assert!(grid.rows.iter().flatten().all(|c| *c == RenderedCell::Empty));
    }

    #[test]
    fn test_cells_come_from_map() {
        let tree = TalentTree::new()
            .with_talent(0, 0, 11)
            .with_arrow(1, 0, ArrowDirection::Right)
            .with_talent(2, 0, 12)
            .with_arrow(0, 1, ArrowDirection::Down);
        let grid = tree.render();

        assert_eq!(grid.get(0, 0), Some(RenderedCell::Talent { talent_id: 11 }));
        assert_eq!(grid.get(1, 0), Some(RenderedCell::Arrow { direction: ArrowDirection::Right }));
        assert_eq!(grid.get(2, 0), Some(RenderedCell::Talent { talent_id: 12 }));
        assert_eq!(grid.get(0, 1), Some(RenderedCell::Arrow { direction: ArrowDirection::Down }));
        // not in the map: empty whatever the parity
        assert_eq!(grid.get(4, 4), Some(RenderedCell::Empty));
        assert_eq!(grid.get(3, 3), Some(RenderedCell::Empty));
        assert_eq!(grid.get(GRID_COLUMNS, 0), None);
    }

    #[test]
    fn test_mismatched_entries_render_empty() {
        let tree = TalentTree::new()
            .with_arrow(2, 2, ArrowDirection::Up)
            .with_talent(1, 2, 5);
        assert_eq!(tree.cell_at(2, 2), RenderedCell::Empty);
        assert_eq!(tree.cell_at(1, 2), RenderedCell::Empty);

        let issues = tree.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.contains(&GridIssue::WrongSlot { key: "2,2".to_string(), expected: SlotKind::Talent }));
        assert!(issues.contains(&GridIssue::WrongSlot { key: "1,2".to_string(), expected: SlotKind::Arrow }));
    }

    #[test]
    fn test_validate_bad_keys() {
        let mut tree = TalentTree::new();
        tree.cells.insert("a,b".to_string(), TreeCell::Talent { talent_id: 1 });
        tree.cells.insert("18,0".to_string(), TreeCell::Talent { talent_id: 2 });
        tree.cells.insert("0,52".to_string(), TreeCell::Talent { talent_id: 3 });

        let issues = tree.validate();
        assert!(issues.contains(&GridIssue::BadKey { key: "a,b".to_string() }));
        assert!(issues.contains(&GridIssue::OutOfBounds { key: "18,0".to_string() }));
        assert_eq!(issues.len(), 2);
        assert_eq!(tree.talent_ids(), vec![3]);
    }

    #[test]
    fn test_non_canonical_keys_are_bad() {
        assert_eq!(parse_key("4,10").unwrap(), (4, 10));
        for key in ["00,2", "+0,2", "0, 2", "0,2 ", "0,-2"] {
            assert!(parse_key(key).is_err(), "{key} should be rejected");
        }

        let mut tree = TalentTree::new();
        tree.cells.insert("00,+2".to_string(), TreeCell::Talent { talent_id: 9 });
        assert_eq!(tree.validate(), vec![GridIssue::BadKey { key: "00,+2".to_string() }]);
        assert!(tree.talent_ids().is_empty());
    }

    #[test]
    fn test_layout_json_shape() {
        let tree: TalentTree = serde_json::from_str(
            r#"{"0,0": {"type": "talent", "talent_id": 7}, "0,1": {"type": "arrow", "direction": "down"}}"#,
        )
        .unwrap();
        assert_eq!(tree.cell_at(0, 0), RenderedCell::Talent { talent_id: 7 });
        assert_eq!(tree.cell_at(0, 1), RenderedCell::Arrow { direction: ArrowDirection::Down });
    }

    #[test]
    fn test_text_preview() {
        let tree = TalentTree::new()
            .with_talent(0, 0, 1)
            .with_arrow(0, 1, ArrowDirection::Down)
            .with_talent(0, 2, 2);
        let text = tree.render().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("T·"));
        assert!(lines[1].starts_with('↓'));
        assert_eq!(lines[2].chars().count(), GRID_COLUMNS as usize);
    }

    #[test]
    fn test_html_uses_talent_lookup() {
        let tree = TalentTree::new().with_talent(0, 0, 1).with_talent(2, 0, 99);
        let mut talents = HashMap::new();
        let mut talent = Talent::new(3, "Iron <Skin>", "", 1);
        talent.id = 1;
        talent.icon = Some("/media/icons/iron.png".to_string());
        talents.insert(1, talent);

        let html = tree.render().to_html(&talents);
        assert!(html.contains(r#"<img src="/media/icons/iron.png" alt="Iron &lt;Skin&gt;">"#));
        assert!(html.contains(r#"data-talent-id="99">?</td>"#));
        assert_eq!(html.matches("<tr>").count(), GRID_ROWS as usize);
    }
}
