use crate::model::{LevelValues, MAX_LEVEL};
use crate::describe::format_number;
use std::collections::BTreeSet;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

/// One row per level, one column per parameter; gaps show as `-`
pub fn level_table(values: &LevelValues, max_level: u32) -> String {
    let keys: BTreeSet<&str> = values
        .values()
        .flat_map(|params| params.keys().map(String::as_str))
        .collect();
    if keys.is_empty() {
        return String::new();
    }

    let mut builder = Builder::default();
    builder.push_record(std::iter::once("Level").chain(keys.iter().copied()));
    for level in 1..=max_level.min(MAX_LEVEL) {
        let params = values.get(&level);
        let cells = keys.iter().map(|key| {
            params
                .and_then(|p| p.get(*key))
                .map(|v| format_number(*v))
                .unwrap_or_else(|| "-".to_string())
        });
        builder.push_record(std::iter::once(level.to_string()).chain(cells));
    }
    builder.build().with(Style::rounded()).to_string()
}
