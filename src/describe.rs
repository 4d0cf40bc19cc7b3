//! Description formatter
//!
//! Skill and talent descriptions are templates such as
//! `"Deals {damage} damage over {duration} sec."`. Each `{key}` expands to the
//! value at every level from 1 to `max_level`, joined with `/`:
//!
//! ```text
//! Deals 10/20/30 damage over 6/6/8 sec.
//! ```
//!
//! When a `{key}_pvp` entry exists and differs from `{key}` at any level, the
//! placeholder carries a second, PvP sequence that renders in its own colour.

use crate::html::escape_html;
use crate::model::{LevelValues, MAX_LEVEL};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Suffix marking the player-vs-player variant of a parameter
pub const PVP_SUFFIX: &str = "_pvp";

/// Rendered in place of a value nobody filled in
pub const MISSING: &str = "?";

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"))
}

/// One piece of a formatted description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    /// Literal template text
    Text { text: String },
    /// An expanded placeholder
    Value {
        key: String,
        pve: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pvp: Option<String>,
    },
    /// A placeholder whose key has no values at any level
    Missing { key: String },
}

/// A template after substitution, renderable as plain text or HTML
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedDescription {
    pub segments: Vec<Segment>,
}

impl FormattedDescription {
    /// Plain text; PvP sequences follow in parentheses
    pub fn to_plain(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text { text } => out.push_str(text),
                Segment::Value { pve, pvp, .. } => {
                    out.push_str(pve);
                    if let Some(pvp) = pvp {
                        out.push_str(" (");
                        out.push_str(pvp);
                        out.push(')');
                    }
                }
                Segment::Missing { .. } => out.push_str(MISSING),
            }
        }
        out
    }

    /// HTML fragment with values wrapped in `value` / `value-pvp` spans
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text { text } => out.push_str(&escape_html(text)),
                Segment::Value { pve, pvp, .. } => {
                    out.push_str(r#"<span class="value">"#);
                    out.push_str(&escape_html(pve));
                    out.push_str("</span>");
                    if let Some(pvp) = pvp {
                        out.push_str(r#" <span class="value-pvp">("#);
                        out.push_str(&escape_html(pvp));
                        out.push_str(")</span>");
                    }
                }
                Segment::Missing { .. } => {
                    out.push_str(r#"<span class="value-missing">"#);
                    out.push_str(MISSING);
                    out.push_str("</span>");
                }
            }
        }
        out
    }

    /// True when any placeholder rendered a PvP variant
    pub fn has_pvp(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Value { pvp: Some(_), .. }))
    }
}

/// Expand every `{key}` in `template` against `values` for levels `1..=max_level`.
///
/// `max_level` is capped at [`MAX_LEVEL`].
pub fn format_description(template: &str, values: &LevelValues, max_level: u32) -> FormattedDescription {
    let max_level = max_level.min(MAX_LEVEL);
    let mut segments = Vec::new();
    let mut last = 0;

    for m in placeholder_regex().find_iter(template) {
        if m.start() > last {
            segments.push(Segment::Text { text: template[last..m.start()].to_string() });
        }
        let key = &m.as_str()[1..m.as_str().len() - 1];
        segments.push(expand_key(key, values, max_level));
        last = m.end();
    }

    if last < template.len() {
        segments.push(Segment::Text { text: template[last..].to_string() });
    }

    FormattedDescription { segments }
}

/// Distinct placeholder keys in order of first appearance
pub fn placeholder_keys(template: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for m in placeholder_regex().find_iter(template) {
        let key = &m.as_str()[1..m.as_str().len() - 1];
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

fn expand_key(key: &str, values: &LevelValues, max_level: u32) -> Segment {
    let Some(pve) = level_sequence(key, values, max_level) else {
        return Segment::Missing { key: key.to_string() };
    };

    let pvp = if key.ends_with(PVP_SUFFIX) {
        None
    } else {
        let pvp_key = format!("{}{}", key, PVP_SUFFIX);
        level_sequence(&pvp_key, values, max_level).filter(|pvp| *pvp != pve)
    };

    Segment::Value {
        key: key.to_string(),
        pve: join_sequence(&pve),
        pvp: pvp.map(|seq| join_sequence(&seq)),
    }
}

/// Values of `key` at levels `1..=max_level`, or `None` when no level defines it
fn level_sequence(key: &str, values: &LevelValues, max_level: u32) -> Option<Vec<Option<f64>>> {
    let seq: Vec<Option<f64>> = (1..=max_level)
        .map(|level| values.get(&level).and_then(|row| row.get(key)).copied())
        .collect();

    if seq.iter().all(Option::is_none) {
        None
    } else {
        Some(seq)
    }
}

fn join_sequence(seq: &[Option<f64>]) -> String {
    seq.iter()
        .map(|v| v.map(format_number).unwrap_or_else(|| MISSING.to_string()))
        .collect::<Vec<_>>()
        .join("/")
}

/// Whole numbers print without a fraction, others with at most two decimals
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(rows: &[(u32, &[(&str, f64)])]) -> LevelValues {
        let mut table = LevelValues::new();
        for (level, entries) in rows {
            let row = table.entry(*level).or_default();
            for (key, value) in *entries {
                row.insert(key.to_string(), *value);
            }
        }
        table
    }

    #[test]
    fn test_substitutes_all_levels() {
        let table = values(&[
            (1, &[("damage", 10.0), ("duration", 6.0)]),
            (2, &[("damage", 20.0), ("duration", 6.0)]),
            (3, &[("damage", 30.0), ("duration", 8.0)]),
        ]);
        let formatted = format_description("Deals {damage} damage over {duration} sec.", &table, 3);
        assert_eq!(formatted.to_plain(), "Deals 10/20/30 damage over 6/6/8 sec.");
        assert!(!formatted.has_pvp());
    }

    #[test]
    fn test_levels_beyond_max_are_ignored() {
        let table = values(&[(1, &[("heal", 5.0)]), (2, &[("heal", 7.0)]), (3, &[("heal", 9.0)])]);
        let formatted = format_description("Heals {heal}", &table, 2);
        assert_eq!(formatted.to_plain(), "Heals 5/7");
    }

    #[test]
    fn test_differing_pvp_renders_dual() {
        let table = values(&[
            (1, &[("damage", 10.0), ("damage_pvp", 10.0)]),
            (2, &[("damage", 20.0), ("damage_pvp", 15.0)]),
        ]);
        let formatted = format_description("Deals {damage}", &table, 2);
        assert!(formatted.has_pvp());
        assert_eq!(formatted.to_plain(), "Deals 10/20 (10/15)");
        assert_eq!(
            formatted.to_html(),
            r#"Deals <span class="value">10/20</span> <span class="value-pvp">(10/15)</span>"#
        );
    }

    #[test]
    fn test_identical_pvp_renders_single() {
        let table = values(&[
            (1, &[("stun", 2.0), ("stun_pvp", 2.0)]),
            (2, &[("stun", 3.0), ("stun_pvp", 3.0)]),
        ]);
        let formatted = format_description("Stuns for {stun} sec", &table, 2);
        assert!(!formatted.has_pvp());
        assert_eq!(formatted.to_plain(), "Stuns for 2/3 sec");
    }

    #[test]
    fn test_absent_key_renders_question_mark() {
        let table = values(&[(1, &[("damage", 10.0)])]);
        let formatted = format_description("Deals {damage}, slows by {slow}%", &table, 1);
        assert_eq!(formatted.to_plain(), "Deals 10, slows by ?%");
        assert!(formatted.to_html().contains(r#"<span class="value-missing">?</span>"#));
    }

    #[test]
    fn test_gap_in_levels_renders_question_mark_slot() {
        let table = values(&[(1, &[("armor", 4.0)]), (3, &[("armor", 12.0)])]);
        let formatted = format_description("+{armor} armor", &table, 3);
        assert_eq!(formatted.to_plain(), "+4/?/12 armor");
    }

    #[test]
    fn test_level_count_is_capped() {
        let table = values(&[(1, &[("d", 1.0)])]);
        let formatted = format_description("{d}", &table, u32::MAX);
        let plain = formatted.to_plain();
        assert_eq!(plain.split('/').count(), MAX_LEVEL as usize);
        assert!(plain.starts_with("1/?/?"));
    }

    #[test]
    fn test_direct_pvp_placeholder() {
        let table = values(&[(1, &[("damage", 10.0), ("damage_pvp", 7.0)])]);
        let formatted = format_description("PvP: {damage_pvp}", &table, 1);
        assert_eq!(formatted.to_plain(), "PvP: 7");
    }

    #[test]
    fn test_text_is_escaped_and_braces_pass_through() {
        let table = values(&[(1, &[("x", 1.0)])]);
        let formatted = format_description("<b>{x}</b> {not a key} {", &table, 1);
        assert_eq!(formatted.to_plain(), "<b>1</b> {not a key} {");
        assert_eq!(
            formatted.to_html(),
            r#"&lt;b&gt;<span class="value">1</span>&lt;/b&gt; {not a key} {"#
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(2.333333), "2.33");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn test_placeholder_keys() {
        assert_eq!(
            placeholder_keys("{a} and {b} then {a} {c_pvp}"),
            vec!["a".to_string(), "b".to_string(), "c_pvp".to_string()]
        );
    }
}
