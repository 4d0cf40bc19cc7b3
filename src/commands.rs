use crate::{emit_success, OutputMode};
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use warspear_wiki::config::{ensure_db_dir, write_config, WikiConfig};
use warspear_wiki::describe::{format_description, Segment};
use warspear_wiki::import::{load_bundle, run_import as import_bundle};
use warspear_wiki::storage::WikiStore;
use warspear_wiki::sync::{build_translator, run_sync, HttpFetcher, NoopTranslator, SyncOptions, Translator};
use warspear_wiki::ui::{
    banner, info, level_table, section, stats_table, status, success, summary_row, theme, warn, Icons, Spinner,
};

fn open_store(config: &WikiConfig) -> anyhow::Result<WikiStore> {
    let path = config.database_path();
    ensure_db_dir(&path)?;
    tracing::debug!("Opening database {}", path.display());
    Ok(WikiStore::open(&path)?)
}

pub fn run_init(config_path: &Path, force: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    let config = WikiConfig::default();
    write_config(config_path, &config, force)?;
    open_store(&config)?;

    if output_mode.is_human() {
        success(&format!("Wrote {}", config_path.display()));
        status(Icons::DATABASE, "Database", &config.database);
        info("Next", "set sync.feed_url and cron_secret, then run `warspear-wiki serve`");
    } else {
        let data = serde_json::json!({
            "config": config_path.display().to_string(),
            "database": config.database,
        });
        emit_success(output_mode, "init", data)?;
    }
    Ok(())
}

pub async fn run_serve(mut config: WikiConfig, port: Option<u16>, bind: Option<String>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(bind) = bind {
        config.bind = bind;
    }
    let store = open_store(&config)?;

    println!("{} Serving at http://{}:{}", Icons::GLOBE, config.bind, config.port);
    warspear_wiki::server::start_server(store, config).await
}

pub fn run_import(config: &WikiConfig, file: &Path, output_mode: OutputMode) -> anyhow::Result<()> {
    let started = Instant::now();
    let bundle = load_bundle(file)?;
    let mut store = open_store(config)?;

    let spinner = output_mode
        .is_human()
        .then(|| Spinner::new(&format!("Importing {}", file.display())));
    let report = match import_bundle(&mut store, &bundle) {
        Ok(report) => report,
        Err(e) => {
            if let Some(spinner) = &spinner {
                spinner.fail();
            }
            return Err(e.into());
        }
    };

    match spinner {
        Some(spinner) => {
            spinner.finish_with_summary(&format!("Imported {} records", report.total()), started.elapsed());
            let rows = [
                ("Types", report.types.to_string()),
                ("Classes", report.classes.to_string()),
                ("Skills", report.skills.to_string()),
                ("Class links", report.class_skill_links.to_string()),
                ("Talents", report.talents.to_string()),
                ("Items", report.items.to_string()),
                ("Posts", report.posts.to_string()),
                ("Weekly schedules", report.weekly_schedules.to_string()),
            ];
            let rows: Vec<(&str, &str)> = rows.iter().map(|(k, v)| (*k, v.as_str())).collect();
            println!("{}", stats_table(&rows));
        }
        None => emit_success(output_mode, "import", serde_json::to_value(&report)?)?,
    }
    Ok(())
}

pub async fn run_sync_events(
    config: &WikiConfig,
    max_items: Option<usize>,
    no_translate: bool,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let mut opts = SyncOptions::from(&config.sync);
    if let Some(max_items) = max_items {
        opts.max_items = max_items;
    }

    let translator: Arc<dyn Translator> = if no_translate {
        Arc::new(NoopTranslator)
    } else {
        build_translator(&config.sync.translate)?
    };
    let fetcher = HttpFetcher::new()?;
    let store = Mutex::new(open_store(config)?);

    let spinner = output_mode
        .is_human()
        .then(|| Spinner::new(&format!("Syncing {}", opts.feed_url)));
    let result = run_sync(&store, &fetcher, translator.as_ref(), &opts).await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(spinner) = &spinner {
                spinner.fail();
            }
            return Err(e.into());
        }
    };

    match spinner {
        Some(spinner) => {
            spinner.finish_with_summary("Sync complete", started.elapsed());
            summary_row("Fetched", &report.fetched.to_string());
            summary_row("Already stored", &report.skipped_existing.to_string());
            summary_row("Inserted", &report.inserted.to_string());
            summary_row("Deferred", &report.deferred.to_string());
            if report.failed > 0 {
                warn(&format!("{} items failed to translate and will be retried", report.failed));
            }
        }
        None => emit_success(output_mode, "sync-events", serde_json::to_value(&report)?)?,
    }
    Ok(())
}

pub fn run_stats(config: &WikiConfig, output_mode: OutputMode) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let stats = store.stats()?;

    if output_mode.is_human() {
        status(Icons::STATS, "Database", &config.database);
        let counts: Vec<(String, String)> = stats
            .tables
            .iter()
            .map(|(table, count)| (table.clone(), count.to_string()))
            .collect();
        let rows: Vec<(&str, &str)> = counts.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        println!("{}", stats_table(&rows));
    } else {
        let data: serde_json::Map<String, serde_json::Value> = stats
            .tables
            .iter()
            .map(|(table, count)| (table.clone(), serde_json::json!(count)))
            .collect();
        emit_success(output_mode, "stats", serde_json::Value::Object(data))?;
    }
    Ok(())
}

pub fn run_describe(config: &WikiConfig, slug: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let skill = store
        .get_skill_by_slug(slug)?
        .ok_or_else(|| anyhow::anyhow!("no skill with slug '{}'", slug))?;
    let formatted = format_description(&skill.description, &skill.level_values, skill.max_level);

    if !output_mode.is_human() {
        let data = serde_json::json!({
            "skill": skill,
            "plain": formatted.to_plain(),
            "html": formatted.to_html(),
            "segments": formatted.segments,
        });
        return emit_success(output_mode, "describe", data);
    }

    banner(&skill.name, &format!("{} · max level {}", skill.slug, skill.max_level));
    let mut line = String::new();
    for segment in &formatted.segments {
        match segment {
            Segment::Text { text } => line.push_str(text),
            Segment::Value { pve, pvp, .. } => {
                line.push_str(&pve.style(theme().value.clone()).to_string());
                if let Some(pvp) = pvp {
                    line.push_str(&format!(" ({})", pvp.style(theme().pvp.clone())));
                }
            }
            Segment::Missing { .. } => line.push_str(&"?".style(theme().warn.clone()).to_string()),
        }
    }
    println!("{}", line);

    let table = level_table(&skill.level_values, skill.max_level);
    if !table.is_empty() {
        section("Values per level");
        println!("{}", table);
    }
    Ok(())
}

pub fn run_grid(config: &WikiConfig, slug: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let class = store
        .get_class_by_slug(slug)?
        .ok_or_else(|| anyhow::anyhow!("no class with slug '{}'", slug))?;
    let tree = class.talent_tree.clone().unwrap_or_default();
    let grid = tree.render();
    let issues = tree.validate();
    let talents = store.talents_for_class(class.id)?;

    if !output_mode.is_human() {
        let data = serde_json::json!({ "class": class.slug, "grid": grid, "issues": issues });
        return emit_success(output_mode, "grid", data);
    }

    banner(&class.name, &format!("{} talents", talents.len()));
    let text = grid.to_text();
    if text.is_empty() {
        info("Talent tree", "empty");
    } else {
        print!("{}", text);
    }

    let placed = tree.talent_ids();
    for talent in &talents {
        let marker = if placed.contains(&talent.id) { "T" } else { "-" };
        summary_row(marker, &talent.name);
    }
    for issue in &issues {
        warn(&issue.to_string());
    }
    Ok(())
}

pub fn run_version(output_mode: OutputMode) -> anyhow::Result<()> {
    if output_mode.is_human() {
        banner(
            &format!("{}", "Warspear Wiki".bold().style(theme().info.clone())),
            &format!("Version {}", env!("CARGO_PKG_VERSION").bold()),
        );
    } else {
        let data = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        });
        emit_success(output_mode, "version", data)?;
    }
    Ok(())
}
