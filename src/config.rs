use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    pub database: String,
    pub bind: String,
    pub port: u16,
    pub media_root: String,
    /// Bearer secret for `/api/cron/*`; the endpoint is disabled without it
    pub cron_secret: Option<String>,
    /// Bearer token for admin endpoints; open when unset
    pub admin_token: Option<String>,
    pub sync: SyncConfig,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            database: "data/wiki.db".to_string(),
            bind: "127.0.0.1".to_string(),
            port: 3000,
            media_root: "media".to_string(),
            cron_secret: None,
            admin_token: None,
            sync: SyncConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub feed_url: String,
    pub max_items: usize,
    pub delay_ms: u64,
    pub translate: TranslateConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            feed_url: String::new(),
            max_items: 10,
            delay_ms: 1000,
            translate: TranslateConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub source: String,
    pub target: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            source: "ru".to_string(),
            target: "en".to_string(),
        }
    }
}

impl WikiConfig {
    /// Apply environment overrides. `lookup` is `std::env::var` in the binary.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(database) = var("WIKI_DATABASE") {
            self.database = database;
        }
        if let Some(port) = var("WIKI_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("WIKI_PORT is not a valid port: {}", port))?;
        }
        if let Some(media_root) = var("WIKI_MEDIA_ROOT") {
            self.media_root = media_root;
        }
        if let Some(secret) = var("CRON_SECRET") {
            self.cron_secret = Some(secret);
        }
        if let Some(token) = var("WIKI_ADMIN_TOKEN") {
            self.admin_token = Some(token);
        }
        if let Some(feed_url) = var("WIKI_FEED_URL") {
            self.sync.feed_url = feed_url;
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database)
    }

    pub fn media_root_path(&self) -> PathBuf {
        PathBuf::from(&self.media_root)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("wiki.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<WikiConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: WikiConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

/// Config file (or defaults) with environment overrides applied
pub fn resolve_config(path: Option<&Path>) -> anyhow::Result<WikiConfig> {
    let mut config = load_config(path)?.unwrap_or_default();
    config.apply_env(|name| std::env::var(name).ok())?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &WikiConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
