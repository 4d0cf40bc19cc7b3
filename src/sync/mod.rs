//! News event sync job
//!
//! Pulls the official RSS feed, sanitizes and translates new items and
//! stores them as [`Event`]s keyed by the feed guid. Items are processed one
//! at a time; reruns skip everything already stored.

pub mod feed;
pub mod sanitize;
pub mod translate;

use crate::config::SyncConfig;
use crate::model::Event;
use crate::storage::WikiStore;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

pub use feed::{parse_feed, FeedItem};
pub use sanitize::sanitize_html;
pub use translate::{build_translator, HttpTranslator, NoopTranslator, Translator};

/// Source of the raw feed document
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("warspear-wiki/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub feed_url: String,
    /// New items processed per run; 0 means no limit
    pub max_items: usize,
    /// Pause between translated items
    pub delay: Duration,
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            feed_url: config.feed_url.clone(),
            max_items: config.max_items,
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Items in the feed
    pub fetched: usize,
    pub skipped_existing: usize,
    pub inserted: usize,
    pub failed: usize,
    /// New items left for the next run because of `max_items`
    pub deferred: usize,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fetched {}, skipped {}, inserted {}, failed {}, deferred {}",
            self.fetched, self.skipped_existing, self.inserted, self.failed, self.deferred
        )
    }
}

/// Run one sync pass.
///
/// A feed that cannot be fetched or parsed fails the whole run. A failed
/// translation only fails its item, which is retried on the next run.
pub async fn run_sync(
    store: &Mutex<WikiStore>,
    fetcher: &dyn FeedFetcher,
    translator: &dyn Translator,
    opts: &SyncOptions,
) -> Result<SyncReport> {
    if opts.feed_url.is_empty() {
        return Err(Error::Feed("no feed url configured".to_string()));
    }

    let xml = fetcher
        .fetch(&opts.feed_url)
        .await
        .map_err(|e| Error::Feed(format!("fetching {}: {}", opts.feed_url, e)))?;
    let items = parse_feed(&xml)?;

    let mut report = SyncReport { fetched: items.len(), ..SyncReport::default() };

    let mut pending = Vec::new();
    {
        let store = store.lock().await;
        let mut seen = HashSet::new();
        for item in items {
            if !seen.insert(item.guid.clone()) || store.event_exists(&item.guid)? {
                report.skipped_existing += 1;
                continue;
            }
            pending.push(item);
        }
    }

    if opts.max_items > 0 && pending.len() > opts.max_items {
        report.deferred = pending.len() - opts.max_items;
        pending.truncate(opts.max_items);
    }
    tracing::info!("Syncing {} new feed items", pending.len());

    for (i, item) in pending.iter().enumerate() {
        if i > 0 && !opts.delay.is_zero() {
            tokio::time::sleep(opts.delay).await;
        }

        let event = match translate_item(translator, item).await {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Translation failed for '{}': {}", item.guid, e);
                report.failed += 1;
                continue;
            }
        };

        if store.lock().await.insert_event_if_new(&event)? {
            tracing::debug!("Inserted event '{}'", event.external_id);
            report.inserted += 1;
        } else {
            report.skipped_existing += 1;
        }
    }

    tracing::info!("Sync finished: {}", report);
    Ok(report)
}

async fn translate_item(translator: &dyn Translator, item: &FeedItem) -> Result<Event> {
    let content = sanitize_html(&item.description);
    let title = translator.translate(&item.title).await?;
    // the translation endpoint decodes entities, so its output is untrusted markup
    let content = sanitize_html(&translator.translate(&content).await?);
    Ok(Event {
        id: 0,
        external_id: item.guid.clone(),
        title,
        content,
        original_title: Some(item.title.clone()),
        link: item.link.clone(),
        published_at: item.pub_date,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FEED: &str = r#"<rss><channel>
        <item><guid>a</guid><title>Первый</title><description><![CDATA[<p onclick="x()">Один</p><script>bad()</script>]]></description></item>
        <item><guid>b</guid><title>Второй</title><description>Два</description></item>
        <item><guid>c</guid><title>FAIL</title><description>Три</description></item>
    </channel></rss>"#;

    struct StaticFetcher(&'static str);

    #[async_trait]
    impl FeedFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl FeedFetcher for FailingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String> {
            Err(Error::Feed("connection refused".to_string()))
        }
    }

    /// Uppercases text and fails on titles containing FAIL
    struct UpperTranslator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for UpperTranslator {
        async fn translate(&self, text: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("FAIL") {
                return Err(Error::Translation("quota exceeded".to_string()));
            }
            Ok(text.to_uppercase())
        }
    }

    fn options() -> SyncOptions {
        SyncOptions {
            feed_url: "https://example.com/rss".to_string(),
            max_items: 0,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_sync_inserts_and_counts_failures() {
        let store = Mutex::new(WikiStore::open_in_memory().unwrap());
        let translator = UpperTranslator { calls: AtomicUsize::new(0) };

        let report = run_sync(&store, &StaticFetcher(FEED), &translator, &options()).await.unwrap();
        assert_eq!(report, SyncReport { fetched: 3, skipped_existing: 0, inserted: 2, failed: 1, deferred: 0 });

        let events = store.lock().await.list_events(10).unwrap();
        let first = events.iter().find(|e| e.external_id == "a").unwrap();
        assert_eq!(first.title, "ПЕРВЫЙ");
        assert_eq!(first.original_title.as_deref(), Some("Первый"));
        assert_eq!(first.content, "<p>ОДИН</p>");
    }

    #[tokio::test]
    async fn test_rerun_skips_existing() {
        let store = Mutex::new(WikiStore::open_in_memory().unwrap());
        let translator = UpperTranslator { calls: AtomicUsize::new(0) };
        run_sync(&store, &StaticFetcher(FEED), &translator, &options()).await.unwrap();
        let calls_after_first = translator.calls.load(Ordering::SeqCst);

        let report = run_sync(&store, &StaticFetcher(FEED), &translator, &options()).await.unwrap();
        assert_eq!(report.skipped_existing, 2);
        assert_eq!(report.inserted, 0);
        assert_eq!(report.failed, 1);
        // only the failed item is translated again
        assert_eq!(translator.calls.load(Ordering::SeqCst), calls_after_first + 1);
        assert_eq!(store.lock().await.list_events(10).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_max_items_defers_the_rest() {
        let store = Mutex::new(WikiStore::open_in_memory().unwrap());
        let opts = SyncOptions { max_items: 1, ..options() };
        let report = run_sync(&store, &StaticFetcher(FEED), &NoopTranslator, &opts).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.deferred, 2);
    }

    /// Decodes entities the way the remote endpoint does
    struct DecodingTranslator;

    #[async_trait]
    impl Translator for DecodingTranslator {
        async fn translate(&self, text: &str) -> Result<String> {
            Ok(text.replace("&lt;", "<").replace("&gt;", ">"))
        }
    }

    #[tokio::test]
    async fn test_translated_content_is_sanitized() {
        const ESCAPED: &str = r#"<rss><channel>
            <item><guid>x</guid><title>T</title><description><![CDATA[<p>&lt;script&gt;steal()&lt;/script&gt;</p>]]></description></item>
        </channel></rss>"#;
        let store = Mutex::new(WikiStore::open_in_memory().unwrap());
        let report = run_sync(&store, &StaticFetcher(ESCAPED), &DecodingTranslator, &options()).await.unwrap();
        assert_eq!(report.inserted, 1);

        let events = store.lock().await.list_events(10).unwrap();
        assert_eq!(events[0].content, "<p></p>");
    }

    #[tokio::test]
    async fn test_feed_failure_aborts() {
        let store = Mutex::new(WikiStore::open_in_memory().unwrap());
        let err = run_sync(&store, &FailingFetcher, &NoopTranslator, &options()).await.unwrap_err();
        assert!(matches!(err, Error::Feed(_)));

        let err = run_sync(&store, &StaticFetcher("not xml"), &NoopTranslator, &options()).await.unwrap_err();
        assert!(matches!(err, Error::Feed(_)));
    }
}
