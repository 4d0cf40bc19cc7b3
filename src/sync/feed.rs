//! RSS 2.0 item extraction

use crate::html::decode_entities;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// One `<item>` of the feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub guid: String,
    pub title: String,
    pub link: Option<String>,
    /// Raw HTML body, not yet sanitized
    pub description: String,
    pub pub_date: Option<DateTime<Utc>>,
}

struct Patterns {
    item: Regex,
    cdata: Regex,
    title: Regex,
    link: Regex,
    guid: Regex,
    description: Regex,
    pub_date: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn element(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{0}(?:\s[^>]*)?>(.*?)</{0}\s*>", tag)).expect("element pattern is valid")
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        item: element("item"),
        cdata: Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("cdata pattern is valid"),
        title: element("title"),
        link: element("link"),
        guid: element("guid"),
        description: element("description"),
        pub_date: element("pubDate"),
    })
}

/// Parse the items of an RSS document in feed order.
///
/// Items without both a guid and a link are dropped.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>> {
    if !xml.contains("<rss") && !xml.contains("<channel") {
        return Err(Error::Feed("document is not an RSS feed".to_string()));
    }

    let p = patterns();
    let mut items = Vec::new();
    for caps in p.item.captures_iter(xml) {
        let body = &caps[1];
        let text = |re: &Regex| {
            re.captures(body)
                .map(|c| element_text(&c[1]))
                .filter(|t| !t.is_empty())
        };

        let link = text(&p.link);
        let Some(guid) = text(&p.guid).or_else(|| link.clone()) else {
            tracing::debug!("Skipping feed item without guid or link");
            continue;
        };

        items.push(FeedItem {
            guid,
            title: text(&p.title).unwrap_or_default(),
            link,
            description: text(&p.description).unwrap_or_default(),
            pub_date: text(&p.pub_date).and_then(|d| parse_date(&d)),
        });
    }
    Ok(items)
}

/// Element content with CDATA unwrapped and entities decoded outside of it
fn element_text(raw: &str) -> String {
    let cdata = &patterns().cdata;
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for caps in cdata.captures_iter(raw) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&decode_entities(&raw[last..whole.start()]));
        out.push_str(&caps[1]);
        last = whole.end();
    }
    out.push_str(&decode_entities(&raw[last..]));
    out.trim().to_string()
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Warspear Online</title>
    <item>
      <title>Arena &amp; siege update</title>
      <link>https://example.com/news/1</link>
      <guid isPermaLink="false">news-1</guid>
      <description><![CDATA[<p>New <b>arena</b> season</p>]]></description>
      <pubDate>Mon, 02 Jun 2025 10:00:00 +0300</pubDate>
    </item>
    <item>
      <title><![CDATA[Maintenance]]></title>
      <link>https://example.com/news/2</link>
      <description>&lt;p&gt;Servers down&lt;/p&gt;</description>
    </item>
    <item>
      <title>No id at all</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_items() {
        let items = parse_feed(FEED).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.guid, "news-1");
        assert_eq!(first.title, "Arena & siege update");
        assert_eq!(first.description, "<p>New <b>arena</b> season</p>");
        assert_eq!(first.pub_date, Some(Utc.with_ymd_and_hms(2025, 6, 2, 7, 0, 0).unwrap()));
    }

    #[test]
    fn test_guid_falls_back_to_link() {
        let items = parse_feed(FEED).unwrap();
        let second = &items[1];
        assert_eq!(second.guid, "https://example.com/news/2");
        assert_eq!(second.title, "Maintenance");
        assert_eq!(second.description, "<p>Servers down</p>");
        assert!(second.pub_date.is_none());
    }

    #[test]
    fn test_rejects_non_rss() {
        assert!(matches!(parse_feed("<html><body>502</body></html>"), Err(Error::Feed(_))));
        assert!(parse_feed("<rss><channel></channel></rss>").unwrap().is_empty());
    }
}
