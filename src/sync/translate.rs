//! Machine translation of synced news

use crate::config::TranslateConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Longest text sent in one request
pub const MAX_CHUNK_CHARS: usize = 1800;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Returns the text unchanged
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Client for the free Google `translate_a/single` (client=gtx) endpoint
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: String,
    source: String,
    target: String,
}

impl HttpTranslator {
    pub fn new(endpoint: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            source: source.into(),
            target: target.into(),
        })
    }

    async fn translate_chunk(&self, chunk: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source.as_str()),
                ("tl", self.target.as_str()),
                ("dt", "t"),
                ("q", chunk),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Translation(format!("endpoint returned {}", status)));
        }
        let body: Value = response.json().await?;
        parse_response(&body)
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        let mut out = String::with_capacity(text.len());
        for chunk in split_chunks(text, MAX_CHUNK_CHARS) {
            out.push_str(&self.translate_chunk(chunk).await?);
        }
        Ok(out)
    }
}

/// Build the translator selected by configuration
pub fn build_translator(config: &TranslateConfig) -> Result<Arc<dyn Translator>> {
    if !config.enabled {
        return Ok(Arc::new(NoopTranslator));
    }
    let translator = HttpTranslator::new(&config.endpoint, &config.source, &config.target)?;
    Ok(Arc::new(translator))
}

/// Join the translated sentences of a gtx response: `[[["out", "in", ...], ...], ...]`
fn parse_response(body: &Value) -> Result<String> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Translation("unexpected response shape".to_string()))?;
    Ok(sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect())
}

/// Split text into pieces of at most `max_chars` characters, preferring
/// line, sentence and tag boundaries
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut len = 0;
    let mut last_break = None;

    for (idx, c) in text.char_indices() {
        let end = idx + c.len_utf8();
        len += 1;
        if matches!(c, '\n' | '.' | '>' | '!' | '?') {
            last_break = Some(end);
        }
        if len >= max_chars {
            let cut = last_break.filter(|&b| b > start).unwrap_or(end);
            chunks.push(&text[start..cut]);
            start = cut;
            len = text[start..end].chars().count();
            last_break = None;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_gtx_response() {
        let body = json!([[["Hello. ", "Привет. ", null], ["World", "Мир", null]], null, "ru"]);
        assert_eq!(parse_response(&body).unwrap(), "Hello. World");
        assert!(parse_response(&json!({"error": 1})).is_err());
    }

    #[test]
    fn test_split_chunks_prefers_sentence_boundaries() {
        let text = "First one. Second one. Third.";
        let chunks = split_chunks(text, 15);
        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks[0], "First one.");
        assert!(chunks.iter().all(|c| c.chars().count() <= 15));
    }

    #[test]
    fn test_split_chunks_hard_split_and_multibyte() {
        let text = "ааааааааааа";
        let chunks = split_chunks(text, 4);
        assert_eq!(chunks, vec!["аааа", "аааа", "ааа"]);
        assert_eq!(split_chunks("short", 100), vec!["short"]);
        assert!(split_chunks("", 10).is_empty());
    }

    #[tokio::test]
    async fn test_noop_translator() {
        let translator = NoopTranslator;
        assert_eq!(translator.translate("<p>Текст</p>").await.unwrap(), "<p>Текст</p>");
    }

    #[test]
    fn test_build_translator_disabled() {
        let config = TranslateConfig { enabled: false, ..TranslateConfig::default() };
        assert!(build_translator(&config).is_ok());
    }
}
