//! Per-story extraction, batched with bounded concurrency.

use crate::config::ScrapeConfig;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What one story page yielded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedStory {
    pub story_id: String,
    pub html: String,
    /// Every `<style>` element's text, joined with newlines.
    pub styles: String,
    /// Custom property name -> resolved value.
    pub computed_tokens: IndexMap<String, String>,
}

/// Renders a single story and reads back its markup and custom properties.
///
/// `extract` may be called concurrently; `close` is called once, after the
/// last extraction.
#[async_trait]
pub trait StoryExtractor: Send + Sync {
    async fn extract(&self, base_url: &str, story_id: &str) -> anyhow::Result<ExtractedStory>;

    async fn close(&mut self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// Successful stories, in input order.
    pub results: Vec<ExtractedStory>,
    /// `"{story id}: {message}"` per failed story, in input order.
    pub errors: Vec<String>,
}

/// Extract `story_ids` in sequential batches of `config.concurrency`.
///
/// A failing story never cancels its siblings. `on_progress(done, total)`
/// fires once per settled story, in settle order.
pub async fn extract_stories<E, P>(
    extractor: &E,
    base_url: &str,
    story_ids: &[String],
    config: &ScrapeConfig,
    mut on_progress: P,
) -> ExtractionOutcome
where
    E: StoryExtractor + ?Sized,
    P: FnMut(usize, usize),
{
    let total = story_ids.len();
    let batch_size = config.concurrency.max(1);
    let mut outcome = ExtractionOutcome::default();
    let mut done = 0;

    for (batch_index, batch) in story_ids.chunks(batch_size).enumerate() {
        let mut pending: FuturesUnordered<_> = batch
            .iter()
            .enumerate()
            .map(|(slot, id)| async move { (slot, id, extractor.extract(base_url, id).await) })
            .collect();

        let mut settled = Vec::with_capacity(batch.len());
        while let Some(item) = pending.next().await {
            done += 1;
            on_progress(done, total);
            settled.push(item);
        }
        settled.sort_by_key(|(slot, _, _)| *slot);

        for (_, id, result) in settled {
            match result {
                Ok(story) => {
                    debug!("Extracted story {}", id);
                    outcome.results.push(story);
                }
                Err(e) => {
                    warn!("Story {} failed: {:#}", id, e);
                    outcome.errors.push(format!("{}: {:#}", id, e));
                }
            }
        }

        let is_last = (batch_index + 1) * batch_size >= total;
        if !is_last && !config.batch_delay.is_zero() {
            tokio::time::sleep(config.batch_delay).await;
        }
    }

    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// In-memory extractor: fails the configured ids, delays the rest by a
    /// per-id amount, and records call order, concurrency and shutdown.
    #[derive(Default)]
    pub(crate) struct MockExtractor {
        pub failing: HashSet<String>,
        pub delays: Vec<(String, u64)>,
        pub tokens: Vec<(String, String)>,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
        pub closed: Arc<Mutex<bool>>,
        pub seen: Arc<Mutex<Vec<String>>>,
    }

    impl MockExtractor {
        pub fn failing(ids: &[&str]) -> Self {
            Self {
                failing: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl StoryExtractor for MockExtractor {
        async fn extract(&self, _base_url: &str, story_id: &str) -> anyhow::Result<ExtractedStory> {
            self.seen.lock().unwrap().push(story_id.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = self
                .delays
                .iter()
                .find(|(id, _)| id == story_id)
                .map(|(_, ms)| *ms)
                .unwrap_or(1);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(story_id) {
                anyhow::bail!("Navigation timeout of 15000 ms exceeded");
            }

            Ok(ExtractedStory {
                story_id: story_id.to_string(),
                html: format!("<div id=\"{}\"></div>", story_id),
                styles: String::new(),
                computed_tokens: self.tokens.iter().cloned().collect(),
            })
        }

        async fn close(&mut self) -> anyhow::Result<()> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("story-{}", i)).collect()
    }

    fn fast_config() -> ScrapeConfig {
        ScrapeConfig::default().with_batch_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_batch_failure_isolation() {
        let extractor = MockExtractor::failing(&["story-3"]);
        let mut progress = Vec::new();

        let outcome = extract_stories(&extractor, "http://sb", &ids(5), &fast_config(), |done, total| {
            progress.push((done, total))
        })
        .await;

        assert_eq!(outcome.results.len(), 4);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("story-3: "));
        assert_eq!(progress, [(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
    }

    #[tokio::test]
    async fn test_results_keep_input_order_within_batch() {
        let extractor = MockExtractor {
            delays: vec![("story-1".into(), 40), ("story-2".into(), 20), ("story-3".into(), 1)],
            ..Default::default()
        };

        let outcome = extract_stories(&extractor, "http://sb", &ids(4), &fast_config(), |_, _| {}).await;
        let order: Vec<_> = outcome.results.iter().map(|r| r.story_id.as_str()).collect();
        assert_eq!(order, ["story-1", "story-2", "story-3", "story-4"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let extractor = MockExtractor {
            delays: (1..=7).map(|i| (format!("story-{}", i), 10)).collect(),
            ..Default::default()
        };
        let config = fast_config().with_concurrency(2);

        let outcome = extract_stories(&extractor, "http://sb", &ids(7), &config, |_, _| {}).await;
        assert_eq!(outcome.results.len(), 7);
        assert!(extractor.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_no_stories() {
        let extractor = MockExtractor::default();
        let mut calls = 0;
        let outcome = extract_stories(&extractor, "http://sb", &[], &fast_config(), |_, _| calls += 1).await;
        assert!(outcome.results.is_empty());
        assert_eq!(calls, 0);
    }
}
