use crate::chrome::ChromeExtractor;
use crate::components::{build_component_groups, ComponentGroup};
use crate::config::ScrapeConfig;
use crate::extract::{extract_stories, ExtractedStory, ExtractionOutcome, StoryExtractor};
use crate::index::{group_stories, StoryIndexFetcher};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use swatch_common::{Result, SwatchError};
use swatch_tokens::{sort_tokens, IdGenerator, TimestampIds, Token, TokenSet};
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapePhase {
    FetchingIndex,
    ExtractingStories,
    BuildingTokens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeProgress {
    pub phase: ScrapePhase,
    pub done: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeStats {
    pub total_stories: usize,
    pub scraped_stories: usize,
    pub extracted_tokens: usize,
    pub components: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub components: Vec<ComponentGroup>,
    pub tokens: TokenSet,
    pub warnings: Vec<String>,
    pub stats: ScrapeStats,
}

pub struct Scraper {
    config: ScrapeConfig,
    fetcher: StoryIndexFetcher,
    ids: Arc<dyn IdGenerator>,
}

impl Scraper {
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let fetcher = StoryIndexFetcher::new(config.index_timeout)?;
        Ok(Self {
            config,
            fetcher,
            ids: Arc::new(TimestampIds::new()),
        })
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Scrape with headless Chrome at `executable`.
    pub async fn run<P>(&self, url: &str, executable: &Path, on_progress: P) -> Result<ScrapeResult>
    where
        P: Fn(ScrapeProgress),
    {
        let config = self.config.clone();
        self.run_with(
            url,
            || async move { ChromeExtractor::launch(executable, &config).await },
            on_progress,
        )
        .await
    }

    /// Run the full pipeline with an extractor produced by `launch`.
    ///
    /// `launch` is only called once the index has been fetched and holds at
    /// least one story. The extractor is always closed before returning.
    pub async fn run_with<E, F, Fut, P>(
        &self,
        url: &str,
        launch: F,
        on_progress: P,
    ) -> Result<ScrapeResult>
    where
        E: StoryExtractor,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<E>>,
        P: Fn(ScrapeProgress),
    {
        let parsed = Url::parse(url)
            .map_err(|e| SwatchError::Config(format!("Invalid Storybook URL {}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SwatchError::Config(format!(
                "Storybook URL must be http or https: {}",
                url
            )));
        }
        let base_url = url.trim_end_matches('/');
        let progress = |phase, done, total| on_progress(ScrapeProgress { phase, done, total });
        let mut warnings = Vec::new();

        progress(ScrapePhase::FetchingIndex, 0, 1);
        let index = self.fetcher.fetch(base_url).await?;
        let grouped = group_stories(&index);

        let all_ids: Vec<String> = grouped
            .iter()
            .flat_map(|g| g.stories.iter().map(|s| s.id.clone()))
            .collect();
        let cap = self.config.max_stories;
        let story_ids: Vec<String> = all_ids.iter().take(cap).cloned().collect();
        if all_ids.len() > cap {
            warnings.push(format!(
                "Found {} stories, scraping first {}. You can select specific components after scraping.",
                all_ids.len(),
                cap
            ));
        }
        info!(
            "Story index v{}: {} stories in {} components",
            index.version,
            all_ids.len(),
            grouped.len()
        );
        progress(ScrapePhase::FetchingIndex, 1, 1);

        let total = story_ids.len();
        progress(ScrapePhase::ExtractingStories, 0, total);
        let outcome: ExtractionOutcome = if story_ids.is_empty() {
            ExtractionOutcome::default()
        } else {
            let mut extractor = launch()
                .await
                .map_err(|e| SwatchError::Browser(format!("{:#}", e)))?;

            let outcome = extract_stories(&extractor, base_url, &story_ids, &self.config, |done, total| {
                progress(ScrapePhase::ExtractingStories, done, total)
            })
            .await;

            if let Err(e) = extractor.close().await {
                warn!("Failed to close browser: {:#}", e);
            }
            outcome
        };

        if !outcome.errors.is_empty() {
            let sample: Vec<&str> = outcome.errors.iter().take(3).map(String::as_str).collect();
            warnings.push(format!(
                "{} stories failed to extract: {}",
                outcome.errors.len(),
                sample.join("; ")
            ));
        }
        if outcome.results.is_empty() {
            warnings.push(
                "No stories could be extracted; the token set and component list are empty."
                    .to_string(),
            );
        }
        info!(
            "Extracted {}/{} stories ({} failed)",
            outcome.results.len(),
            total,
            outcome.errors.len()
        );

        progress(ScrapePhase::BuildingTokens, 0, 1);
        let hostname = parsed.host_str().unwrap_or(base_url);
        let tokens = build_token_set(
            &outcome.results,
            self.ids.next_id("extracted"),
            format!("{} (extracted)", hostname),
        );
        let components = build_component_groups(&grouped, &outcome.results);
        progress(ScrapePhase::BuildingTokens, 1, 1);

        let stats = ScrapeStats {
            total_stories: all_ids.len(),
            scraped_stories: outcome.results.len(),
            extracted_tokens: tokens.len(),
            components: components.iter().map(|g| g.components.len()).sum(),
        };

        Ok(ScrapeResult {
            components,
            tokens,
            warnings,
            stats,
        })
    }
}

/// Merge every story's custom properties: the first non-empty value seen for
/// a name wins, then tokens are categorized and sorted.
pub fn build_token_set(
    stories: &[ExtractedStory],
    id: impl Into<String>,
    label: impl Into<String>,
) -> TokenSet {
    let mut values: IndexMap<&str, &str> = IndexMap::new();
    for story in stories {
        for (name, value) in &story.computed_tokens {
            if !value.is_empty() {
                values.entry(name.as_str()).or_insert(value.as_str());
            }
        }
    }

    let mut tokens: Vec<Token> = values
        .into_iter()
        .map(|(name, value)| Token::new(name, value))
        .collect();
    sort_tokens(&mut tokens);

    TokenSet::extracted(id, label, tokens)
}

/// Scrape `url` with default limits and the browser at `executable`.
pub async fn scrape<P>(url: &str, executable: &Path, on_progress: P) -> Result<ScrapeResult>
where
    P: Fn(ScrapeProgress),
{
    Scraper::new(ScrapeConfig::default())?
        .run(url, executable, on_progress)
        .await
}
