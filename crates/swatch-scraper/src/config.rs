use std::time::Duration;

/// Limits and timings for one scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Stories beyond this many (in discovery order) are not scraped.
    pub max_stories: usize,
    /// Stories extracted concurrently per batch.
    pub concurrency: usize,
    /// Bound on navigation and, separately, on the render wait.
    pub story_timeout: Duration,
    /// Pause after render so late CSS and animations settle.
    pub settle_delay: Duration,
    pub batch_delay: Duration,
    pub index_timeout: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_stories: 50,
            concurrency: 3,
            story_timeout: Duration::from_secs(15),
            settle_delay: Duration::from_millis(1500),
            batch_delay: Duration::from_millis(200),
            index_timeout: Duration::from_secs(30),
        }
    }
}

impl ScrapeConfig {
    pub fn with_max_stories(mut self, max_stories: usize) -> Self {
        self.max_stories = max_stories;
        self
    }

    /// Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_story_timeout(mut self, timeout: Duration) -> Self {
        self.story_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn with_index_timeout(mut self, timeout: Duration) -> Self {
        self.index_timeout = timeout;
        self
    }
}
