//! Storybook scraping: story index discovery, browser-driven extraction and
//! assembly of the extracted token set and component groups.

pub mod chrome;
pub mod components;
pub mod config;
pub mod extract;
pub mod index;
pub mod pipeline;

pub use chrome::{find_browser_executable, ChromeExtractor};
pub use components::{ComponentGroup, ComponentStory, ExtractedComponent};
pub use config::ScrapeConfig;
pub use extract::{extract_stories, ExtractedStory, ExtractionOutcome, StoryExtractor};
pub use index::{group_stories, GroupedStory, StoryEntry, StoryIndex, StoryIndexFetcher};
pub use pipeline::{scrape, ScrapePhase, ScrapeProgress, ScrapeResult, ScrapeStats, Scraper};
