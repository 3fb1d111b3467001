//! Story index discovery and grouping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use swatch_common::{Result, SwatchError};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
}

impl StoryEntry {
    pub fn is_docs(&self) -> bool {
        self.kind.as_deref() == Some("docs")
    }
}

/// Every story keyed by id, in the order the index listed them.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryIndex {
    pub entries: IndexMap<String, StoryEntry>,
    /// 7 for `index.json`, 6 for `stories.json`.
    pub version: u8,
}

#[derive(Deserialize)]
struct V7Index {
    #[serde(default)]
    entries: Option<IndexMap<String, StoryEntry>>,
}

#[derive(Deserialize)]
struct V6Index {
    #[serde(default)]
    stories: Option<IndexMap<String, V6Story>>,
}

#[derive(Deserialize)]
struct V6Story {
    title: Option<String>,
    kind: Option<String>,
    name: Option<String>,
    story: Option<String>,
}

fn first_non_empty(candidates: [Option<String>; 2]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

pub struct StoryIndexFetcher {
    client: reqwest::Client,
}

impl StoryIndexFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Try `index.json` (Storybook 7+), then `stories.json` (Storybook 6).
    pub async fn fetch(&self, base_url: &str) -> Result<StoryIndex> {
        let base = base_url.trim_end_matches('/');

        match self.fetch_v7(base).await {
            Ok(Some(index)) => return Ok(index),
            Ok(None) => debug!("{}/index.json has no entries", base),
            Err(e) => warn!("Failed to fetch {}/index.json: {:#}", base, e),
        }

        match self.fetch_v6(base).await {
            Ok(Some(index)) => return Ok(index),
            Ok(None) => debug!("{}/stories.json has no stories", base),
            Err(e) => warn!("Failed to fetch {}/stories.json: {:#}", base, e),
        }

        Err(SwatchError::Index(format!(
            "Could not fetch story index from {}. Tried /index.json and /stories.json. \
             Make sure the Storybook is publicly accessible.",
            base
        )))
    }

    async fn fetch_v7(&self, base: &str) -> anyhow::Result<Option<StoryIndex>> {
        let response = self
            .client
            .get(format!("{}/index.json", base))
            .send()
            .await?
            .error_for_status()?;
        let parsed: V7Index = response.json().await?;

        Ok(parsed.entries.map(|entries| {
            let entries: IndexMap<String, StoryEntry> = entries
                .into_iter()
                .map(|(key, mut entry)| {
                    if entry.id.is_empty() {
                        entry.id = key.clone();
                    }
                    (key, entry)
                })
                .collect();
            info!("Loaded {} index entries (v7)", entries.len());
            StoryIndex {
                entries,
                version: 7,
            }
        }))
    }

    async fn fetch_v6(&self, base: &str) -> anyhow::Result<Option<StoryIndex>> {
        let response = self
            .client
            .get(format!("{}/stories.json", base))
            .send()
            .await?
            .error_for_status()?;
        let parsed: V6Index = response.json().await?;

        Ok(parsed.stories.map(|stories| {
            let entries: IndexMap<String, StoryEntry> = stories
                .into_iter()
                .map(|(id, story)| {
                    let entry = StoryEntry {
                        id: id.clone(),
                        title: first_non_empty([story.title, story.kind]),
                        name: first_non_empty([story.name, story.story]),
                        kind: Some("story".to_string()),
                        import_path: None,
                    };
                    (id, entry)
                })
                .collect();
            info!("Loaded {} index entries (v6)", entries.len());
            StoryIndex {
                entries,
                version: 6,
            }
        }))
    }
}

/// Stories sharing one title path, i.e. one component.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedStory {
    pub group: String,
    pub component: String,
    pub stories: Vec<StoryEntry>,
}

/// Group non-docs entries by full title. `"Components/Forms/Button"` becomes
/// group `"Components/Forms"`, component `"Button"`; a title without `/` is
/// grouped under `"Ungrouped"`.
pub fn group_stories(index: &StoryIndex) -> Vec<GroupedStory> {
    let mut grouped: IndexMap<&str, GroupedStory> = IndexMap::new();

    for entry in index.entries.values() {
        if entry.is_docs() {
            continue;
        }

        grouped
            .entry(entry.title.as_str())
            .or_insert_with(|| {
                let (group, component) = match entry.title.rsplit_once('/') {
                    Some((group, component)) => (group.to_string(), component.to_string()),
                    None => ("Ungrouped".to_string(), entry.title.clone()),
                };
                GroupedStory {
                    group,
                    component,
                    stories: Vec::new(),
                }
            })
            .stories
            .push(entry.clone());
    }

    grouped.into_values().collect()
}
