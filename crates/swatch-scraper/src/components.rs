use crate::extract::ExtractedStory;
use crate::index::GroupedStory;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStory {
    pub id: String,
    pub name: String,
    /// Empty when this variant failed or was not scraped.
    pub html: String,
    pub story_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedComponent {
    pub id: String,
    pub name: String,
    pub group: String,
    /// Markup of the first variant that rendered anything.
    pub html: String,
    pub inline_styles: String,
    pub stories: Vec<ComponentStory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentGroup {
    pub name: String,
    pub components: Vec<ExtractedComponent>,
}

pub fn component_id(name: &str) -> String {
    WHITESPACE_RE.replace_all(&name.to_lowercase(), "-").into_owned()
}

/// Assemble components from grouped stories and whatever was extracted.
/// Components with no rendered variant are dropped; the rest are bucketed by
/// the first segment of their group path.
pub fn build_component_groups(
    grouped: &[GroupedStory],
    extracted: &[ExtractedStory],
) -> Vec<ComponentGroup> {
    let by_id: HashMap<&str, &ExtractedStory> = extracted
        .iter()
        .map(|e| (e.story_id.as_str(), e))
        .collect();

    let mut buckets: IndexMap<String, Vec<ExtractedComponent>> = IndexMap::new();

    for g in grouped {
        let representative = g
            .stories
            .iter()
            .filter_map(|s| by_id.get(s.id.as_str()))
            .find(|e| !e.html.trim().is_empty());

        let Some(representative) = representative else {
            continue;
        };

        let component = ExtractedComponent {
            id: component_id(&g.component),
            name: g.component.clone(),
            group: g.group.clone(),
            html: representative.html.clone(),
            inline_styles: representative.styles.clone(),
            stories: g
                .stories
                .iter()
                .map(|s| ComponentStory {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    html: by_id
                        .get(s.id.as_str())
                        .map(|e| e.html.clone())
                        .unwrap_or_default(),
                    story_id: s.id.clone(),
                })
                .collect(),
        };

        let top = g
            .group
            .split('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("Ungrouped");
        buckets.entry(top.to_string()).or_default().push(component);
    }

    buckets
        .into_iter()
        .map(|(name, components)| ComponentGroup { name, components })
        .collect()
}
