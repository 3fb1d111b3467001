use crate::css;
use crate::levers::{apply_levers, LeverDef, LeverValues};
use crate::model::{Token, TokenCategory, TokenSet, TokenSource};
use crate::ops::{combine, merge, CombineRecipe};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Source of unique ids for variations and generated token sets.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, prefix: &str) -> String;
}

/// `{prefix}-1`, `{prefix}-2`, ... shared across prefixes.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", prefix, n)
    }
}

/// `{prefix}-{unix millis}`, bumped by one when two ids land on the same
/// millisecond.
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: AtomicI64,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for TimestampIds {
    fn next_id(&self, prefix: &str) -> String {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        format!("{}-{}", prefix, now.max(prev + 1))
    }
}

/// A generated token set paired with the direction that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub id: String,
    pub direction: String,
    pub token_set: TokenSet,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_context: Option<String>,
}

impl Variation {
    /// Merge a block of CSS overrides onto `base`.
    ///
    /// Returns `None` when the CSS holds no custom-property declarations.
    pub fn from_css(
        base: &TokenSet,
        direction: &str,
        css_text: &str,
        label: Option<&str>,
        ids: &dyn IdGenerator,
    ) -> Option<Self> {
        let overrides = css::parse_categorized(css_text);
        if overrides.is_empty() {
            return None;
        }

        let id = ids.next_id("variation");
        let token_set = TokenSet::derived(
            base,
            format!("tokens-{}", id),
            label.unwrap_or(direction),
            direction,
            merge(&base.tokens, &overrides),
        );

        Some(Self {
            id,
            direction: direction.to_string(),
            token_set,
            created_at: Utc::now(),
            brand_context: None,
        })
    }

    /// Wrap a token set produced elsewhere (an AI transform). The set is
    /// re-keyed to `tokens-{variation id}`.
    pub fn from_token_set(
        mut token_set: TokenSet,
        direction: &str,
        brand_context: Option<String>,
        ids: &dyn IdGenerator,
    ) -> Self {
        let id = ids.next_id("variation");
        token_set.id = format!("tokens-{}", id);

        Self {
            id,
            direction: direction.to_string(),
            token_set,
            created_at: Utc::now(),
            brand_context: brand_context.filter(|b| !b.trim().is_empty()),
        }
    }

    /// Build a variation category by category from `sets`.
    ///
    /// `labels` maps token set id to a display label; categories whose source
    /// has no label (or that the recipe leaves out) show up as `?`.
    pub fn combined(
        recipe: &CombineRecipe,
        sets: &HashMap<String, TokenSet>,
        labels: &HashMap<String, String>,
        base: &TokenSet,
        ids: &dyn IdGenerator,
    ) -> Self {
        let mut source_labels: Vec<&str> = Vec::new();
        for category in TokenCategory::ALL {
            let label = recipe
                .get(&category)
                .and_then(|set_id| labels.get(set_id))
                .map(String::as_str)
                .unwrap_or("?");
            if !source_labels.contains(&label) {
                source_labels.push(label);
            }
        }
        let direction = format!("Combined: {}", source_labels.join(" + "));

        let id = ids.next_id("combine");
        let token_set = TokenSet::derived(
            base,
            format!("tokens-{}", id),
            direction.clone(),
            direction.clone(),
            combine(recipe, sets, base),
        );

        Self {
            id,
            direction,
            token_set,
            created_at: Utc::now(),
            brand_context: None,
        }
    }

    pub fn duplicate(&self, ids: &dyn IdGenerator) -> Self {
        let id = ids.next_id("dup");
        let label = format!("{} (copy)", self.token_set.label);

        Self {
            id: id.clone(),
            direction: label.clone(),
            token_set: TokenSet {
                id: format!("ts-{}", id),
                label,
                source: TokenSource::Generated,
                ..self.token_set.clone()
            },
            created_at: Utc::now(),
            brand_context: self.brand_context.clone(),
        }
    }

    /// Replace the token list with `pristine` run through `levers`.
    pub fn with_levers(&self, pristine: &[Token], levers: &[&LeverDef], values: &LeverValues) -> Self {
        let mut next = self.clone();
        next.token_set.tokens = apply_levers(pristine, levers, values);
        next
    }
}
