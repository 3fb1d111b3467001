use crate::model::{Token, TokenCategory, TokenSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// category -> id of the token set that category should be sourced from
pub type CombineRecipe = HashMap<TokenCategory, String>;

/// Apply `overrides` onto `base` by name. The output always has the base's
/// names, count and order; overrides for names the base lacks are ignored.
pub fn merge(base: &[Token], overrides: &[Token]) -> Vec<Token> {
    let override_values: HashMap<&str, &str> = overrides
        .iter()
        .map(|t| (t.name.as_str(), t.value.as_str()))
        .collect();

    base.iter()
        .map(|token| match override_values.get(token.name.as_str()) {
            Some(value) => token.with_value(*value),
            None => token.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDiffEntry {
    pub name: String,
    pub category: TokenCategory,
    pub old_value: String,
    pub new_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDiff {
    pub changed: Vec<TokenDiffEntry>,
    pub unchanged: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDiffResult {
    pub changed: Vec<TokenDiffEntry>,
    pub unchanged: Vec<Token>,
    pub by_category: IndexMap<TokenCategory, CategoryDiff>,
    pub total_changed: usize,
}

/// Compare `candidate` against `base`, token by token, over the base's names
/// only. Names that exist only in the candidate never show up.
pub fn diff(base: &TokenSet, candidate: &TokenSet) -> TokenDiffResult {
    let candidate_values: HashMap<&str, &str> = candidate
        .tokens
        .iter()
        .map(|t| (t.name.as_str(), t.value.as_str()))
        .collect();

    let mut changed = Vec::new();
    let mut unchanged = Vec::new();

    for token in &base.tokens {
        match candidate_values.get(token.name.as_str()) {
            Some(value) if *value != token.value => changed.push(TokenDiffEntry {
                name: token.name.clone(),
                category: token.category,
                old_value: token.value.clone(),
                new_value: value.to_string(),
            }),
            _ => unchanged.push(token.clone()),
        }
    }

    let mut by_category: IndexMap<TokenCategory, CategoryDiff> = IndexMap::new();
    for entry in &changed {
        by_category
            .entry(entry.category)
            .or_default()
            .changed
            .push(entry.clone());
    }
    for token in &unchanged {
        by_category
            .entry(token.category)
            .or_default()
            .unchanged
            .push(token.clone());
    }

    TokenDiffResult {
        total_changed: changed.len(),
        changed,
        unchanged,
        by_category,
    }
}

/// Assemble a token list category by category from several sets.
///
/// For each base token, the recipe names a source set for its category; the
/// source's value is used when that set exists and has the same name,
/// otherwise the base value is kept.
pub fn combine(
    recipe: &CombineRecipe,
    sets: &HashMap<String, TokenSet>,
    base: &TokenSet,
) -> Vec<Token> {
    base.tokens
        .iter()
        .map(|token| {
            recipe
                .get(&token.category)
                .and_then(|source_id| sets.get(source_id))
                .and_then(|source| source.get(&token.name))
                .map(|source_token| token.with_value(source_token.value.clone()))
                .unwrap_or_else(|| token.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(id: &str, tokens: &[(&str, &str)]) -> TokenSet {
        TokenSet::extracted(
            id,
            id,
            tokens.iter().map(|(n, v)| Token::new(*n, *v)).collect(),
        )
    }

    #[test]
    fn test_merge_preserves_shape() {
        let base = set("b", &[("--color-a", "#fff"), ("--radius-1", "4px"), ("--gap", "2px")]);
        let overrides = vec![
            Token::new("--radius-1", "0px"),
            Token::new("--brand-new", "#123456"),
        ];

        let merged = merge(&base.tokens, &overrides);
        assert_eq!(merged.len(), base.tokens.len());
        for (m, b) in merged.iter().zip(&base.tokens) {
            assert_eq!(m.name, b.name);
            assert_eq!(m.category, b.category);
        }
        assert_eq!(merged[1].value, "0px");
        assert_eq!(merged[0].value, "#fff");
    }

    #[test]
    fn test_merge_with_no_overrides_is_identity() {
        let base = set("b", &[("--color-a", "#fff")]);
        assert_eq!(merge(&base.tokens, &[]), base.tokens);
    }

    #[test]
    fn test_diff_identical_sets() {
        let base = set("b", &[("--color-a", "#fff"), ("--radius-1", "4px")]);
        let result = diff(&base, &base.clone());
        assert_eq!(result.total_changed, 0);
        assert_eq!(result.unchanged.len(), 2);
    }

    #[test]
    fn test_diff_directionality() {
        let base = set("b", &[("--a", "#fff")]);
        let candidate = set("c", &[("--a", "#000")]);

        let result = diff(&base, &candidate);
        assert_eq!(result.total_changed, 1);
        assert_eq!(
            result.changed[0],
            TokenDiffEntry {
                name: "--a".into(),
                category: TokenCategory::Color,
                old_value: "#fff".into(),
                new_value: "#000".into(),
            }
        );
    }

    #[test]
    fn test_diff_ignores_candidate_only_tokens() {
        let base = set("b", &[("--color-a", "#fff")]);
        let candidate = set("c", &[("--color-a", "#fff"), ("--color-b", "#000")]);

        let result = diff(&base, &candidate);
        assert_eq!(result.total_changed, 0);
        assert_eq!(result.unchanged.len(), 1);
    }

    #[test]
    fn test_diff_missing_in_candidate_counts_as_unchanged() {
        let base = set("b", &[("--color-a", "#fff"), ("--radius-1", "4px")]);
        let candidate = set("c", &[("--radius-1", "8px")]);

        let result = diff(&base, &candidate);
        assert_eq!(result.total_changed, 1);
        let radius = &result.by_category[&TokenCategory::Radius];
        assert_eq!(radius.changed.len(), 1);
        let color = &result.by_category[&TokenCategory::Color];
        assert_eq!(color.unchanged.len(), 1);
        assert!(color.changed.is_empty());
    }

    #[test]
    fn test_combine_picks_sources_per_category() {
        let base = set("base", &[("--color-a", "#fff"), ("--radius-1", "4px"), ("--gap", "2px")]);
        let dark = set("dark", &[("--color-a", "#000"), ("--radius-1", "0px")]);
        let round = set("round", &[("--radius-1", "12px")]);

        let mut sets = HashMap::new();
        sets.insert(dark.id.clone(), dark);
        sets.insert(round.id.clone(), round);

        let mut recipe = CombineRecipe::new();
        recipe.insert(TokenCategory::Color, "dark".into());
        recipe.insert(TokenCategory::Radius, "round".into());
        recipe.insert(TokenCategory::Spacing, "missing".into());

        let combined = combine(&recipe, &sets, &base);
        let values: Vec<_> = combined.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["#000", "12px", "2px"]);
        assert_eq!(combined.len(), base.tokens.len());
    }
}
