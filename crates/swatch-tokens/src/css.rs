//! Custom-property codec.
//!
//! This is a narrow pattern matcher for `--name: value;` declarations, not a
//! CSS parser. Anything that does not look like a custom-property declaration
//! is skipped.

use crate::model::{categorize, sort_tokens, Token, TokenCategory, TokenSet};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static DECLARATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(--[\w-]+)\s*:\s*([^;]+);").expect("valid declaration regex"));

static SCOPED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(:root|html|\[data-theme[^\]]*\])\s*\{([^}]+)\}").expect("valid block regex")
});

/// Render a token set as a single `:root` block, one declaration per line.
pub fn serialize(token_set: &TokenSet) -> String {
    let lines: Vec<String> = token_set
        .tokens
        .iter()
        .map(|t| format!("  {}: {};", t.name, t.value))
        .collect();
    format!(":root {{\n{}\n}}", lines.join("\n"))
}

/// Scan CSS text for custom-property declarations.
///
/// Every token comes back as [`TokenCategory::Color`]; run the result through
/// [`recategorize`] (or use [`parse_categorized`]) before trusting categories.
pub fn parse(css: &str) -> Vec<Token> {
    DECLARATION_RE
        .captures_iter(css)
        .map(|caps| Token {
            name: caps[1].to_string(),
            value: caps[2].trim().to_string(),
            category: TokenCategory::Color,
            computed: None,
        })
        .collect()
}

pub fn recategorize(tokens: &mut [Token]) {
    for token in tokens.iter_mut() {
        token.category = categorize(&token.name);
    }
}

pub fn parse_categorized(css: &str) -> Vec<Token> {
    let mut tokens = parse(css);
    recategorize(&mut tokens);
    tokens
}

/// Flat `name -> value` map for inline style overrides when re-rendering
/// components against a set.
pub fn style_overrides(token_set: &TokenSet) -> IndexMap<String, String> {
    token_set
        .tokens
        .iter()
        .map(|t| (t.name.clone(), t.value.clone()))
        .collect()
}

struct Candidate {
    value: String,
    is_root: bool,
}

/// Build an extracted token set straight from stylesheet text.
///
/// Declarations inside `:root` win over `html` / `[data-theme]` blocks, which
/// win over loose declarations anywhere else. Non-empty `computed` values
/// override all of them.
pub fn extract_tokens(
    id: impl Into<String>,
    label: impl Into<String>,
    css_texts: &[String],
    computed: Option<&HashMap<String, String>>,
) -> TokenSet {
    let mut found: IndexMap<String, Candidate> = IndexMap::new();

    for css in css_texts {
        for block in SCOPED_BLOCK_RE.captures_iter(css) {
            let is_root = &block[1] == ":root";
            for decl in DECLARATION_RE.captures_iter(&block[2]) {
                let name = decl[1].to_string();
                let value = decl[2].trim().to_string();
                let replace = match found.get(&name) {
                    None => true,
                    Some(existing) => is_root && !existing.is_root,
                };
                if replace {
                    found.insert(name, Candidate { value, is_root });
                }
            }
        }

        for decl in DECLARATION_RE.captures_iter(css) {
            found.entry(decl[1].to_string()).or_insert_with(|| Candidate {
                value: decl[2].trim().to_string(),
                is_root: false,
            });
        }
    }

    if let Some(computed) = computed {
        for (name, value) in computed {
            if !value.is_empty() {
                found.insert(
                    name.clone(),
                    Candidate {
                        value: value.clone(),
                        is_root: true,
                    },
                );
            }
        }
    }

    let mut tokens: Vec<Token> = found
        .into_iter()
        .map(|(name, candidate)| Token::new(name, candidate.value))
        .collect();
    sort_tokens(&mut tokens);
    debug!("Extracted {} tokens from {} stylesheets", tokens.len(), css_texts.len());

    TokenSet::extracted(id, label, tokens)
}
