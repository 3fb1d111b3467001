use serde::{Deserialize, Serialize};
use swatch_common::Result;
use std::fmt;
use std::str::FromStr;

/// The eight semantic buckets every token is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
    Color,
    Spacing,
    Radius,
    Shadow,
    Typography,
    Border,
    Opacity,
    Transition,
}

impl TokenCategory {
    /// Canonical presentation order, also used for sorting extracted sets
    /// and for iterating combine recipes.
    pub const ALL: [TokenCategory; 8] = [
        TokenCategory::Color,
        TokenCategory::Typography,
        TokenCategory::Spacing,
        TokenCategory::Radius,
        TokenCategory::Shadow,
        TokenCategory::Border,
        TokenCategory::Opacity,
        TokenCategory::Transition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCategory::Color => "color",
            TokenCategory::Spacing => "spacing",
            TokenCategory::Radius => "radius",
            TokenCategory::Shadow => "shadow",
            TokenCategory::Typography => "typography",
            TokenCategory::Border => "border",
            TokenCategory::Opacity => "opacity",
            TokenCategory::Transition => "transition",
        }
    }

    /// Position in [`TokenCategory::ALL`].
    pub fn rank(&self) -> usize {
        Self::ALL
            .iter()
            .position(|c| c == self)
            .unwrap_or(Self::ALL.len())
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TokenCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown token category: {}", s))
    }
}

/// A single design token (one CSS custom property).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub name: String,
    pub value: String,
    pub category: TokenCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<String>,
}

impl Token {
    /// Build a token whose category is derived from its name.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let category = categorize(&name);
        Self {
            name,
            value: value.into(),
            category,
            computed: None,
        }
    }

    pub fn with_category(mut self, category: TokenCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSource {
    Extracted,
    Generated,
}

/// An ordered, uniquely named collection of tokens: one visual variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSet {
    pub id: String,
    pub label: String,
    pub tokens: Vec<Token>,
    pub source: TokenSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl TokenSet {
    pub fn extracted(id: impl Into<String>, label: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tokens,
            source: TokenSource::Extracted,
            direction: None,
            parent_id: None,
        }
    }

    /// A generated set derived from `parent`.
    pub fn derived(
        parent: &TokenSet,
        id: impl Into<String>,
        label: impl Into<String>,
        direction: impl Into<String>,
        tokens: Vec<Token>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tokens,
            source: TokenSource::Generated,
            direction: Some(direction.into()),
            parent_id: Some(parent.id.clone()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Sort tokens by category order, then by name.
pub fn sort_tokens(tokens: &mut [Token]) {
    tokens.sort_by(|a, b| {
        a.category
            .rank()
            .cmp(&b.category.rank())
            .then_with(|| a.name.cmp(&b.name))
    });
}

const COLOR_KEYWORDS: &[&str] = &["color", "-bg", "-fg", "background", "fill", "stroke"];
const SPACING_KEYWORDS: &[&str] = &["spacing", "space", "gap", "margin", "padding"];
const RADIUS_KEYWORDS: &[&str] = &["radius", "rounded"];
const SHADOW_KEYWORDS: &[&str] = &["shadow", "elevation"];
const TYPOGRAPHY_KEYWORDS: &[&str] = &["font", "text-size", "line-height", "letter-spacing", "weight"];
const BORDER_KEYWORDS: &[&str] = &["border"];
const OPACITY_KEYWORDS: &[&str] = &["opacity", "alpha"];
const TRANSITION_KEYWORDS: &[&str] = &["transition", "duration", "easing", "animation"];

/// Classify a CSS custom property name. First matching bucket wins; names
/// matching nothing fall back to [`TokenCategory::Color`].
pub fn categorize(name: &str) -> TokenCategory {
    let n = name.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| n.contains(k));

    if has_any(COLOR_KEYWORDS) {
        TokenCategory::Color
    } else if has_any(SPACING_KEYWORDS) {
        TokenCategory::Spacing
    } else if has_any(RADIUS_KEYWORDS) {
        TokenCategory::Radius
    } else if has_any(SHADOW_KEYWORDS) {
        TokenCategory::Shadow
    } else if has_any(TYPOGRAPHY_KEYWORDS) {
        TokenCategory::Typography
    } else if has_any(BORDER_KEYWORDS) {
        TokenCategory::Border
    } else if has_any(OPACITY_KEYWORDS) {
        TokenCategory::Opacity
    } else if has_any(TRANSITION_KEYWORDS) {
        TokenCategory::Transition
    } else {
        TokenCategory::Color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_keywords() {
        assert_eq!(categorize("--color-canvas-default"), TokenCategory::Color);
        assert_eq!(categorize("--btn-bg"), TokenCategory::Color);
        assert_eq!(categorize("--stack-gap-normal"), TokenCategory::Spacing);
        assert_eq!(categorize("--base-size-padding"), TokenCategory::Spacing);
        assert_eq!(categorize("--borderRadius-medium"), TokenCategory::Radius);
        assert_eq!(categorize("--shadow-resting-small"), TokenCategory::Shadow);
        assert_eq!(categorize("--fontStack-sansSerif"), TokenCategory::Typography);
        assert_eq!(categorize("--text-body-line-height"), TokenCategory::Typography);
        assert_eq!(categorize("--borderWidth-thin"), TokenCategory::Border);
        assert_eq!(categorize("--overlay-backdrop-opacity"), TokenCategory::Opacity);
        assert_eq!(categorize("--duration-fast"), TokenCategory::Transition);
    }

    #[test]
    fn test_categorize_precedence() {
        // color keywords are checked before border
        assert_eq!(categorize("--border-color-default"), TokenCategory::Color);
        // "letter-spacing" hits the spacing bucket first
        assert_eq!(categorize("--letter-spacing-wide"), TokenCategory::Spacing);
    }

    #[test]
    fn test_categorize_is_total() {
        for name in ["", "--", "--zzz", "not-a-token", "--Ünïcødé", "--z-index-modal"] {
            assert!(TokenCategory::ALL.contains(&categorize(name)));
        }
        assert_eq!(categorize("--z-index-modal"), TokenCategory::Color);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("radius".parse::<TokenCategory>(), Ok(TokenCategory::Radius));
        assert_eq!(" Color ".parse::<TokenCategory>(), Ok(TokenCategory::Color));
        assert_eq!(
            "corners".parse::<TokenCategory>(),
            Err("unknown token category: corners".to_string())
        );
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let token = Token::new("--radius-2", "6px");
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["category"], "radius");
        assert!(json.get("computed").is_none());
    }

    #[test]
    fn test_token_set_uses_camel_case() {
        let base = TokenSet::extracted("base", "Base", vec![]);
        let derived = TokenSet::derived(&base, "v1", "Dark", "Dark mode", vec![]);
        let json = serde_json::to_value(&derived).unwrap();
        assert_eq!(json["parentId"], "base");
        assert_eq!(json["source"], "generated");
    }

    #[test]
    fn test_token_set_json_round_trip() {
        let set = TokenSet::extracted("base", "Base", vec![Token::new("--radius-2", "6px")]);
        let parsed = TokenSet::from_json(&set.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, set);
        assert!(TokenSet::from_json("{").is_err());
    }

    #[test]
    fn test_sort_tokens_orders_by_category_then_name() {
        let mut tokens = vec![
            Token::new("--shadow-md", "0 1px 2px #000"),
            Token::new("--font-size", "14px"),
            Token::new("--color-b", "#000"),
            Token::new("--color-a", "#fff"),
        ];
        sort_tokens(&mut tokens);
        let names: Vec<_> = tokens.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["--color-a", "--color-b", "--font-size", "--shadow-md"]);
    }
}
