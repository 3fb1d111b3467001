use crate::color::{adjust_lightness, mix_hue, parse_color, to_color_string};
use crate::model::{Token, TokenCategory};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Current slider value per lever id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeverValues(HashMap<String, f64>);

impl LeverValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reset state for a lever list.
    pub fn defaults(levers: &[&LeverDef]) -> Self {
        Self(
            levers
                .iter()
                .map(|l| (l.id.to_string(), l.default_value))
                .collect(),
        )
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.0.get(id).copied()
    }

    pub fn set(&mut self, id: impl Into<String>, value: f64) {
        self.0.insert(id.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// A single adjustable transformation over a token list.
///
/// Every lever is the identity at its `default_value`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverDef {
    pub id: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default_value: f64,
    #[serde(skip)]
    pub apply: fn(&[Token], f64) -> Vec<Token>,
}

impl LeverDef {
    pub fn is_default(&self, value: f64) -> bool {
        value == self.default_value
    }
}

impl PartialEq for LeverDef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

static BACKGROUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)canvas|bg|background|surface|inset|overlay").expect("valid background regex")
});

static FOREGROUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)fg|foreground|text|on-emphasis").expect("valid foreground regex")
});

static PIXEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)px").expect("valid pixel regex"));

fn is_background_token(name: &str) -> bool {
    BACKGROUND_RE.is_match(name)
}

fn is_foreground_token(name: &str) -> bool {
    FOREGROUND_RE.is_match(name)
}

/// Rewrite color tokens through `f`; tokens that are not colors, or whose
/// value does not parse, pass through untouched.
fn map_colors<F>(tokens: &[Token], f: F) -> Vec<Token>
where
    F: Fn(&Token, crate::color::Hsl) -> Option<crate::color::Hsl>,
{
    tokens
        .iter()
        .map(|t| {
            if t.category != TokenCategory::Color {
                return t.clone();
            }
            match parse_color(&t.value).and_then(|hsl| f(t, hsl)) {
                Some(adjusted) => t.with_value(to_color_string(adjusted)),
                None => t.clone(),
            }
        })
        .collect()
}

/// Scale every `<n>px` literal in the values of `category` tokens.
fn scale_pixels(tokens: &[Token], category: TokenCategory, percent: f64) -> Vec<Token> {
    let factor = percent / 100.0;
    tokens
        .iter()
        .map(|t| {
            if t.category != category {
                return t.clone();
            }
            let scaled = PIXEL_RE.replace_all(&t.value, |caps: &Captures| {
                let n: f64 = caps[1].parse().unwrap_or(0.0);
                format!("{}px", (n * factor).round() as i64)
            });
            t.with_value(scaled)
        })
        .collect()
}

fn apply_contrast(tokens: &[Token], value: f64) -> Vec<Token> {
    if value == 0.0 {
        return tokens.to_vec();
    }
    map_colors(tokens, |t, hsl| {
        if is_background_token(&t.name) {
            let dir = if hsl.l > 50.0 { 1.0 } else { -1.0 };
            Some(adjust_lightness(hsl, dir * value * 0.3))
        } else if is_foreground_token(&t.name) {
            let dir = if hsl.l > 50.0 { -1.0 } else { 1.0 };
            Some(adjust_lightness(hsl, dir * value * 0.3))
        } else {
            None
        }
    })
}

fn apply_darkness(tokens: &[Token], value: f64) -> Vec<Token> {
    if value == 0.0 {
        return tokens.to_vec();
    }
    map_colors(tokens, |t, hsl| {
        is_background_token(&t.name).then(|| adjust_lightness(hsl, -value * 0.5))
    })
}

fn apply_color_tint(tokens: &[Token], value: f64) -> Vec<Token> {
    if value == 0.0 {
        return tokens.to_vec();
    }
    map_colors(tokens, |_, hsl| Some(mix_hue(hsl, value, 0.3)))
}

fn apply_depth(tokens: &[Token], value: f64) -> Vec<Token> {
    if value == 100.0 {
        return tokens.to_vec();
    }
    scale_pixels(tokens, TokenCategory::Shadow, value)
}

fn apply_roundness(tokens: &[Token], value: f64) -> Vec<Token> {
    if value == 100.0 {
        return tokens.to_vec();
    }
    scale_pixels(tokens, TokenCategory::Radius, value)
}

/// Push backgrounds and foregrounds apart (positive) or together (negative).
pub static CONTRAST: LeverDef = LeverDef {
    id: "contrast",
    label: "Contrast",
    min: -50.0,
    max: 50.0,
    step: 1.0,
    default_value: 0.0,
    apply: apply_contrast,
};

/// Shift background lightness; positive darkens.
pub static DARKNESS: LeverDef = LeverDef {
    id: "darkness",
    label: "Darkness",
    min: -50.0,
    max: 50.0,
    step: 1.0,
    default_value: 0.0,
    apply: apply_darkness,
};

/// Blend every color toward a hue angle.
pub static COLOR_TINT: LeverDef = LeverDef {
    id: "colorTint",
    label: "Color Tint",
    min: 0.0,
    max: 360.0,
    step: 5.0,
    default_value: 0.0,
    apply: apply_color_tint,
};

/// Scale shadow offsets and blur, in percent.
pub static DEPTH: LeverDef = LeverDef {
    id: "depth",
    label: "Depth",
    min: 0.0,
    max: 200.0,
    step: 5.0,
    default_value: 100.0,
    apply: apply_depth,
};

/// Scale corner radii, in percent.
pub static ROUNDNESS: LeverDef = LeverDef {
    id: "roundness",
    label: "Roundness",
    min: 0.0,
    max: 200.0,
    step: 5.0,
    default_value: 100.0,
    apply: apply_roundness,
};

pub static ALL_LEVERS: [&LeverDef; 5] = [&CONTRAST, &DARKNESS, &COLOR_TINT, &DEPTH, &ROUNDNESS];

pub fn lever_by_id(id: &str) -> Option<&'static LeverDef> {
    ALL_LEVERS.iter().copied().find(|l| l.id == id)
}

static DARK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dark|night|dim").expect("valid dark regex"));
static HUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"tint|color|blue|warm|cool|hue").expect("valid hue regex")
});
static DEPTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"depth|shadow|skeuomorphic|3d|elevat").expect("valid depth regex")
});

/// Pick the levers worth showing for a variation, from the prompt that
/// produced it. Contrast and Roundness lead; Depth is always present.
pub fn infer_levers(prompt: &str) -> Vec<&'static LeverDef> {
    let lower = prompt.to_lowercase();
    let mut levers: Vec<&'static LeverDef> = vec![&CONTRAST, &ROUNDNESS];

    if DARK_RE.is_match(&lower) {
        levers.push(&DARKNESS);
        levers.push(&COLOR_TINT);
    }
    if HUE_RE.is_match(&lower) && !levers.contains(&&COLOR_TINT) {
        levers.push(&COLOR_TINT);
    }
    if DEPTH_RE.is_match(&lower) {
        levers.push(&DEPTH);
    }
    if !levers.contains(&&DEPTH) {
        levers.push(&DEPTH);
    }

    levers
}

/// Fold `levers` over `tokens` in list order. Levers whose value is missing
/// or equal to their default are skipped.
///
/// Always pass the pristine (pre-lever) tokens: levers are not meant to be
/// stacked onto their own output.
pub fn apply_levers(tokens: &[Token], levers: &[&LeverDef], values: &LeverValues) -> Vec<Token> {
    let mut result = tokens.to_vec();
    for lever in levers {
        let value = values.get(lever.id).unwrap_or(lever.default_value);
        if !lever.is_default(value) {
            result = (lever.apply)(&result, value);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::parse_color;

    fn palette() -> Vec<Token> {
        vec![
            Token::new("--color-canvas-default", "#ffffff"),
            Token::new("--color-canvas-inset", "#f6f8fa"),
            Token::new("--color-fg-default", "#1f2328"),
            Token::new("--color-accent-emphasis", "#0969da"),
            Token::new("--color-neutral-muted", "rgba(175, 184, 193, 0.2)"),
            Token::new("--color-gradient", "linear-gradient(#fff, #000)"),
            Token::new("--radius-2", "12px"),
            Token::new("--shadow-md", "0 3px 6px rgba(140, 149, 159, 0.15)"),
            Token::new("--space-2", "8px"),
        ]
    }

    fn value_of<'a>(tokens: &'a [Token], name: &str) -> &'a str {
        &tokens.iter().find(|t| t.name == name).unwrap().value
    }

    #[test]
    fn test_every_lever_is_identity_at_default() {
        let tokens = palette();
        for lever in ALL_LEVERS {
            let mut values = LeverValues::new();
            values.set(lever.id, lever.default_value);
            assert_eq!(apply_levers(&tokens, &[lever], &values), tokens, "{}", lever.id);
            assert_eq!((lever.apply)(&tokens, lever.default_value), tokens, "{}", lever.id);
        }
    }

    #[test]
    fn test_roundness_scaling() {
        let tokens = vec![Token::new("--radius-2", "12px")];
        assert_eq!(apply_roundness(&tokens, 50.0)[0].value, "6px");
        assert_eq!(apply_roundness(&tokens, 200.0)[0].value, "24px");
        assert_eq!(apply_roundness(&tokens, 0.0)[0].value, "0px");
    }

    #[test]
    fn test_depth_scales_only_shadows() {
        let scaled = apply_depth(&palette(), 200.0);
        assert_eq!(value_of(&scaled, "--shadow-md"), "0 6px 12px rgba(140, 149, 159, 0.15)");
        assert_eq!(value_of(&scaled, "--radius-2"), "12px");
        assert_eq!(value_of(&scaled, "--space-2"), "8px");
    }

    #[test]
    fn test_pixel_scaling_rounds() {
        let tokens = vec![Token::new("--radius-1", "3px 4.5px")];
        assert_eq!(apply_roundness(&tokens, 50.0)[0].value, "2px 2px");
    }

    #[test]
    fn test_darkness_darkens_backgrounds_only() {
        let out = apply_darkness(&palette(), 20.0);
        let canvas = parse_color(value_of(&out, "--color-canvas-default")).unwrap();
        assert!((canvas.l - 90.0).abs() < 0.5);
        assert_eq!(value_of(&out, "--color-fg-default"), "#1f2328");
        assert_eq!(value_of(&out, "--color-accent-emphasis"), "#0969da");
    }

    #[test]
    fn test_contrast_moves_by_lightness_side() {
        let original_fg = parse_color("#1f2328").unwrap().l;

        let out = apply_contrast(&palette(), 20.0);
        let canvas = parse_color(value_of(&out, "--color-canvas-default")).unwrap();
        let inset = parse_color(value_of(&out, "--color-canvas-inset")).unwrap();
        let fg = parse_color(value_of(&out, "--color-fg-default")).unwrap();
        // light backgrounds go lighter, dark foregrounds move by +value*0.3
        assert_eq!(canvas.l, 100.0);
        assert_eq!(inset.l, 100.0);
        assert!((fg.l - (original_fg + 6.0)).abs() < 0.5);

        let out = apply_contrast(&palette(), -20.0);
        let canvas = parse_color(value_of(&out, "--color-canvas-default")).unwrap();
        assert!((canvas.l - 94.0).abs() < 0.5);

        // neither background nor foreground
        assert_eq!(value_of(&out, "--color-accent-emphasis"), "#0969da");
    }

    #[test]
    fn test_levers_leave_unparseable_colors_alone() {
        let out = apply_color_tint(&palette(), 200.0);
        assert_eq!(value_of(&out, "--color-gradient"), "linear-gradient(#fff, #000)");
        // translucent colors stay translucent
        assert!(value_of(&out, "--color-neutral-muted").starts_with("rgba("));
    }

    #[test]
    fn test_color_tint_skips_grays() {
        let tokens = vec![Token::new("--color-canvas-default", "#ffffff")];
        assert_eq!(apply_color_tint(&tokens, 200.0), tokens);
    }

    #[test]
    fn test_infer_levers_minimal_prompt() {
        let ids: Vec<_> = infer_levers("more playful").iter().map(|l| l.id).collect();
        assert_eq!(ids, ["contrast", "roundness", "depth"]);
    }

    #[test]
    fn test_infer_levers_dark_prompt() {
        let ids: Vec<_> = infer_levers("Dark mode with deep shadows")
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, ["contrast", "roundness", "darkness", "colorTint", "depth"]);
    }

    #[test]
    fn test_infer_levers_hue_prompt_adds_tint_once() {
        let ids: Vec<_> = infer_levers("warm colors").iter().map(|l| l.id).collect();
        assert_eq!(ids, ["contrast", "roundness", "colorTint", "depth"]);

        let ids: Vec<_> = infer_levers("dim and warm").iter().map(|l| l.id).collect();
        assert_eq!(ids, ["contrast", "roundness", "darkness", "colorTint", "depth"]);
    }

    #[test]
    fn test_apply_levers_folds_in_order_and_resets() {
        let tokens = palette();
        let levers = [&ROUNDNESS, &DEPTH];
        let mut values = LeverValues::defaults(&levers);
        values.set("roundness", 50.0);

        let out = apply_levers(&tokens, &levers, &values);
        assert_eq!(value_of(&out, "--radius-2"), "6px");
        assert_eq!(value_of(&out, "--shadow-md"), value_of(&tokens, "--shadow-md"));

        // resetting one lever and re-applying from the pristine tokens
        values.set("roundness", 100.0);
        assert_eq!(apply_levers(&tokens, &levers, &values), tokens);
    }

    #[test]
    fn test_lever_by_id() {
        assert_eq!(lever_by_id("colorTint").unwrap().label, "Color Tint");
        assert!(lever_by_id("saturation").is_none());
    }
}
