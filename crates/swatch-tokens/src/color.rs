//! HSL color math for token values.
//!
//! Only the syntaxes design systems actually ship are recognized: hex,
//! `rgb()`/`rgba()` and `hsl()`/`hsla()`. Everything else (named colors,
//! `oklch()`, gradients, `var()` references) parses to `None`, which callers
//! treat as "leave this value alone".

use regex::Regex;
use std::sync::LazyLock;

static RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)(?:\s*,\s*([\d.]+))?\s*\)$")
        .expect("valid rgb regex")
});

static HSL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^hsla?\(\s*([\d.]+)\s*,\s*([\d.]+)%\s*,\s*([\d.]+)%(?:\s*,\s*([\d.]+))?\s*\)$")
        .expect("valid hsl regex")
});

/// A color in HSL space with alpha.
///
/// `h` is in degrees `[0, 360)`, `s` and `l` are percentages `[0, 100]`,
/// `a` is `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
    pub a: f64,
}

impl Hsl {
    pub fn is_opaque(&self) -> bool {
        self.a >= 1.0
    }
}

/// Parse a CSS color string into HSL. Returns `None` for anything that is not
/// hex, rgb(a) or hsl(a).
pub fn parse_color(value: &str) -> Option<Hsl> {
    let trimmed = value.trim();

    if let Some(hex) = trimmed.strip_prefix('#') {
        return hex_to_hsl(hex);
    }

    if let Some(caps) = RGB_RE.captures(trimmed) {
        let channel = |i: usize| -> Option<f64> {
            caps.get(i)?.as_str().parse::<f64>().ok().map(|v| v / 255.0)
        };
        let a = match caps.get(4) {
            Some(m) => m.as_str().parse::<f64>().ok()?,
            None => 1.0,
        };
        return Some(rgb_to_hsl(channel(1)?, channel(2)?, channel(3)?, a));
    }

    if let Some(caps) = HSL_RE.captures(trimmed) {
        let num = |i: usize| -> Option<f64> { caps.get(i)?.as_str().parse::<f64>().ok() };
        let a = match caps.get(4) {
            Some(m) => m.as_str().parse::<f64>().ok()?,
            None => 1.0,
        };
        return Some(Hsl {
            h: num(1)?.rem_euclid(360.0),
            s: num(2)?.min(100.0),
            l: num(3)?.min(100.0),
            a: a.clamp(0.0, 1.0),
        });
    }

    None
}

fn hex_to_hsl(hex: &str) -> Option<Hsl> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };

    let byte = |i: usize| -> Option<f64> {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .ok()
            .map(|v| v as f64 / 255.0)
    };

    let a = if expanded.len() == 8 { byte(6)? } else { 1.0 };
    Some(rgb_to_hsl(byte(0)?, byte(2)?, byte(4)?, a))
}

fn rgb_to_hsl(r: f64, g: f64, b: f64, a: f64) -> Hsl {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsl { h: 0.0, s: 0.0, l: l * 100.0, a };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let hue = if max == r {
        ((g - b) / d + if g < b { 6.0 } else { 0.0 }) / 6.0
    } else if max == g {
        ((b - r) / d + 2.0) / 6.0
    } else {
        ((r - g) / d + 4.0) / 6.0
    };

    Hsl {
        h: hue * 360.0,
        s: s * 100.0,
        l: l * 100.0,
        a,
    }
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    let sn = s / 100.0;
    let ln = l / 100.0;
    let c = (1.0 - (2.0 * ln - 1.0).abs()) * sn;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = ln - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_byte(r), to_byte(g), to_byte(b)]
}

/// Render as `#rrggbb` when opaque, `rgba(r, g, b, a)` otherwise.
pub fn to_color_string(hsl: Hsl) -> String {
    let [r, g, b] = hsl_to_rgb(hsl.h, hsl.s, hsl.l);
    if !hsl.is_opaque() {
        let alpha = (hsl.a * 100.0).round() / 100.0;
        return format!("rgba({}, {}, {}, {})", r, g, b, alpha);
    }
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Shift lightness by `amount` percentage points, clamped to `[0, 100]`.
pub fn adjust_lightness(hsl: Hsl, amount: f64) -> Hsl {
    Hsl {
        l: (hsl.l + amount).clamp(0.0, 100.0),
        ..hsl
    }
}

/// Blend the hue toward `target_hue` by `ratio` (0 = unchanged, 1 = fully
/// tinted). Near-grayscale colors (saturation below 3) are returned as-is.
pub fn mix_hue(hsl: Hsl, target_hue: f64, ratio: f64) -> Hsl {
    if hsl.s < 3.0 {
        return hsl;
    }
    let diff = target_hue - hsl.h;
    Hsl {
        h: (hsl.h + diff * ratio + 360.0).rem_euclid(360.0),
        s: (hsl.s + ratio * 10.0).min(100.0),
        ..hsl
    }
}
