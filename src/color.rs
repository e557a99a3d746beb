//! CSS color parsing and WCAG contrast math.
//!
//! Computed style values are normalized to the browser's serialization form
//! (`rgb(r, g, b)` / `rgba(r, g, b, a)`) so that downstream consumers see one
//! canonical spelling regardless of how the stylesheet was authored.

/// A resolved RGBA color. Alpha is kept as a float in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 1.0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 1.0 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0.0 };

    /// A color with zero alpha paints nothing.
    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }

    /// Serialize the way browsers serialize computed colors.
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            // Trim a trailing ".0" so 0.5 prints as "0.5" and 0 as "0"
            let mut a = format!("{}", self.a);
            if a.starts_with("0.") {
                a = a.trim_end_matches('0').trim_end_matches('.').to_string();
                if a == "0" || a.is_empty() {
                    a = "0".to_string();
                }
            }
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, a)
        }
    }
}

/// Parse a CSS color value. Returns `None` for anything unrecognized;
/// callers degrade rather than error (contrast falls back to 0).
pub fn parse(value: &str) -> Option<Color> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if let Some(hex) = v.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = v.to_ascii_lowercase();
    if lower.starts_with("rgb(") || lower.starts_with("rgba(") {
        return parse_rgb_function(&lower);
    }
    named(&lower)
}

/// Re-serialize a color value in canonical form, leaving unparseable
/// values untouched.
pub fn normalize(value: &str) -> String {
    match parse(value) {
        Some(c) => c.to_css(),
        None => value.trim().to_string(),
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let hex = hex.trim();
    let digit = |c: u8| (c as char).to_digit(16).map(|d| d as u8);
    match hex.len() {
        3 | 4 => {
            let b = hex.as_bytes();
            let r = digit(b[0])?;
            let g = digit(b[1])?;
            let bl = digit(b[2])?;
            let a = if hex.len() == 4 { digit(b[3])? as f64 * 17.0 / 255.0 } else { 1.0 };
            Some(Color { r: r * 17, g: g * 17, b: bl * 17, a })
        }
        6 | 8 => {
            let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            let r = pair(0)?;
            let g = pair(2)?;
            let b = pair(4)?;
            let a = if hex.len() == 8 { pair(6)? as f64 / 255.0 } else { 1.0 };
            Some(Color { r, g, b, a })
        }
        _ => None,
    }
}

fn parse_rgb_function(lower: &str) -> Option<Color> {
    let open = lower.find('(')?;
    let close = lower.rfind(')')?;
    if close <= open {
        return None;
    }
    let inner = &lower[open + 1..close];
    // Accept both the legacy comma syntax and the modern
    // space-separated syntax with an optional "/ alpha".
    let mut parts: Vec<&str> = if inner.contains(',') {
        inner.split(',').map(str::trim).collect()
    } else {
        inner
            .split(|c: char| c.is_whitespace() || c == '/')
            .filter(|s| !s.is_empty())
            .collect()
    };
    if parts.len() < 3 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let s = s.trim();
        if let Some(p) = s.strip_suffix('%') {
            let f: f64 = p.trim().parse().ok()?;
            Some((f / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8)
        } else {
            let f: f64 = s.parse().ok()?;
            Some(f.round().clamp(0.0, 255.0) as u8)
        }
    };
    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = if parts.len() > 3 {
        let s = parts.remove(3);
        if let Some(p) = s.strip_suffix('%') {
            p.trim().parse::<f64>().ok()? / 100.0
        } else {
            s.trim().parse::<f64>().ok()?
        }
    } else {
        1.0
    };
    Some(Color { r, g, b, a: a.clamp(0.0, 1.0) })
}

fn named(name: &str) -> Option<Color> {
    let rgb = |r, g, b| Some(Color { r, g, b, a: 1.0 });
    match name {
        "transparent" => Some(Color::TRANSPARENT),
        "black" => rgb(0, 0, 0),
        "white" => rgb(255, 255, 255),
        "red" => rgb(255, 0, 0),
        "green" => rgb(0, 128, 0),
        "blue" => rgb(0, 0, 255),
        "yellow" => rgb(255, 255, 0),
        "orange" => rgb(255, 165, 0),
        "purple" => rgb(128, 0, 128),
        "pink" => rgb(255, 192, 203),
        "gray" | "grey" => rgb(128, 128, 128),
        "silver" => rgb(192, 192, 192),
        "maroon" => rgb(128, 0, 0),
        "olive" => rgb(128, 128, 0),
        "lime" => rgb(0, 255, 0),
        "navy" => rgb(0, 0, 128),
        "teal" => rgb(0, 128, 128),
        "aqua" | "cyan" => rgb(0, 255, 255),
        "fuchsia" | "magenta" => rgb(255, 0, 255),
        "brown" => rgb(165, 42, 42),
        _ => None,
    }
}

/// WCAG relative luminance of a color, ignoring alpha.
pub fn relative_luminance(c: Color) -> f64 {
    fn linearize(channel: u8) -> f64 {
        let c = channel as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * linearize(c.r) + 0.7152 * linearize(c.g) + 0.0722 * linearize(c.b)
}

/// WCAG contrast ratio between two colors, in `[1, 21]`.
pub fn contrast_ratio(a: Color, b: Color) -> f64 {
    let l1 = relative_luminance(a);
    let l2 = relative_luminance(b);
    (l1.max(l2) + 0.05) / (l1.min(l2) + 0.05)
}
