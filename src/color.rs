//! Colour model for palette entries.
//!
//! Entries store their colour as a `#rrggbb` hex code. The `rgb(r, g, b)`
//! representation is always derived from the hex code and is only written out
//! so that JSON documents stay readable by other consumers of the palette.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Six hex digits with an optional leading `#`. Shorthand (`#fff`) is rejected.
const HEX_COLOR_REGEX: &str = r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$";

/// Id prefix shared by the compiled-in default entries.
pub const DEFAULT_ID_PREFIX: &str = "default-";

fn hex_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HEX_COLOR_REGEX).expect("valid regex"))
}

/// A decoded 8-bit-per-channel colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Decode a strict six-digit hex colour. Returns `None` on any mismatch.
pub fn parse_hex(input: &str) -> Option<Rgb> {
    let caps = hex_regex().captures(input)?;
    let channel = |i: usize| u8::from_str_radix(&caps[i], 16).ok();
    Some(Rgb::new(channel(1)?, channel(2)?, channel(3)?))
}

/// Grouping tag for an entry.
///
/// Unknown tags are preserved verbatim in [`Category::Other`] so they survive
/// a load/save cycle; they only collapse into a shared bucket for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Primary,
    Semantic,
    Neutral,
    Other(String),
}

impl Category {
    /// Categories offered when creating or editing an entry.
    pub const SELECTABLE: [Category; 3] =
        [Category::Primary, Category::Semantic, Category::Neutral];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Primary => "primary",
            Category::Semantic => "semantic",
            Category::Neutral => "neutral",
            Category::Other(raw) => raw,
        }
    }

    /// Section heading used when listing the palette.
    pub fn heading(&self) -> &'static str {
        match self {
            Category::Primary => "Primary Colors",
            Category::Semantic => "Semantic Colors",
            Category::Neutral => "Neutral Colors",
            Category::Other(_) => "Other Colors",
        }
    }

    /// Display order of the four buckets.
    pub fn rank(&self) -> u8 {
        match self {
            Category::Primary => 0,
            Category::Semantic => 1,
            Category::Neutral => 2,
            Category::Other(_) => 3,
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        match value {
            "primary" => Category::Primary,
            "semantic" => Category::Semantic,
            "neutral" => Category::Neutral,
            other => Category::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::from(raw.as_str()))
    }
}

/// One palette record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireEntry", into = "WireEntry")]
pub struct ColorEntry {
    pub id: String,
    pub name: String,
    pub hex: String,
    pub usage: String,
    pub category: Category,
}

impl ColorEntry {
    /// Decoded colour, or `None` when the stored hex is malformed.
    pub fn rgb(&self) -> Option<Rgb> {
        parse_hex(&self.hex)
    }

    /// `rgb(r, g, b)` string, empty when the hex cannot be decoded.
    pub fn rgb_string(&self) -> String {
        self.rgb().map(|rgb| rgb.to_string()).unwrap_or_default()
    }

    pub fn is_default(&self) -> bool {
        self.id.starts_with(DEFAULT_ID_PREFIX)
    }
}

/// Serialized shape shared by every storage backend and export files.
#[derive(Debug, Serialize, Deserialize)]
struct WireEntry {
    id: String,
    name: String,
    hex: String,
    #[serde(default)]
    rgb: String,
    #[serde(default)]
    usage: String,
    #[serde(default)]
    category: Category,
}

impl From<WireEntry> for ColorEntry {
    // The stored `rgb` is discarded; it is recomputed from `hex` on demand.
    fn from(wire: WireEntry) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            hex: wire.hex,
            usage: wire.usage,
            category: wire.category,
        }
    }
}

impl From<ColorEntry> for WireEntry {
    fn from(entry: ColorEntry) -> Self {
        let rgb = entry.rgb_string();
        Self {
            id: entry.id,
            name: entry.name,
            hex: entry.hex,
            rgb,
            usage: entry.usage,
            category: entry.category,
        }
    }
}

fn default_entry(n: u8, name: &str, hex: &str, usage: &str, category: Category) -> ColorEntry {
    ColorEntry {
        id: format!("{DEFAULT_ID_PREFIX}{n}"),
        name: name.to_string(),
        hex: hex.to_string(),
        usage: usage.to_string(),
        category,
    }
}

/// The compiled-in palette used until storage provides one.
pub fn default_palette() -> Vec<ColorEntry> {
    use Category::{Neutral, Primary, Semantic};
    vec![
        default_entry(
            1,
            "Primary Dark Cyan",
            "#005a5e",
            "Main brand color, buttons, links",
            Primary,
        ),
        default_entry(2, "Secondary Purple", "#7c3aed", "Accent color, highlights, CTAs", Primary),
        default_entry(3, "Tertiary Teal", "#0d9488", "Supporting elements, icons", Primary),
        default_entry(4, "Success Green", "#059669", "Success states, confirmations", Semantic),
        default_entry(5, "Warning Orange", "#d97706", "Warnings, alerts, notifications", Semantic),
        default_entry(6, "Error Red", "#dc2626", "Error states, destructive actions", Semantic),
        default_entry(7, "Neutral Dark", "#374151", "Primary text, headings", Neutral),
        default_entry(8, "Neutral Medium", "#6b7280", "Secondary text, descriptions", Neutral),
        default_entry(9, "Neutral Light", "#f3f4f6", "Backgrounds, subtle borders", Neutral),
        default_entry(10, "Pure White", "#ffffff", "Card backgrounds, main content areas", Neutral),
    ]
}

/// True when `colors` is still exactly the compiled-in bootstrap set.
pub fn is_bootstrap_default(colors: &[ColorEntry]) -> bool {
    colors.first().is_some_and(ColorEntry::is_default) && colors == default_palette().as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(parse_hex("#005a5e"), Some(Rgb::new(0, 90, 94)));
        assert_eq!(parse_hex("7C3AED"), Some(Rgb::new(124, 58, 237)));
    }

    #[test]
    fn rejects_non_six_digit_input() {
        for bad in [
            "red", "#fff", "#12345", "#1234567", "", "#", "#gg0000", " #112233", "##112233",
        ] {
            assert_eq!(parse_hex(bad), None, "accepted {bad:?}");
        }
    }

    #[test]
    fn channels_round_trip_through_hex() {
        let samples = [
            Rgb::new(0, 0, 0),
            Rgb::new(255, 255, 255),
            Rgb::new(17, 34, 51),
            Rgb::new(220, 38, 38),
        ];
        for rgb in samples {
            assert_eq!(parse_hex(&rgb.to_hex()), Some(rgb));
        }
    }

    #[test]
    fn hex_encoding_is_lowercase() {
        assert_eq!(parse_hex("#7C3AED").unwrap().to_hex(), "#7c3aed");
        assert_eq!(Rgb::new(0, 90, 94).to_hex(), "#005a5e");
    }

    #[test]
    fn rgb_display_matches_css_form() {
        assert_eq!(Rgb::new(17, 34, 51).to_string(), "rgb(17, 34, 51)");
    }

    #[test]
    fn defaults_have_consistent_rgb() {
        let defaults = default_palette();
        assert_eq!(defaults.len(), 10);
        assert_eq!(defaults[0].id, "default-1");
        assert_eq!(defaults[0].rgb_string(), "rgb(0, 90, 94)");
        assert_eq!(defaults[9].rgb_string(), "rgb(255, 255, 255)");
        assert!(defaults.iter().all(|c| c.rgb().is_some()));
    }

    #[test]
    fn unknown_category_survives_round_trip() {
        let json = r##"{"id":"x","name":"Foo","hex":"#112233","category":"brand"}"##;
        let entry: ColorEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.category, Category::Other("brand".into()));
        assert_eq!(entry.category.heading(), "Other Colors");
        assert_eq!(entry.usage, "");

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["category"], "brand");
    }

    #[test]
    fn stored_rgb_is_recomputed_from_hex() {
        let json = r##"{"id":"x","name":"Foo","hex":"#112233","rgb":"rgb(1, 1, 1)","usage":"","category":"primary","created_at":"2024-01-01T00:00:00Z"}"##;
        let entry: ColorEntry = serde_json::from_str(json).unwrap();
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["rgb"], "rgb(17, 34, 51)");
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn bootstrap_detection_requires_exact_defaults() {
        let mut colors = default_palette();
        assert!(is_bootstrap_default(&colors));

        colors.remove(3);
        assert!(!is_bootstrap_default(&colors));

        colors.remove(0);
        assert!(!is_bootstrap_default(&colors));
        assert!(!is_bootstrap_default(&[]));
    }
}
