//! Plain-text rendering of the palette and storage reports.

use crossterm::style::{Color, Stylize};

use crate::color::ColorEntry;
use crate::palette::{PaletteStore, Session};
use crate::storage::{LoadSource, SaveReport, StageKind};

use super::theme::Theme;

const SWATCH: &str = "      ";
const NAME_WIDTH: usize = 24;
const USAGE_WIDTH: usize = 48;

/// Shorten `text` to `width` characters, marking the cut with `...`.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn paint(text: String, color: Color, use_color: bool) -> String {
    if use_color {
        text.with(color).to_string()
    } else {
        text
    }
}

fn swatch(entry: &ColorEntry, use_color: bool) -> String {
    match entry.rgb() {
        Some(rgb) if use_color => SWATCH
            .on(Color::Rgb {
                r: rgb.r,
                g: rgb.g,
                b: rgb.b,
            })
            .to_string(),
        Some(_) => SWATCH.to_string(),
        None => format!("{:<6}", "??"),
    }
}

fn render_row(entry: &ColorEntry, use_color: bool) -> String {
    format!(
        "{} {:<name$} {:<8} {:<20} {:<usage$} {}\n",
        swatch(entry, use_color),
        fit(&entry.name, NAME_WIDTH),
        entry.hex,
        entry.rgb_string(),
        fit(&entry.usage, USAGE_WIDTH),
        paint(entry.id.clone(), Theme::DIM, use_color),
        name = NAME_WIDTH,
        usage = USAGE_WIDTH,
    )
}

/// Render the palette grouped by category, one row per colour.
pub fn render_palette(store: &PaletteStore, use_color: bool) -> String {
    if store.is_empty() {
        return "No colors in the palette.".to_string();
    }

    let mut output = String::new();
    for (category, entries) in store.grouped() {
        let heading = format!("{} ({})", category.heading(), entries.len());
        output.push_str(&paint(heading, Theme::HEADING, use_color));
        output.push('\n');
        output.push_str(&paint(format!("{:-<60}", ""), Theme::DIM, use_color));
        output.push('\n');
        for entry in entries {
            output.push_str(&render_row(entry, use_color));
        }
        output.push('\n');
    }

    output.push_str(&format!("Total colors: {}\n", store.len()));
    output
}

/// One-line banner describing the current mode.
pub fn render_mode(session: Session, use_color: bool) -> String {
    if session.admin {
        paint("Admin ON".to_string(), Theme::ADMIN, use_color)
    } else {
        "Viewer mode".to_string()
    }
}

/// Table of storage stages and whether each one is configured.
pub fn render_status(stages: &[(StageKind, bool)], source: Option<LoadSource>) -> String {
    let mut output = String::new();
    output.push_str(&format!("{:<10} {:<12}\n", "Stage", "Configured?"));
    output.push_str(&format!("{:-<23}\n", ""));
    for (kind, configured) in stages {
        let state = if *configured { "Yes" } else { "No" };
        output.push_str(&format!("{:<10} {:<12}\n", kind.to_string(), state));
    }
    if let Some(source) = source {
        output.push_str(&format!("\nPalette loaded from: {source}\n"));
    }
    output
}

/// Human-readable outcome of a write.
pub fn describe_save(report: SaveReport, use_color: bool) -> String {
    match report {
        SaveReport::Saved(kind) => {
            paint(format!("Saved to {kind} storage"), Theme::SUCCESS, use_color)
        }
        SaveReport::Skipped => paint(
            "Palette matches the defaults; nothing written".to_string(),
            Theme::WARNING,
            use_color,
        ),
        SaveReport::Failed => paint(
            "Could not save the palette to any storage".to_string(),
            Theme::ERROR,
            use_color,
        ),
    }
}
