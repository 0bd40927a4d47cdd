use crossterm::style::Color;

/// Colours for the text around the swatches.
/// The values are chosen to be accessible and work in both light & dark terminals.
pub struct Theme;

impl Theme {
    /// Category headings.
    pub const HEADING: Color = Color::Cyan;

    /// Admin mode badge.
    pub const ADMIN: Color = Color::Yellow;

    /// Ids, column rules and other secondary text.
    pub const DIM: Color = Color::DarkGrey;

    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;
}
