//! Interactive prompts used by the palette session.
//!
//! This module provides a trait-based prompt service so the session loop can
//! be driven by `inquire` in a terminal and by scripted answers in tests.

use std::fmt;

use anyhow::Result;
use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};
use is_terminal::IsTerminal;

use crate::color::{Category, ColorEntry};
use crate::palette::ColorDraft;

/// Entries of the session menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Add,
    Edit,
    Delete,
    Reload,
    ResetGlobal,
    Export,
    Import,
    AdminOn,
    AdminOff,
    Status,
    Quit,
}

impl MenuAction {
    /// Actions shown for the current mode, in menu order.
    pub fn available(admin: bool) -> Vec<MenuAction> {
        use MenuAction::*;
        if admin {
            vec![Add, Edit, Delete, ResetGlobal, Export, Import, AdminOff, Status, Quit]
        } else {
            vec![Add, Delete, Reload, AdminOn, Status, Quit]
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuAction::Add => "Add color",
            MenuAction::Edit => "Edit color",
            MenuAction::Delete => "Delete color",
            MenuAction::Reload => "Reload",
            MenuAction::ResetGlobal => "Reset global",
            MenuAction::Export => "Export",
            MenuAction::Import => "Import",
            MenuAction::AdminOn => "Admin",
            MenuAction::AdminOff => "Admin ON (leave admin mode)",
            MenuAction::Status => "Storage status",
            MenuAction::Quit => "Quit",
        })
    }
}

/// Trait for everything the session needs to ask the user.
///
/// `Ok(None)` means the user dismissed the prompt.
pub trait PromptService {
    fn choose_action(&self, actions: &[MenuAction]) -> Result<MenuAction>;

    fn admin_password(&self) -> Result<Option<String>>;

    /// Collect name, hex, usage and category, starting from `initial`.
    fn color_form(&self, title: &str, initial: &ColorDraft) -> Result<Option<ColorDraft>>;

    /// Pick an entry; returns its id.
    fn pick_entry(&self, message: &str, entries: &[ColorEntry]) -> Result<Option<String>>;

    fn confirm(&self, message: &str) -> Result<bool>;

    fn file_path(&self, message: &str) -> Result<Option<String>>;

    /// Check if prompting is available (e.g., terminal is interactive)
    fn can_prompt(&self) -> bool;
}

/// Display wrapper so entries can be offered in a `Select`.
struct EntryChoice<'a>(&'a ColorEntry);

impl fmt::Display for EntryChoice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.0.name, self.0.hex, self.0.id)
    }
}

/// Interactive prompt service using inquire
#[derive(Default)]
pub struct InteractivePromptService;

impl InteractivePromptService {
    pub fn new() -> Self {
        Self
    }
}

impl PromptService for InteractivePromptService {
    fn choose_action(&self, actions: &[MenuAction]) -> Result<MenuAction> {
        let choice = Select::new("What would you like to do?", actions.to_vec())
            .with_page_size(actions.len())
            .prompt_skippable()?;
        Ok(choice.unwrap_or(MenuAction::Quit))
    }

    fn admin_password(&self) -> Result<Option<String>> {
        Ok(Password::new("Enter admin password:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt_skippable()?)
    }

    fn color_form(&self, title: &str, initial: &ColorDraft) -> Result<Option<ColorDraft>> {
        println!("{title}");

        let Some(name) = Text::new("Color name:")
            .with_initial_value(&initial.name)
            .with_placeholder("e.g., Primary Blue")
            .prompt_skippable()?
        else {
            return Ok(None);
        };

        let Some(hex) = Text::new("Hex code:")
            .with_initial_value(&initial.hex)
            .with_help_message("Six hex digits, e.g. #005a5e")
            .prompt_skippable()?
        else {
            return Ok(None);
        };

        let Some(usage) = Text::new("Usage:")
            .with_initial_value(&initial.usage)
            .with_placeholder("Describe how this color should be used...")
            .prompt_skippable()?
        else {
            return Ok(None);
        };

        let options: Vec<Category> = Category::SELECTABLE.to_vec();
        let cursor = options
            .iter()
            .position(|c| *c == initial.category)
            .unwrap_or(0);
        let Some(category) = Select::new("Category:", options)
            .with_starting_cursor(cursor)
            .prompt_skippable()?
        else {
            return Ok(None);
        };

        Ok(Some(ColorDraft {
            name: name.trim().to_string(),
            hex: hex.trim().to_string(),
            usage,
            category,
        }))
    }

    fn pick_entry(&self, message: &str, entries: &[ColorEntry]) -> Result<Option<String>> {
        if entries.is_empty() {
            return Ok(None);
        }
        let choices: Vec<EntryChoice<'_>> = entries.iter().map(EntryChoice).collect();
        let choice = Select::new(message, choices).prompt_skippable()?;
        Ok(choice.map(|c| c.0.id.clone()))
    }

    fn confirm(&self, message: &str) -> Result<bool> {
        Ok(Confirm::new(message)
            .with_default(false)
            .prompt_skippable()?
            .unwrap_or(false))
    }

    fn file_path(&self, message: &str) -> Result<Option<String>> {
        let path = Text::new(message).prompt_skippable()?;
        Ok(path.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()))
    }

    fn can_prompt(&self) -> bool {
        std::io::stdin().is_terminal()
    }
}
