//! Interactive palette session.
//!
//! The session renders the palette, offers a menu that depends on admin mode
//! and hands every mutation to [`Showcase`]. Prompting goes through
//! [`prompts::PromptService`] so the loop can be scripted in tests.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

pub mod prompts;
pub mod render;
pub mod theme;

use crate::palette::ColorDraft;
use crate::showcase::{ResetOutcome, Showcase};
use prompts::{MenuAction, PromptService};

pub const RESET_GLOBAL_CONFIRM: &str = "Are you sure you want to reset all colors to defaults? \
    This will remove all custom colors and reset the global database.";
pub const RELOAD_CONFIRM: &str = "Are you sure you want to reload the current color palette? \
    This will refresh from the database.";

/// Options for the interactive session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub use_color: bool,
    /// Directory export files are written to.
    pub export_dir: PathBuf,
}

/// Run `task` behind a stderr spinner. The spinner hides itself when stderr
/// is not a terminal.
pub async fn with_spinner<F: Future>(message: &str, task: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    let output = task.await;
    spinner.finish_and_clear();
    output
}

/// Menu loop; returns when the user quits.
pub async fn run_session(
    showcase: &mut Showcase,
    prompts: &dyn PromptService,
    out: &mut dyn Write,
    options: &SessionOptions,
) -> Result<()> {
    loop {
        writeln!(out, "{}", render::render_mode(showcase.session(), options.use_color))?;
        writeln!(out, "{}", render::render_palette(showcase.store(), options.use_color))?;

        let action = prompts.choose_action(&MenuAction::available(showcase.session().admin))?;
        if action == MenuAction::Quit {
            return Ok(());
        }
        handle_action(action, showcase, prompts, out, options).await?;
    }
}

async fn handle_action(
    action: MenuAction,
    showcase: &mut Showcase,
    prompts: &dyn PromptService,
    out: &mut dyn Write,
    options: &SessionOptions,
) -> Result<()> {
    let use_color = options.use_color;
    match action {
        MenuAction::Add => {
            let Some(draft) = prompts.color_form("Add New Color", &ColorDraft::default())? else {
                return Ok(());
            };
            if let Some(report) = with_spinner("Saving palette...", showcase.add(draft)).await {
                writeln!(out, "{}", render::describe_save(report, use_color))?;
            }
        }
        MenuAction::Edit => {
            let Some(id) = prompts.pick_entry("Edit which color?", showcase.entries())? else {
                return Ok(());
            };
            let Some(initial) = showcase.store().get(&id).map(ColorDraft::from) else {
                return Ok(());
            };
            let Some(draft) = prompts.color_form("Edit Color", &initial)? else {
                return Ok(());
            };
            let saved = with_spinner("Saving palette...", showcase.update(&id, draft)).await;
            if let Some(report) = saved {
                writeln!(out, "{}", render::describe_save(report, use_color))?;
            }
        }
        MenuAction::Delete => {
            let Some(id) = prompts.pick_entry("Delete which color?", showcase.entries())? else {
                return Ok(());
            };
            if let Some(report) = with_spinner("Saving palette...", showcase.delete(&id)).await {
                writeln!(out, "{}", render::describe_save(report, use_color))?;
            }
        }
        MenuAction::Reload | MenuAction::ResetGlobal => {
            let message = if showcase.session().admin {
                RESET_GLOBAL_CONFIRM
            } else {
                RELOAD_CONFIRM
            };
            if !prompts.confirm(message)? {
                return Ok(());
            }
            match with_spinner("Loading palette...", showcase.reset()).await {
                ResetOutcome::Restored(report) => {
                    writeln!(out, "{}", render::describe_save(report, use_color))?
                }
                ResetOutcome::Reloaded(source) => writeln!(out, "Reloaded from {source}")?,
            }
        }
        MenuAction::Export => {
            let path = showcase.export_to(&options.export_dir)?;
            writeln!(out, "Exported palette to {}", path.display())?;
        }
        MenuAction::Import => {
            let Some(file) = prompts.file_path("Path to palette file:")? else {
                return Ok(());
            };
            let imported =
                with_spinner("Importing palette...", showcase.import_file(Path::new(&file))).await;
            match imported {
                Ok(report) => {
                    writeln!(out, "Colors imported successfully!")?;
                    writeln!(out, "{}", render::describe_save(report, use_color))?;
                }
                Err(e) => writeln!(out, "{e}")?,
            }
        }
        MenuAction::AdminOn | MenuAction::AdminOff => {
            let Some(attempt) = prompts.admin_password()? else {
                return Ok(());
            };
            if let Err(e) = showcase.toggle_admin(&attempt) {
                writeln!(out, "{e}")?;
            }
        }
        MenuAction::Status => {
            writeln!(out, "{}", render::render_status(&showcase.stage_status(), None))?;
        }
        MenuAction::Quit => {}
    }
    Ok(())
}
