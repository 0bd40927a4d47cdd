use clap::{Parser, Subcommand};
mod admin;
mod color;
mod config;
mod exchange;
mod palette;
mod showcase;
mod storage;
mod ui;

use anyhow::Context;
use is_terminal::IsTerminal;
use std::path::PathBuf;
use tracing::info;

use color::Category;
use config::{KeyringStore, Overrides, SecretStore, Settings};
use palette::ColorDraft;
use showcase::{ResetOutcome, Showcase};
use storage::{Cascade, GithubDocumentStore, LoadSource, LocalStore, SaveReport, SupabaseStore};
use ui::prompts::{InteractivePromptService, PromptService};
use ui::{render, with_spinner, SessionOptions};

#[derive(Parser)]
#[command(
    name = "palette",
    version = "0.1.0",
    about = "Browse and curate a brand color palette from the terminal",
    long_about = "Shows a named color palette grouped by category and keeps it in sync with a GitHub-hosted JSON document, a Supabase table or a local file, whichever is available first."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// GitHub owner of the palette repository
    #[arg(long, short)]
    owner: Option<String>,

    /// Repository holding the palette document
    #[arg(long, short)]
    repo: Option<String>,

    /// Branch to read from and commit to (repository default when omitted)
    #[arg(long, short)]
    branch: Option<String>,

    /// GitHub token for authentication
    #[arg(long, short)]
    token: Option<String>,

    /// Enter admin mode (prompts for the password unless --password is given)
    #[arg(long, global = true)]
    admin: bool,

    /// Admin password; implies --admin
    #[arg(long, global = true)]
    password: Option<String>,

    /// Directory for the local palette file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Disable colored swatches
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the palette (default when not attached to a terminal)
    List,
    /// Interactive session (default in a terminal)
    Shell,
    /// Add a color
    Add {
        #[arg(long)]
        name: String,
        /// Six hex digits, with or without the leading '#'
        #[arg(long)]
        hex: String,
        #[arg(long, default_value = "")]
        usage: String,
        /// primary, semantic or neutral
        #[arg(long, default_value = "primary")]
        category: String,
    },
    /// Edit a color (admin only)
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        hex: Option<String>,
        #[arg(long)]
        usage: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete a color
    Delete { id: String },
    /// Reload from storage, or with admin mode reset every store to the defaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Write the palette to color-palette-YYYY-MM-DD.json (admin only)
    Export {
        /// Output directory (defaults to the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace the palette with the contents of a JSON file (admin only)
    Import { file: PathBuf },
    /// Show which storage stages are configured
    Status,
    /// Show or modify saved config
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Manage the GitHub token stored in the OS keyring
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigAction {
    Show,
    Set { key: String, value: String },
    Unset { key: String },
}

#[derive(Subcommand, Clone)]
enum TokenAction {
    /// Store a token (prompts when omitted)
    Set { token: Option<String> },
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        // Initialise tracing subscriber in verbose mode
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Print a rejection and exit with the validation status code.
fn reject(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(2);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Config { action }) => return handle_config(action.clone()),
        Some(Commands::Token { action }) => {
            return handle_token(action.clone(), &KeyringStore::default())
        }
        _ => {}
    }

    let config = config::load_config().context("Failed to load config")?;
    let settings = Settings::resolve(
        Overrides {
            owner: cli.owner.clone(),
            repo: cli.repo.clone(),
            branch: cli.branch.clone(),
            token: cli.token.clone(),
        },
        config,
        &KeyringStore::default(),
    );

    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => storage::local::default_data_dir()?,
    };
    let local = LocalStore::new(&data_dir);
    let local_file = local.path().to_path_buf();
    let cascade = Cascade::standard(
        GithubDocumentStore::new(settings.github.clone()),
        SupabaseStore::new(settings.supabase.clone()),
        local,
    );
    let mut showcase = Showcase::new(cascade, settings.admin_gate());
    let prompts = InteractivePromptService::new();

    if cli.admin || cli.password.is_some() {
        enter_admin(&mut showcase, cli.password.as_deref(), &prompts)?;
    }

    let source = with_spinner("Loading palette...", showcase.load()).await;
    info!(%source, count = showcase.entries().len(), "Palette loaded");

    let use_color = !cli.no_color && std::io::stdout().is_terminal();

    let command = match cli.command {
        Some(command) => command,
        None if prompts.can_prompt() && std::io::stdout().is_terminal() => Commands::Shell,
        None => Commands::List,
    };

    match command {
        Commands::List => {
            println!("{}", render::render_palette(showcase.store(), use_color));
        }
        Commands::Shell => {
            let options = SessionOptions {
                use_color,
                export_dir: std::env::current_dir().context("Failed to resolve current directory")?,
            };
            let mut stdout = std::io::stdout();
            ui::run_session(&mut showcase, &prompts, &mut stdout, &options).await?;
        }
        Commands::Add {
            name,
            hex,
            usage,
            category,
        } => {
            let draft = ColorDraft {
                name,
                hex,
                usage,
                category: Category::from(category.as_str()),
            };
            match with_spinner("Saving palette...", showcase.add(draft)).await {
                Some(report) => report_save(report, use_color)?,
                None => reject("Color not added: a name and a 6-digit hex code are required"),
            }
        }
        Commands::Edit {
            id,
            name,
            hex,
            usage,
            category,
        } => {
            require_admin(&showcase, "Editing");
            let Some(entry) = showcase.store().get(&id) else {
                reject(format!("No color with id '{id}'"));
            };
            let mut draft = ColorDraft::from(entry);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(hex) = hex {
                draft.hex = hex;
            }
            if let Some(usage) = usage {
                draft.usage = usage;
            }
            if let Some(category) = category {
                draft.category = Category::from(category.as_str());
            }
            match with_spinner("Saving palette...", showcase.update(&id, draft)).await {
                Some(report) => report_save(report, use_color)?,
                None => reject("Color not updated: a name and a 6-digit hex code are required"),
            }
        }
        Commands::Delete { id } => {
            match with_spinner("Saving palette...", showcase.delete(&id)).await {
                Some(report) => report_save(report, use_color)?,
                None => reject(format!("No color with id '{id}'")),
            }
        }
        Commands::Reset { yes } => {
            if showcase.session().admin && !yes {
                if !prompts.can_prompt() {
                    reject("Refusing to reset the global palette without --yes");
                }
                if !prompts.confirm(ui::RESET_GLOBAL_CONFIRM)? {
                    return Ok(());
                }
            }
            match with_spinner("Loading palette...", showcase.reset()).await {
                ResetOutcome::Restored(report) => report_save(report, use_color)?,
                ResetOutcome::Reloaded(source) => {
                    println!("Reloaded from {source}");
                    println!("{}", render::render_palette(showcase.store(), use_color));
                }
            }
        }
        Commands::Export { out } => {
            require_admin(&showcase, "Exporting");
            let dir = match out {
                Some(dir) => dir,
                None => std::env::current_dir().context("Failed to resolve current directory")?,
            };
            let path = showcase.export_to(&dir)?;
            println!("Exported palette to {}", path.display());
        }
        Commands::Import { file } => {
            require_admin(&showcase, "Importing");
            match with_spinner("Importing palette...", showcase.import_file(&file)).await {
                Ok(report) => {
                    println!("Colors imported successfully!");
                    report_save(report, use_color)?;
                }
                Err(e) => reject(e),
            }
        }
        Commands::Status => {
            print_status(&showcase, source, &local_file, use_color);
        }
        Commands::Config { .. } | Commands::Token { .. } => {}
    }

    Ok(())
}

/// Unlock admin mode from `--password` or an interactive prompt.
fn enter_admin(
    showcase: &mut Showcase,
    password: Option<&str>,
    prompts: &dyn PromptService,
) -> anyhow::Result<()> {
    let attempt = match password {
        Some(password) => password.to_string(),
        None if prompts.can_prompt() => match prompts.admin_password()? {
            Some(password) => password,
            None => return Ok(()),
        },
        None => reject("Admin mode needs --password when not running in a terminal"),
    };

    if let Err(e) = showcase.unlock_admin(&attempt) {
        reject(e);
    }
    info!("Admin mode enabled");
    Ok(())
}

fn require_admin(showcase: &Showcase, what: &str) {
    if !showcase.session().admin {
        reject(format!("{what} requires admin mode (use --admin)"));
    }
}

fn report_save(report: SaveReport, use_color: bool) -> anyhow::Result<()> {
    let message = render::describe_save(report, use_color);
    if report == SaveReport::Failed {
        anyhow::bail!(message);
    }
    println!("{message}");
    Ok(())
}

fn print_status(
    showcase: &Showcase,
    source: LoadSource,
    local_file: &std::path::Path,
    use_color: bool,
) {
    println!("{}", render::render_mode(showcase.session(), use_color));
    println!();
    print!("{}", render::render_status(&showcase.stage_status(), Some(source)));
    println!("Local palette file: {}", local_file.display());
    println!("Colors: {}", showcase.entries().len());
}

fn handle_config(action: Option<ConfigAction>) -> anyhow::Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let path = config::config_file_path()?;
            let config = config::load_config()?;
            println!("Config file: {}", path.display());
            let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            if content.trim().is_empty() {
                println!("(no values set)");
            } else {
                print!("{content}");
            }
        }
        ConfigAction::Set { key, value } => {
            if !config::CONFIG_KEYS.contains(&key.as_str()) {
                reject(format!(
                    "Unknown config key '{key}'. Known keys: {}",
                    config::CONFIG_KEYS.join(", ")
                ));
            }
            config::update_config_value(&key, &value)?;
            println!("Set {key}");
        }
        ConfigAction::Unset { key } => {
            if !config::CONFIG_KEYS.contains(&key.as_str()) {
                reject(format!(
                    "Unknown config key '{key}'. Known keys: {}",
                    config::CONFIG_KEYS.join(", ")
                ));
            }
            config::delete_config_value(&key)?;
            println!("Unset {key}");
        }
    }
    Ok(())
}

fn handle_token(action: TokenAction, store: &dyn SecretStore) -> anyhow::Result<()> {
    match action {
        TokenAction::Set { token } => {
            let token = match token {
                Some(token) => token,
                None if std::io::stdin().is_terminal() => inquire::Password::new("GitHub token:")
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read token")?,
                None => reject("Pass the token as an argument when not running in a terminal"),
            };
            if token.trim().is_empty() {
                reject("Token must not be empty");
            }
            store.set_token(token.trim())?;
            println!("Token stored in the OS keyring");
        }
        TokenAction::Clear => {
            store.delete_token()?;
            println!("Token removed from the OS keyring");
        }
    }
    Ok(())
}
