use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use promptforge::app::Session;
use promptforge::chat::ChatClient;
use promptforge::enhance::direct_request;
use promptforge::storage::library::{CategoryFilter, LibraryQuery, SortOrder};
use promptforge::storage::{FileStore, KeyValueStore};
use promptforge::types::Category;
use promptforge::ui;

#[derive(Parser)]
#[command(name = "promptforge", version, about = "Turn short prompts into detailed ones")]
struct Cli {
    /// Chat endpoint root for this run only (e.g. http://localhost:1234)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Where presets, saved prompts and settings live
    #[arg(long, global = true, env = "PROMPTFORGE_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Print model output as received instead of formatted
    #[arg(long, global = true)]
    raw: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite a basic prompt into a detailed one
    Enhance {
        prompt: String,
        /// Save the result to the library
        #[arg(long)]
        save: bool,
        #[arg(long, default_value = "General")]
        category: String,
        /// Also run the enhanced prompt
        #[arg(long)]
        generate: bool,
    },
    /// Send a chat request directly
    Chat(ChatArgs),
    /// Manage model presets
    #[command(subcommand)]
    Presets(PresetCommand),
    /// Browse and manage saved prompts
    #[command(subcommand)]
    Library(LibraryCommand),
    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Args)]
struct ChatArgs {
    user_prompt: String,
    #[arg(long)]
    system: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    temperature: Option<f32>,
    /// -1 for unlimited
    #[arg(long, allow_negative_numbers = true)]
    max_tokens: Option<i32>,
    #[arg(long)]
    stream: bool,
}

#[derive(Subcommand)]
enum PresetCommand {
    List,
    /// Save the current settings as a preset
    Save { name: String },
    Apply { id: String },
    Delete { id: String },
}

#[derive(Subcommand)]
enum LibraryCommand {
    List {
        /// Category name, or "all"
        #[arg(long, default_value = "all")]
        category: String,
        #[arg(long)]
        favorites: bool,
        #[arg(long)]
        search: Option<String>,
        /// newest, oldest or category
        #[arg(long, default_value = "newest")]
        order: String,
    },
    Show { id: String },
    Favorite { id: String },
    Delete { id: String },
    /// Re-run a saved prompt with the instruction that produced it
    Replay { id: String },
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    SetBaseUrl { url: String },
}

fn init_logging() {
    // Logs go to stderr so stdout only carries results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("promptforge=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let store: Arc<dyn KeyValueStore> = match &cli.data_dir {
        Some(dir) => Arc::new(FileStore::new(dir)),
        None => Arc::new(FileStore::open_default()?),
    };
    let mut session = Session::open(ChatClient::http()?, store);
    if let Some(url) = &cli.base_url {
        session.override_base_url(url);
    }

    let print = |text: &str| {
        if cli.raw {
            println!("{}", text);
        } else {
            println!("{}", ui::render_response(text));
        }
    };

    match cli.command {
        Command::Enhance {
            ref prompt,
            save,
            ref category,
            generate,
        } => {
            let enhanced = session.enhance(prompt).await?;
            print(&enhanced);

            if save {
                match session.save_enhancement(Category::from(category.as_str())) {
                    Ok(record) => eprintln!("Saved as {}", record.id),
                    Err(e) => eprintln!("Not saved: {}", e),
                }
            }
            if generate && session.last_enhancement().is_some() {
                println!();
                print(&session.generate_from_enhancement().await?);
            }
        }
        Command::Chat(ref args) => {
            // One-off overrides, not saved
            let mut overridden = session.settings().clone();
            if let Some(system) = &args.system {
                overridden.system_prompt = system.clone();
            }
            if let Some(model) = &args.model {
                overridden.model = model.clone();
            }
            if let Some(temperature) = args.temperature {
                overridden.temperature = temperature;
            }
            if let Some(max_tokens) = args.max_tokens {
                overridden.max_tokens = max_tokens;
            }
            overridden.stream = overridden.stream || args.stream;
            overridden.validate();

            let request = direct_request(&overridden, &args.user_prompt);
            print(&session.submit_request(&request).await?);
        }
        Command::Presets(PresetCommand::List) => {
            let active = session.settings().active_preset.clone();
            for preset in session.presets().items() {
                println!("{}", ui::render_preset(preset, active.as_deref() == Some(preset.id.as_str())));
            }
        }
        Command::Presets(PresetCommand::Save { ref name }) => {
            let preset = session.save_current_as_preset(name)?;
            println!("{}", ui::render_preset(&preset, false));
        }
        Command::Presets(PresetCommand::Apply { ref id }) => {
            let preset = session.apply_preset(id)?;
            println!("{}", ui::render_preset(&preset, true));
        }
        Command::Presets(PresetCommand::Delete { ref id }) => match session.delete_preset(id) {
            Some(preset) => println!("Deleted preset '{}'", preset.name),
            None => eprintln!("No preset with id '{}'", id),
        },
        Command::Library(LibraryCommand::List {
            ref category,
            favorites,
            ref search,
            ref order,
        }) => {
            let query = LibraryQuery {
                category: category.parse::<CategoryFilter>()?,
                favorites_only: favorites,
                search: search.clone(),
                order: order.parse::<SortOrder>().map_err(anyhow::Error::msg)?,
            };
            for record in session.library_view(&query) {
                println!("{}", ui::render_record_line(&record));
            }
        }
        Command::Library(LibraryCommand::Show { ref id }) => match session.library().get(id) {
            Some(record) => println!("{}", ui::render_record(record)),
            None => eprintln!("No saved prompt with id '{}'", id),
        },
        Command::Library(LibraryCommand::Favorite { ref id }) => {
            let favorite = session.toggle_favorite(id)?;
            println!("{} is {}a favorite", id, if favorite { "now " } else { "no longer " });
        }
        Command::Library(LibraryCommand::Delete { ref id }) => match session.delete_record(id) {
            Some(record) => println!("Deleted {}", record.id),
            None => eprintln!("No saved prompt with id '{}'", id),
        },
        Command::Library(LibraryCommand::Replay { ref id }) => {
            print(&session.replay(id).await?);
        }
        Command::Settings(SettingsCommand::Show) => {
            println!("{}", serde_json::to_string_pretty(session.settings())?);
            println!("effective base URL: {}", session.base_url());
        }
        Command::Settings(SettingsCommand::SetBaseUrl { ref url }) => {
            session.update_settings(|settings| settings.base_url = url.clone());
            println!("base URL set to {}", session.settings().base_url);
        }
    }

    Ok(())
}
