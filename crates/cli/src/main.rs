// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use audii_config::{Config, ConfigManager};
use audii_database::DatabaseConfig;
use audii_library::{LibraryManager, LibraryOptions};
use clap::{Arg, ArgAction, Command};

mod commands;
mod player;

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_name("BOOK_ID")
        .help("Audiobook ID")
}

fn path_arg(help: &'static str) -> Arg {
    Arg::new("path").required(true).value_name("PATH").help(help)
}

fn build_cli() -> Command {
    Command::new("audii")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Audiobook player and library manager")
        .subcommand_required(false)
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .help("Path to the database file (defaults to the configured one)")
                .global(true),
        )
        .subcommand(Command::new("init").about("Create the config file and the database"))
        .subcommand(
            Command::new("import")
                .about("Import audiobooks")
                .subcommand_required(true)
                .subcommand(
                    Command::new("file")
                        .about("Import one audio file as a single-chapter book")
                        .arg(path_arg("Audio file")),
                )
                .subcommand(
                    Command::new("folder")
                        .about("Import a folder as one book, one chapter per audio file")
                        .arg(path_arg("Folder of chapter files")),
                )
                .subcommand(
                    Command::new("folders")
                        .about("Import every entry of a folder as its own book and track the folder")
                        .arg(path_arg("Folder of audiobooks")),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List audiobooks")
                .arg(
                    Arg::new("search")
                        .short('s')
                        .long("search")
                        .value_name("QUERY")
                        .help("Only books whose title or author contains QUERY"),
                )
                .arg(
                    Arg::new("collection")
                        .short('c')
                        .long("collection")
                        .value_name("COLLECTION_ID")
                        .value_parser(clap::value_parser!(i64))
                        .help("Only books in this collection"),
                )
                .arg(
                    Arg::new("continue")
                        .long("continue")
                        .help("Only the books to continue listening to")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("info").about("Show an audiobook").arg(id_arg()))
        .subcommand(
            Command::new("delete")
                .about("Delete an audiobook from the library")
                .arg(id_arg())
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .help("Skip confirmation prompt")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("complete").about("Mark an audiobook as finished").arg(id_arg()))
        .subcommand(Command::new("restart").about("Rewind an audiobook to the start").arg(id_arg()))
        .subcommand(
            Command::new("speed")
                .about("Set an audiobook's playback speed")
                .arg(id_arg())
                .arg(
                    Arg::new("value")
                        .required(true)
                        .value_name("SPEED")
                        .value_parser(clap::value_parser!(f32))
                        .help("Speed between 0.5 and 3.0"),
                ),
        )
        .subcommand(
            Command::new("collection")
                .about("Manage collections")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Create a collection")
                        .arg(Arg::new("name").required(true).value_name("NAME")),
                )
                .subcommand(Command::new("list").about("List collections"))
                .subcommand(
                    Command::new("delete")
                        .about("Delete a collection")
                        .arg(collection_id_arg()),
                )
                .subcommand(
                    Command::new("assign")
                        .about("Add an audiobook to a collection")
                        .arg(id_arg())
                        .arg(collection_id_arg()),
                )
                .subcommand(
                    Command::new("unassign")
                        .about("Remove an audiobook from a collection")
                        .arg(id_arg())
                        .arg(collection_id_arg()),
                ),
        )
        .subcommand(
            Command::new("datasource")
                .about("Inspect tracked folders")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List tracked folders")),
        )
        .subcommand(Command::new("sync").about("Re-scan tracked folders for new audiobooks"))
        .subcommand(Command::new("stats").about("Show library statistics"))
        .subcommand(
            Command::new("export")
                .about("Export the library as JSON")
                .arg(
                    Arg::new("output")
                        .required(true)
                        .value_name("FILE")
                        .help("Output file path"),
                ),
        )
        .subcommand(Command::new("play").about("Play an audiobook").arg(id_arg()))
}

fn collection_id_arg() -> Arg {
    Arg::new("collection")
        .required(true)
        .value_name("COLLECTION_ID")
        .value_parser(clap::value_parser!(i64))
}

/// Everything a command needs
pub struct Session {
    pub config: Config,
    pub config_manager: ConfigManager,
    pub library: LibraryManager,
}

async fn open_session(database: Option<&String>) -> Result<Session> {
    let config_manager = ConfigManager::new().context("Failed to locate the config directory")?;
    let config = config_manager
        .load_with_env_overrides()
        .unwrap_or_else(|e| {
            log::warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        });

    let mut options = LibraryOptions::from_config(&config, &config_manager);
    if let Some(path) = database {
        options.database = DatabaseConfig::from_path(path);
    }

    if let Some(parent) = std::path::Path::new(&options.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create the data directory")?;
        }
    }

    let library = LibraryManager::open(options)
        .await
        .context("Failed to open the library database")?;

    Ok(Session {
        config,
        config_manager,
        library,
    })
}

fn default_log_filter() -> String {
    ConfigManager::new()
        .map(|manager| manager.load_or_default().app.log_level.to_string())
        .unwrap_or_else(|_| "info".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_log_filter()))
        .init();

    let matches = build_cli().get_matches();
    let Some((name, sub_matches)) = matches.subcommand() else {
        build_cli().print_help()?;
        return Ok(());
    };

    let session = open_session(matches.get_one::<String>("database")).await?;

    match name {
        "init" => commands::init(&session),
        "import" => commands::import(&session, sub_matches).await,
        "list" => commands::list(&session, sub_matches).await,
        "info" => commands::info(&session, sub_matches).await,
        "delete" => commands::delete(&session, sub_matches).await,
        "complete" => commands::complete(&session, sub_matches).await,
        "restart" => commands::restart(&session, sub_matches).await,
        "speed" => commands::speed(&session, sub_matches).await,
        "collection" => commands::collection(&session, sub_matches).await,
        "datasource" => commands::datasources(&session).await,
        "sync" => commands::sync(&session).await,
        "stats" => commands::stats(&session).await,
        "export" => commands::export(&session, sub_matches).await,
        "play" => commands::play(&session, sub_matches).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_parses_nested_commands() {
        let matches = build_cli()
            .try_get_matches_from(["audii", "--database", "x.db", "import", "folders", "/books"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("database").unwrap(), "x.db");

        let (name, import) = matches.subcommand().unwrap();
        assert_eq!(name, "import");
        let (kind, args) = import.subcommand().unwrap();
        assert_eq!(kind, "folders");
        assert_eq!(args.get_one::<String>("path").unwrap(), "/books");
    }

    #[test]
    fn test_rejects_non_numeric_speed() {
        let result = build_cli().try_get_matches_from(["audii", "speed", "abc", "fast"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_flags() {
        let matches = build_cli()
            .try_get_matches_from(["audii", "list", "--continue", "-c", "3"])
            .unwrap();
        let list = matches.subcommand_matches("list").unwrap();
        assert!(list.get_flag("continue"));
        assert_eq!(list.get_one::<i64>("collection"), Some(&3));
    }
}
