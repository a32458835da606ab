// FILE: crates/cli/src/commands.rs

use crate::Session;
use anyhow::{bail, Context, Result};
use audii_core::{Audiobook, AudiobookId, Collection, CollectionId, Datasource, Timestamp};
use audii_library::LibraryError;
use audii_state::{CollectionModel, ImportKind, ImportModel, ImportStatus};
use clap::ArgMatches;
use console::style;
use serde::Serialize;

/// Turns a library error into one whose top line is the user-facing message
trait UserContext<T> {
    fn user_context(self) -> Result<T>;
}

impl<T> UserContext<T> for std::result::Result<T, LibraryError> {
    fn user_context(self) -> Result<T> {
        self.map_err(|e| {
            if let LibraryError::App(app) = &e {
                if app.is_critical() {
                    log::error!("{} failure: {}", app.severity(), app);
                }
            }
            let message = e.user_message();
            anyhow::Error::new(e).context(message)
        })
    }
}

/// Create the config file; the database was created when the session opened
pub fn init(session: &Session) -> Result<()> {
    let created = session
        .config_manager
        .initialize()
        .context("Failed to write the config file")?;

    let config_path = session.config_manager.config_path();
    if created {
        println!("{} Config written to {}", style("✓").green().bold(), config_path.display());
    } else {
        println!("Config already exists at {}", config_path.display());
    }
    println!(
        "Database ready at {}",
        session.config_manager.database_path(&session.config).display()
    );
    Ok(())
}

/// Import a file, a folder as one book, or a folder of books
pub async fn import(session: &Session, matches: &ArgMatches) -> Result<()> {
    let (kind, args) = match matches.subcommand() {
        Some(("file", args)) => (ImportKind::File, args),
        Some(("folder", args)) => (ImportKind::FolderAsBook, args),
        Some(("folders", args)) => (ImportKind::FolderAsBooks, args),
        _ => bail!("Choose what to import: file, folder or folders"),
    };
    let path = required(args, "path")?;

    let model = ImportModel::new(session.library.clone());
    match model.import(kind, path).await {
        ImportStatus::Success(titles) if titles.is_empty() => {
            println!("Nothing new to import in {}", path);
        }
        ImportStatus::Success(titles) => {
            println!(
                "{} Imported {} audiobook(s)",
                style("✓").green().bold(),
                titles.len()
            );
            for title in titles {
                println!("  {}", title);
            }
        }
        ImportStatus::Error(message) => bail!(message),
        ImportStatus::Idle | ImportStatus::Loading => {}
    }
    Ok(())
}

/// List audiobooks, optionally filtered
pub async fn list(session: &Session, matches: &ArgMatches) -> Result<()> {
    let library = &session.library;

    let books = if matches.get_flag("continue") {
        library
            .continue_listening(audii_state::CONTINUE_LISTENING_LIMIT)
            .await
    } else if let Some(id) = matches.get_one::<i64>("collection") {
        library.in_collection(CollectionId::new(*id)).await
    } else {
        library.list().await
    }
    .user_context()?;

    let books: Vec<Audiobook> = match matches.get_one::<String>("search") {
        Some(query) => books
            .into_iter()
            .filter(|book| book.matches_search(query))
            .collect(),
        None => books,
    };

    if books.is_empty() {
        println!("No audiobooks found. Use 'import' to add some.");
        return Ok(());
    }

    println!("\n{} Audiobooks", style(books.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for book in &books {
        print_book_summary(book);
    }
    Ok(())
}

/// Show everything stored about one audiobook
pub async fn info(session: &Session, matches: &ArgMatches) -> Result<()> {
    let book = load_book(session, matches).await?;
    let collections = session.library.list_collections().await.user_context()?;

    println!("\n{}", style("Audiobook").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("ID: {}", book.id);
    println!("Title: {}", style(&book.title).bold());
    println!("Author: {}", book.author);
    println!("Narrator: {}", book.narrator);
    println!("Location: {}", book.location);
    if let Some(cover) = &book.cover_path {
        println!("Cover: {}", cover);
    }

    println!("\nPlayback:");
    println!(
        "  Position: chapter {} at {}",
        book.position.chapter + 1,
        audii_core::Duration::from_millis(book.position.offset_ms).as_clock()
    );
    println!(
        "  Progress: {}% ({} of {})",
        book.progress_percent(),
        book.elapsed().as_hms(),
        book.total_duration().as_hms()
    );
    println!("  Speed: {:.2}x", book.speed);
    println!(
        "  Skip: +{}s / -{}s",
        book.skip_timings.forward_secs, book.skip_timings.backward_secs
    );
    println!("  Last modified: {}", format_timestamp(book.modified));

    println!("\nChapters:");
    for (index, duration) in book.durations.iter().enumerate() {
        println!(
            "  {:>3}. {}",
            index + 1,
            audii_core::Duration::from_millis(*duration).as_clock()
        );
    }

    let names: Vec<&str> = collections
        .iter()
        .filter(|c| book.is_in_collection(c.id))
        .map(|c| c.name.as_str())
        .collect();
    if !names.is_empty() {
        println!("\nCollections: {}", names.join(", "));
    }
    Ok(())
}

/// Delete an audiobook after confirmation
pub async fn delete(session: &Session, matches: &ArgMatches) -> Result<()> {
    let book = load_book(session, matches).await?;

    if !matches.get_flag("force") {
        println!("Are you sure you want to delete '{}'? (y/N)", book.title);
        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    session
        .library
        .delete_audiobook(&book.id)
        .await
        .user_context()?;
    println!("{} Deleted: {}", style("✓").green().bold(), book.title);
    Ok(())
}

pub async fn complete(session: &Session, matches: &ArgMatches) -> Result<()> {
    let book = load_book(session, matches).await?;
    session
        .library
        .mark_completed(&book.id)
        .await
        .user_context()?;
    println!("{} Marked '{}' as finished", style("✓").green().bold(), book.title);
    Ok(())
}

pub async fn restart(session: &Session, matches: &ArgMatches) -> Result<()> {
    let book = load_book(session, matches).await?;
    session.library.restart(&book.id).await.user_context()?;
    println!("{} '{}' will start from the beginning", style("✓").green().bold(), book.title);
    Ok(())
}

pub async fn speed(session: &Session, matches: &ArgMatches) -> Result<()> {
    let book = load_book(session, matches).await?;
    let value = *matches
        .get_one::<f32>("value")
        .ok_or_else(|| anyhow::anyhow!("Speed is required"))?;

    session
        .library
        .update_speed(&book.id, value)
        .await
        .user_context()?;
    println!("{} '{}' plays at {:.2}x", style("✓").green().bold(), book.title, value);
    Ok(())
}

/// Collection subcommands
pub async fn collection(session: &Session, matches: &ArgMatches) -> Result<()> {
    let model = CollectionModel::new(session.library.clone());

    match matches.subcommand() {
        Some(("add", args)) => {
            let name = required(args, "name")?;
            let Some(collection) = model.add(name).await else {
                bail!(model.state().error_message.unwrap_or_default());
            };
            println!(
                "{} Created collection {} ({})",
                style("✓").green().bold(),
                collection.name,
                collection.id
            );
        }
        Some(("list", _)) => {
            let collections = model.state().collections;
            if collections.is_empty() {
                println!("No collections yet.");
            }
            for collection in collections {
                print_collection(session, &collection).await?;
            }
        }
        Some(("delete", args)) => {
            let id = collection_id(args)?;
            if !model.delete(id).await {
                bail!(model.state().error_message.unwrap_or_default());
            }
            println!("{} Deleted collection {}", style("✓").green().bold(), id);
        }
        Some(("assign", args)) => {
            let book = load_book(session, args).await?;
            let id = collection_id(args)?;
            session
                .library
                .add_to_collection(&book.id, id)
                .await
                .user_context()?;
            println!("{} Added '{}' to collection {}", style("✓").green().bold(), book.title, id);
        }
        Some(("unassign", args)) => {
            let book = load_book(session, args).await?;
            let id = collection_id(args)?;
            session
                .library
                .remove_from_collection(&book.id, id)
                .await
                .user_context()?;
            println!(
                "{} Removed '{}' from collection {}",
                style("✓").green().bold(),
                book.title,
                id
            );
        }
        _ => bail!("Unknown collection command"),
    }
    Ok(())
}

pub async fn datasources(session: &Session) -> Result<()> {
    let datasources = session.library.list_datasources().await.user_context()?;
    if datasources.is_empty() {
        println!("No tracked folders. 'import folders' adds one.");
        return Ok(());
    }

    for datasource in datasources {
        let books = session
            .library
            .audiobooks()
            .list_by_datasource(&datasource.id)
            .await
            .user_context()?;
        println!(
            "{}  {} ({} audiobook(s))",
            truncate(datasource.id.as_str(), 8),
            datasource.location,
            books.len()
        );
    }
    Ok(())
}

pub async fn sync(session: &Session) -> Result<()> {
    let summary = session.library.sync_datasources().await.user_context()?;

    if summary.removed_datasources > 0 {
        println!(
            "Stopped tracking {} folder(s) that no longer exist",
            summary.removed_datasources
        );
    }
    if summary.added.is_empty() {
        println!("Library is up to date.");
    } else {
        println!(
            "{} Added {} audiobook(s)",
            style("✓").green().bold(),
            summary.added.len()
        );
        for book in &summary.added {
            println!("  {}", book.title);
        }
    }
    Ok(())
}

pub async fn stats(session: &Session) -> Result<()> {
    let stats = session.library.stats().await.user_context()?;

    println!("\n{}", style("Library Statistics").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("Audiobooks: {}", style(stats.total_books).bold());
    println!("In progress: {}", stats.started.saturating_sub(stats.completed));
    println!("Finished: {}", stats.completed);
    println!("Collections: {}", stats.collections);
    println!("Tracked folders: {}", stats.datasources);
    println!("Total duration: {}", format_duration(stats.total_duration.as_seconds()));
    println!("Listened: {}", format_duration(stats.listened.as_seconds()));
    Ok(())
}

#[derive(Serialize)]
struct LibraryExport {
    exported_at: String,
    audiobooks: Vec<Audiobook>,
    collections: Vec<Collection>,
    datasources: Vec<Datasource>,
}

/// Write the whole library to a JSON file
pub async fn export(session: &Session, matches: &ArgMatches) -> Result<()> {
    let output = required(matches, "output")?;
    let library = &session.library;

    let export = LibraryExport {
        exported_at: chrono::Local::now().to_rfc3339(),
        audiobooks: library.list().await.user_context()?,
        collections: library.list_collections().await.user_context()?,
        datasources: library.list_datasources().await.user_context()?,
    };

    let json = serde_json::to_string_pretty(&export).context("Failed to serialize to JSON")?;
    std::fs::write(output, json).context("Failed to write export file")?;

    println!(
        "{} Exported {} audiobook(s) to {}",
        style("✓").green().bold(),
        export.audiobooks.len(),
        output
    );
    Ok(())
}

pub async fn play(session: &Session, matches: &ArgMatches) -> Result<()> {
    let book = load_book(session, matches).await?;

    println!("\n{} {}", style("▶").green().bold(), style(&book.title).bold());
    println!("by {}", book.author);

    crate::player::start_playback(session, book.id).await
}

async fn load_book(session: &Session, matches: &ArgMatches) -> Result<Audiobook> {
    let id = AudiobookId::from_string(required(matches, "id")?);
    session.library.get(&id).await.user_context()
}

async fn print_collection(session: &Session, collection: &Collection) -> Result<()> {
    let books = session
        .library
        .in_collection(collection.id)
        .await
        .user_context()?;
    println!(
        "{:>4}  {} ({} audiobook(s))",
        collection.id,
        style(&collection.name).bold(),
        books.len()
    );
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .ok_or_else(|| anyhow::anyhow!("{} is required", name))
}

fn collection_id(matches: &ArgMatches) -> Result<CollectionId> {
    matches
        .get_one::<i64>("collection")
        .map(|id| CollectionId::new(*id))
        .ok_or_else(|| anyhow::anyhow!("Collection ID is required"))
}

fn print_book_summary(book: &Audiobook) {
    println!("\n{}", style(&book.title).bold());
    println!("  by {}", book.author);
    println!(
        "  ID: {} | Duration: {} | Chapters: {}",
        book.id,
        book.total_duration().as_hms(),
        book.chapter_count()
    );
    if book.is_completed() {
        println!("  {}", style("Finished").green());
    } else if book.is_started() {
        println!("  {}", style(format!("{}% listened", book.progress_percent())).yellow());
    }
}

fn format_timestamp(timestamp: Timestamp) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp.as_millis())
        .map(|utc| {
            utc.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len])
    }
}
