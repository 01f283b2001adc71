//! Command-line admin for the movie catalog.
//!
//! # Responsibility
//! - Drive the same admin session the embedded UI uses, one command per run.
//! - Ask for confirmation on stdin before destructive commands.

use anyhow::{anyhow, bail, Context, Result};
use cinedesk_core::db::open_db;
use cinedesk_core::{
    init_logging, init_stderr_logging, AdminConfig, AdminSession, AutoConfirm, CatalogStore,
    Category, DeleteConfirmation, DeleteOutcome, DraftField, FieldInput, HttpDimensionSource,
    ImageProber, MovieEntry, MovieId, ProbeOutcome, SqliteCatalogRepository, SubmitOutcome,
};
use clap::{Parser, Subcommand};
use log::info;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "cinedesk", version, about = "Movie catalog admin")]
struct Cli {
    /// SQLite database file (overrides CINEDESK_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Storage key of the catalog blob (overrides CINEDESK_STORAGE_KEY).
    #[arg(long, global = true)]
    storage_key: Option<String>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Write rolling log files here instead of stderr.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists the movies of one category.
    List {
        #[arg(default_value = "topRating")]
        category: Category,
    },
    /// Adds a movie: `add trending --set title=Dune --set genre=Sci-Fi`.
    Add {
        category: Category,
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        /// Probe image URLs for their natural size before saving.
        #[arg(long)]
        probe: bool,
    },
    /// Updates fields of an existing movie, keeping its id.
    Edit {
        category: Category,
        id: MovieId,
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        #[arg(long)]
        probe: bool,
    },
    /// Deletes a movie after confirmation.
    Delete {
        category: Category,
        id: MovieId,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Prints the natural size of an image URL or file.
    Probe {
        url: String,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Empties every category.
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Shows configuration and catalog counts.
    Info,
}

/// Confirmation step backed by a `[y/N]` prompt.
struct StdinConfirmation;

impl DeleteConfirmation for StdinConfirmation {
    fn confirm_delete(&self, category: Category, entry: &MovieEntry) -> bool {
        ask(&format!(
            "Delete \"{}\" ({}) from {}?",
            entry.title,
            entry.id,
            category.label()
        ))
        .unwrap_or(false)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    start_logging(&config)?;
    info!(
        "event=cli_start module=cli status=ok command={}",
        command_name(&cli.command)
    );

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let repo = SqliteCatalogRepository::with_key(&conn, config.storage_key.as_str());
    let store = CatalogStore::open(repo).context("failed to load the catalog")?;
    let mut session = AdminSession::new(store).with_switch_policy(config.category_switch);

    match cli.command {
        Command::List { category } => {
            session.select_category(category);
            print_entries(&session);
        }
        Command::Add {
            category,
            set,
            probe,
        } => {
            session.select_category(category);
            if probe {
                session = session.with_prober(build_prober(&config, None)?);
            }
            apply_assignments(&mut session, &set).await?;
            report_submit(session.submit()?);
        }
        Command::Edit {
            category,
            id,
            set,
            probe,
        } => {
            session.select_category(category);
            if probe {
                session = session.with_prober(build_prober(&config, None)?);
            }
            session.begin_edit(id)?;
            apply_assignments(&mut session, &set).await?;
            report_submit(session.submit()?);
        }
        Command::Delete { category, id, yes } => {
            session.select_category(category);
            let auto = AutoConfirm(true);
            let confirmation: &dyn DeleteConfirmation = if yes {
                &auto
            } else {
                &StdinConfirmation
            };
            match session.delete(id, confirmation)? {
                DeleteOutcome::Deleted => println!("Deleted {id} from {category}."),
                DeleteOutcome::Declined => println!("Kept {id}."),
                DeleteOutcome::NotFound => bail!("movie {id} not found in {category}"),
            }
        }
        Command::Probe { url, timeout_ms } => {
            session = session.with_prober(build_prober(&config, timeout_ms)?);
            session.request_image(DraftField::Image.as_str(), url)?;
            let outcomes = session.settle_probes().await;
            let values = session.draft().values();
            match outcomes.last() {
                Some(ProbeOutcome::Applied { dimensions, .. }) => {
                    let size = match dimensions {
                        Some(d) => format!("{}x{}", d.width, d.height),
                        None => "no intrinsic size".to_string(),
                    };
                    println!("{size} ({} x {})", values.image_width, values.image_height);
                }
                Some(outcome) => bail!(describe_probe_failure(outcome)),
                None => bail!("probe produced no result"),
            }
        }
        Command::Reset { yes } => {
            if yes || ask("Remove every movie from every category?")? {
                session.reset_catalog()?;
                println!("Catalog reset.");
            } else {
                println!("Nothing changed.");
            }
        }
        Command::Info => {
            println!("version      {}", cinedesk_core::core_version());
            println!("database     {}", config.db_path.display());
            println!("storage key  {}", config.storage_key);
            println!(
                "revision     {}",
                session.store().repository().revision()?
            );
            for category in Category::ALL {
                println!(
                    "{:<12} {}",
                    category.as_str(),
                    session.record().entries(category).len()
                );
            }
        }
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<AdminConfig> {
    let mut config = AdminConfig::from_env()?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(key) = &cli.storage_key {
        config.storage_key = key.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    Ok(config)
}

fn start_logging(config: &AdminConfig) -> Result<()> {
    let result = match &config.log_dir {
        Some(dir) => {
            let dir = std::path::absolute(dir)
                .with_context(|| format!("invalid log dir {}", dir.display()))?;
            let dir = dir
                .to_str()
                .ok_or_else(|| anyhow!("log dir {} is not valid UTF-8", dir.display()))?
                .to_string();
            init_logging(&config.log_level, &dir)
        }
        None => init_stderr_logging(&config.log_level),
    };
    result.map_err(|err| anyhow!(err))
}

fn build_prober(config: &AdminConfig, timeout_ms: Option<u64>) -> Result<ImageProber> {
    let source = HttpDimensionSource::new(config.probe_max_bytes)?;
    let timeout = timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(config.probe_timeout);
    Ok(ImageProber::new(Arc::new(source), timeout))
}

async fn apply_assignments(
    session: &mut AdminSession<SqliteCatalogRepository<'_>>,
    assignments: &[(String, String)],
) -> Result<()> {
    for (name, value) in assignments {
        let field = name.parse::<DraftField>()?;
        if matches!(field, DraftField::Image | DraftField::HoverImage) {
            session.request_image(name, value.clone())?;
        } else {
            session.set_field(name, FieldInput::text(value.clone()))?;
        }
    }
    for outcome in session.settle_probes().await {
        match outcome {
            ProbeOutcome::Applied { .. }
            | ProbeOutcome::Stale { .. }
            | ProbeOutcome::Cancelled { .. } => {}
            failed => bail!(describe_probe_failure(&failed)),
        }
    }
    Ok(())
}

fn describe_probe_failure(outcome: &ProbeOutcome) -> String {
    match outcome {
        ProbeOutcome::Failed { field, message } => format!("{field}: {message}"),
        ProbeOutcome::TimedOut { field } => format!("{field}: image probe timed out"),
        ProbeOutcome::Cancelled { field, .. } => format!("{field}: image probe cancelled"),
        ProbeOutcome::Stale { field, .. } => format!("{field}: image probe superseded"),
        ProbeOutcome::Applied { field, .. } => format!("{field}: image probe applied"),
    }
}

fn report_submit(outcome: SubmitOutcome) {
    match outcome {
        SubmitOutcome::Created { category, id } => println!("Created {id} in {category}."),
        SubmitOutcome::Updated { category, id } => println!("Updated {id} in {category}."),
    }
}

fn print_entries(session: &AdminSession<SqliteCatalogRepository<'_>>) {
    println!("{}", session.heading());
    if session.entries().is_empty() {
        println!("  (empty)");
        return;
    }
    for entry in session.entries() {
        let mut flags = Vec::new();
        if entry.top10 {
            flags.push("top10");
        }
        if entry.new_episode {
            flags.push("new episode");
        }
        println!(
            "  {}  {}  [{}] {} {} {}",
            entry.id,
            entry.title,
            entry.genre,
            entry.age_rating,
            entry.duration,
            flags.join(", ")
        );
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in `{raw}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn ask(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read line")?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::List { .. } => "list",
        Command::Add { .. } => "add",
        Command::Edit { .. } => "edit",
        Command::Delete { .. } => "delete",
        Command::Probe { .. } => "probe",
        Command::Reset { .. } => "reset",
        Command::Info => "info",
    }
}
