//! CLI entry point for the command index and locale key resolver.
//!
//! Every editor-facing operation is exposed as a subcommand so it can be
//! driven from scripts or a thin editor bridge.

use anyhow::{Context, bail};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use crosslink::config::CONFIG_DIR;
use crosslink::providers::{OpenOutcome, open_locale_key};
use crosslink::{
    FsTextStore, IndexError, InvokeDefinitionProvider, LocaleHoverProvider, LocaleKeyService,
    OpenLocaleKeyArgs, Position, Settings, TextOffsetMapper, WorkspaceIndexManager,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Command index and locale key resolver
#[derive(Parser)]
#[command(
    name = "crosslink",
    version = env!("CARGO_PKG_VERSION"),
    about = "Jump from invoke() calls to Tauri commands and from t() keys to locale files",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the .crosslink directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Rebuild command indexes and list what they contain
    #[command(after_help = "Examples:\n  crosslink index\n  crosslink index ../app --json")]
    Index {
        /// Workspace roots (defaults to configured roots)
        roots: Vec<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Resolve the invoke() command literal at a cursor
    #[command(after_help = "Examples:\n  crosslink definition src/api/launcher.ts 12:31")]
    Definition {
        file: PathBuf,

        /// 1-based LINE:COL
        cursor: String,

        #[arg(long)]
        json: bool,
    },

    /// Render the locale hover for the t() key segment at a cursor
    Hover {
        file: PathBuf,

        /// 1-based LINE:COL
        cursor: String,

        /// Workspace root the file belongs to (defaults to the closest configured root)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Inspect or edit locale files
    Locale {
        #[command(subcommand)]
        action: LocaleAction,
    },

    /// Keep indexes live; type `reindex` to force a rebuild, `quit` to exit
    Watch {
        /// Workspace roots (defaults to configured roots)
        roots: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum LocaleAction {
    /// List locale files under a workspace root
    List { root: Option<PathBuf> },

    /// Show whether a dotted key exists, where, and its value preview
    Lookup {
        file: PathBuf,
        key: String,
        #[arg(long)]
        json: bool,
    },

    /// Create a key if missing and print its position
    Ensure {
        file: PathBuf,
        key: String,

        /// Create an object instead of an empty string
        #[arg(long)]
        branch: bool,

        /// Fail instead of creating a missing key
        #[arg(long)]
        no_create: bool,
    },

    /// Run the open-locale-key command with a JSON bundle or command link
    Open { args: String },
}

#[derive(Debug, Serialize)]
struct IndexSummary {
    root: PathBuf,
    commands: usize,
    definitions: usize,
    registered: usize,
    files_scanned: usize,
    filtered: bool,
    names: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path).unwrap_or_else(|e| {
            eprintln!("Configuration error loading from {}: {e}", path.display());
            std::process::exit(1);
        }),
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };

    init_logging(settings.debug);

    match run(cli.command, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(index_error) = e.downcast_ref::<IndexError>() {
                for suggestion in index_error.recovery_suggestions() {
                    eprintln!("  hint: {suggestion}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "crosslink=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Commands, settings: Settings) -> anyhow::Result<()> {
    match command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force).map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Index { roots, json } => {
            let roots = roots_or_configured(roots, &settings);
            let mut commands = settings.commands.clone();
            commands.watch = false;

            // initialize() runs the first rebuild of every root
            let manager = WorkspaceIndexManager::new(commands);
            manager.initialize(&roots).await?;
            print_index(&manager, json)?;
        }

        Commands::Definition { file, cursor, json } => {
            let text = read_document(&file)?;
            let offset = cursor_offset(&text, &cursor)?;

            let mut commands = settings.commands.clone();
            commands.watch = false;
            let manager = Arc::new(WorkspaceIndexManager::new(commands.clone()));
            manager.initialize(&settings.effective_roots()).await?;

            let provider = InvokeDefinitionProvider::new(manager, &commands);
            let locations = provider.provide_definition(&text, offset);
            if json {
                println!("{}", serde_json::to_string_pretty(&locations)?);
            } else if locations.is_empty() {
                bail!("no command definition at {cursor}");
            } else {
                for location in locations {
                    println!("{location}");
                }
            }
        }

        Commands::Hover { file, cursor, root } => {
            let text = read_document(&file)?;
            let offset = cursor_offset(&text, &cursor)?;
            let document = file
                .canonicalize()
                .with_context(|| format!("cannot resolve {}", file.display()))?;
            let root = match root {
                Some(root) => root.canonicalize()?,
                None => owning_root(&document, &settings.effective_roots())
                    .context("file is not inside any workspace root")?,
            };

            let provider = LocaleHoverProvider::new(Arc::new(locale_service(&settings)));
            match provider.provide_hover(&root, &document, &text, offset) {
                Some(hover) => println!("{}", hover.markdown),
                None => bail!("no translation key at {cursor}"),
            }
        }

        Commands::Locale { action } => run_locale(action, &settings).await?,

        Commands::Watch { roots } => {
            let roots = roots_or_configured(roots, &settings);
            let mut commands = settings.commands.clone();
            commands.watch = true;

            let manager = WorkspaceIndexManager::new(commands);
            manager.initialize(&roots).await?;
            print_index(&manager, false)?;
            eprintln!("Watching {} root(s); type `reindex` or `quit`", roots.len());

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    line = lines.next_line() => match line?.as_deref().map(str::trim) {
                        None | Some("quit") => break,
                        Some("reindex") => {
                            manager.rebuild_all().await?;
                            print_index(&manager, false)?;
                        }
                        Some("") => {}
                        Some(other) => eprintln!("unknown input: {other}"),
                    },
                }
            }

            manager.dispose();
        }
    }

    Ok(())
}

async fn run_locale(action: LocaleAction, settings: &Settings) -> anyhow::Result<()> {
    let service = locale_service(settings);

    match action {
        LocaleAction::List { root } => {
            let root = match root {
                Some(root) => root,
                None => settings
                    .effective_roots()
                    .into_iter()
                    .next()
                    .context("no workspace root configured")?,
            };
            for file in service.list_locale_files(&root)? {
                println!("{}\t{}", file.locale, file.path.display());
            }
        }

        LocaleAction::Lookup { file, key, json } => {
            let lookup = service.lookup(&file, &key);
            if json {
                println!("{}", serde_json::to_string_pretty(&lookup)?);
            } else if let Some(range) = lookup.range.filter(|_| lookup.exists) {
                println!(
                    "{}:{}  {}",
                    file.display(),
                    range.start(),
                    lookup.preview.unwrap_or_default()
                );
            } else {
                bail!("{key} not found in {}", file.display());
            }
        }

        LocaleAction::Ensure {
            file,
            key,
            branch,
            no_create,
        } => {
            let range = service
                .ensure_key_and_locate(&file, &key, !branch, !no_create)
                .await?;
            println!("{}:{}", file.display(), range.start());
        }

        LocaleAction::Open { args } => {
            let args = OpenLocaleKeyArgs::parse(&args).context("malformed command arguments")?;
            match open_locale_key(&service, &args).await {
                OpenOutcome::Ignored => {}
                OpenOutcome::Revealed { location } => println!("{location}"),
                OpenOutcome::Failed { message } => bail!(message),
            }
        }
    }

    Ok(())
}

fn locale_service(settings: &Settings) -> LocaleKeyService {
    LocaleKeyService::new(Arc::new(FsTextStore), settings.locales.clone())
}

fn roots_or_configured(roots: Vec<PathBuf>, settings: &Settings) -> Vec<PathBuf> {
    if roots.is_empty() {
        settings.effective_roots()
    } else {
        roots
    }
}

fn print_index(manager: &WorkspaceIndexManager, json: bool) -> anyhow::Result<()> {
    let summaries: Vec<IndexSummary> = manager
        .indexes()
        .iter()
        .map(|index| {
            let snapshot = index.snapshot();
            IndexSummary {
                root: index.root().to_path_buf(),
                commands: snapshot.command_count(),
                definitions: snapshot.definition_count(),
                registered: snapshot.registered_count(),
                files_scanned: snapshot.files_scanned(),
                filtered: snapshot.is_filtered(),
                names: snapshot
                    .command_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "{}: {} command(s), {} registered, {} file(s) scanned{}",
            summary.root.display(),
            summary.commands,
            summary.registered,
            summary.files_scanned,
            if summary.filtered { "" } else { " (no registration list)" }
        );
        for name in &summary.names {
            for definition in manager.get_definitions(name) {
                println!("  {name}  {}", definition.location());
            }
        }
    }
    Ok(())
}

fn read_document(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Parse a 1-based `LINE:COL` cursor into a byte offset
fn cursor_offset(text: &str, cursor: &str) -> anyhow::Result<usize> {
    let Some((line, column)) = cursor.split_once(':') else {
        bail!("cursor must be LINE:COL, got {cursor}");
    };
    let line: u32 = line.trim().parse().context("invalid line")?;
    let column: u32 = column.trim().parse().context("invalid column")?;
    if line == 0 || column == 0 {
        bail!("LINE:COL is 1-based");
    }

    Ok(TextOffsetMapper::new(text).offset_at(Position::new(line - 1, column - 1)))
}

/// Deepest configured root containing `document`
fn owning_root(document: &Path, roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .filter_map(|root| root.canonicalize().ok())
        .filter(|root| document.starts_with(root))
        .max_by_key(|root| root.components().count())
        .or_else(|| {
            document
                .ancestors()
                .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
                .map(Path::to_path_buf)
        })
}
