//! tei-editor CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tei_editor::commands::{self, Session};
use tei_editor_core::EditorError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tei-editor")]
#[command(version)]
#[command(about = "Inspect TEI documents the way the editor core sees them", long_about = None)]
struct Cli {
    /// Editor configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report parse and link diagnostics
    Check {
        /// Document to check
        file: PathBuf,
    },

    /// Evaluate an XPath expression against the document
    Xpath {
        file: PathBuf,

        /// XPath 1.0 expression; `tei:` and `xml:` are always bound
        expression: String,
    },

    /// Describe the nodes at a byte offset or `row:column`
    Locate {
        file: PathBuf,

        /// Byte offset, or 1-based `row:column`
        position: String,

        /// Also report the record the position belongs to
        #[arg(long)]
        parent: Option<String>,
    },

    /// Select records matched by a parent path
    Navigate {
        file: PathBuf,

        /// Repeating container, e.g. `//tei:biblStruct`
        #[arg(long)]
        parent: String,

        /// 1-based record to select (all records when omitted)
        #[arg(short, long)]
        index: Option<usize>,
    },
}

fn run(cli: Cli) -> Result<bool> {
    let config = commands::load_config(cli.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Check { file } => {
            let session = Session::open(&file, config)?;
            let summary = commands::check::execute(&session, cli.json, &mut stdout)?;
            Ok(summary.is_clean())
        }
        Commands::Xpath { file, expression } => {
            let session = Session::open(&file, config)?;
            commands::xpath::execute(&session, &expression, cli.json, &mut stdout)?;
            Ok(true)
        }
        Commands::Locate { file, position, parent } => {
            let mut session = Session::open(&file, config)?;
            commands::locate::execute(&mut session, &position, parent.as_deref(), cli.json, &mut stdout)?;
            Ok(true)
        }
        Commands::Navigate { file, parent, index } => {
            let mut session = Session::open(&file, config)?;
            commands::navigate::execute(&mut session, &parent, index, cli.json, &mut stdout)?;
            Ok(true)
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "tei_editor=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(err) => match err.downcast_ref::<EditorError>() {
            Some(editor_error) => {
                eprintln!("{}", editor_error.to_diagnostic().to_text(None));
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}
