// CLI binary — panicking on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::unreachable)]

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use sgedit::export::serialize_document;
use sgedit::ids::RandomIdGen;
use sgedit::import::{load_document_model, SgDocument};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sgedit", about = "sgexml loader/serializer toolbox", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress log output
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a document and print the combined editor payload as JSON
    Dump {
        /// Source .sgexml file
        file: PathBuf,
        /// Compact output instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Load a document and re-serialize it to the vendor dialect
    Roundtrip {
        /// Source .sgexml file
        file: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the side-menu summaries of a document's top-level sections
    Menu {
        /// Source .sgexml file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Dump { file, compact } => {
            let doc = SgDocument::from_path(&file);
            let mut ids = RandomIdGen;
            let model = load_document_model(&doc, &mut ids);
            let json = if compact {
                serde_json::to_string(&model)
            } else {
                serde_json::to_string_pretty(&model)
            };
            match json {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("failed to encode payload: {e}");
                    process::exit(1);
                }
            }
        }
        Commands::Roundtrip { file, output } => {
            let doc = SgDocument::from_path(&file);
            let mut ids = RandomIdGen;
            let model = load_document_model(&doc, &mut ids);
            let xml = serialize_document(&model);
            match output {
                Some(path) => {
                    if let Err(e) = std::fs::write(&path, xml) {
                        eprintln!("failed to write {}: {e}", path.display());
                        process::exit(1);
                    }
                }
                None => println!("{xml}"),
            }
        }
        Commands::Menu { file } => {
            let doc = SgDocument::from_path(&file);
            for item in doc.menu_items() {
                println!("{}\t{}", item.tag, item.summary);
            }
        }
    }
}
