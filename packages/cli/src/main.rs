#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for converting NSF/DOE Current & Pending forms.
//!
//! Extracts the project blocks from a C&P PDF, prints each one as a
//! `field / value` table (or JSON), and optionally writes an NIH-format
//! `.docx`.

mod table;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cnp_extract::revision::FormRevision;
use cnp_extract::{FlushPolicy, extract_projects, registry};
use cnp_nih::NihDocument;

#[derive(Parser)]
#[command(
    name = "cnp",
    about = "Convert NSF/DOE Current and Pending forms to plain-text tables and NIH format"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the projects listed on a C&P form
    Convert {
        /// C&P form to read (`.pdf`, or a `.txt` dump of its text)
        filename: PathBuf,
        /// Also write the projects in NIH MS-Word format
        #[arg(long)]
        nih: bool,
        /// Path for the NIH document (default: `NIH_<input stem>.docx`)
        #[arg(long, requires = "nih")]
        output: Option<PathBuf>,
        /// Embedded form revision to use (see `cnp forms`)
        #[arg(long, default_value = registry::DEFAULT_REVISION)]
        form: String,
        /// Load the form revision from a TOML file instead
        #[arg(long, conflicts_with = "form")]
        form_file: Option<PathBuf>,
        /// Fail if the form ends part-way through a project instead of
        /// emitting it as a partial record
        #[arg(long)]
        strict: bool,
        /// Print the projects as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Print the extracted text lines of a form (for writing new revisions)
    Lines {
        /// C&P form to read (`.pdf` or `.txt`)
        filename: PathBuf,
    },
    /// List the embedded form revisions
    Forms,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            filename,
            nih,
            output,
            form,
            form_file,
            strict,
            json,
        } => {
            let revision = match form_file {
                Some(path) => FormRevision::from_path(&path)?,
                None => registry::find(&form)?,
            };
            let policy = if strict {
                FlushPolicy::Strict
            } else {
                FlushPolicy::Lenient
            };

            let lines = read_lines(&filename)?;
            let projects = extract_projects(&lines, &revision, policy)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else {
                for project in &projects {
                    println!("{}", table::render(&table::project_rows(project)));
                }
            }

            if nih {
                let path = output.unwrap_or_else(|| cnp_nih::default_output_path(&filename));
                NihDocument::from_projects(&projects)?.save(&path)?;
            }
        }
        Commands::Lines { filename } => {
            for line in read_lines(&filename)? {
                println!("{line:?}");
            }
        }
        Commands::Forms => {
            println!("{:<12} NAME", "ID");
            println!("{}", "-".repeat(60));
            for revision in &registry::all_revisions() {
                println!("{:<12} {}", revision.id(), revision.name());
            }
        }
    }

    Ok(())
}

/// Reads the form's text lines: `.txt` files as-is, anything else as PDF.
fn read_lines(path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let is_text = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));

    let lines = if is_text {
        cnp_pdf::lines_from_text(&std::fs::read_to_string(path)?)
    } else {
        cnp_pdf::lines_from_pdf(path)?
    };

    log::debug!("Read {} lines from {}", lines.len(), path.display());

    Ok(lines)
}
