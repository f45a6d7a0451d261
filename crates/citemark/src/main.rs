/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

mod cli;
mod document;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use citemark_core::{
    CitationEngine, CitationRecord, Config, EngineConfig, ProcessError, ProcessOutcome, Registry,
};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, OutputFormat};
use colored::Colorize;
use document::Document;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Cli {
        command,
        config,
        registry,
        hex_length,
        ..
    } = cli;

    match command {
        Command::Process {
            paths,
            dry_run,
            check,
            format,
        } => {
            let config = load_config(config.as_deref(), registry, hex_length)?;
            let engine = CitationEngine::new(config)?;
            let files = collect_markdown_files(&paths)?;
            if files.is_empty() {
                warn!("no Markdown files found");
            }

            let outcomes = if dry_run || check {
                preview(&engine, &files)?
            } else {
                process_files(&engine, &files)?
            };

            report(&outcomes, format, dry_run || check)?;

            if check {
                let stale = outcomes.iter().filter(|o| o.changed).count();
                if stale > 0 {
                    bail!("{} document(s) need citation normalization", stale);
                }
            }
        }

        Command::List { format, document } => {
            let config = load_config(config.as_deref(), registry, hex_length)?;
            let registry = Registry::load(&config.registry_path);
            let records: Vec<&CitationRecord> = match &document {
                Some(doc) => registry.records_for_document(doc).collect(),
                None => registry.iter().collect(),
            };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
                OutputFormat::Table | OutputFormat::Text => print_table(&records),
            }
        }

        Command::Show { hex_id } => {
            let config = load_config(config.as_deref(), registry, hex_length)?;
            let registry = Registry::load(&config.registry_path);
            let Some(record) = registry.get(&hex_id.to_ascii_lowercase()) else {
                bail!("citation {} not found", hex_id);
            };
            println!("{}", serde_json::to_string_pretty(record)?);
        }

        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the engine config: explicit file, then project file, then defaults.
/// Command-line overrides apply last.
fn load_config(
    path: Option<&Path>,
    registry: Option<PathBuf>,
    hex_length: Option<usize>,
) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            Config::load_from_project(&cwd)?.unwrap_or_default()
        }
    };

    let mut config = config.citations;
    if let Some(registry) = registry {
        config.registry_path = registry;
    }
    if let Some(hex_length) = hex_length {
        config.hex_length = hex_length;
    }
    config.validate()?;
    Ok(config)
}

/// Expand each path into Markdown files, walking directories and skipping
/// hidden entries below them.
fn collect_markdown_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            bail!("No such file or directory: {}", path.display());
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        files.extend(found);
    }

    files.dedup();
    Ok(files)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "md" || ext == "markdown")
        .unwrap_or(false)
}

/// The identifier recorded in the registry for a document.
fn document_id(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(&cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf());
    let id = relative.to_string_lossy().replace('\\', "/");
    id.strip_prefix("./").map(String::from).unwrap_or(id)
}

fn process_files(engine: &CitationEngine, files: &[PathBuf]) -> Result<Vec<ProcessOutcome>> {
    let mut outcomes = Vec::with_capacity(files.len());

    for path in files {
        let text = read_document(path)?;
        let doc = Document::parse(&text);
        let id = document_id(path);

        let outcome = match engine.process_document(doc.body, &id) {
            Ok(outcome) => outcome,
            Err(ProcessError::RegistrySave {
                outcome,
                registry,
                source,
            }) => {
                warn!(document = %id, error = %source, "registry save failed, retrying");
                write_document(path, &doc, &outcome)?;
                registry.save().with_context(|| {
                    format!(
                        "Failed to save registry {} after processing {}",
                        engine.config().registry_path.display(),
                        id
                    )
                })?;
                outcomes.push(*outcome);
                continue;
            }
            Err(err) => return Err(err).with_context(|| format!("Failed to process {}", id)),
        };

        write_document(path, &doc, &outcome)?;
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Run the pipeline against one in-memory registry without writing anything.
fn preview(engine: &CitationEngine, files: &[PathBuf]) -> Result<Vec<ProcessOutcome>> {
    let mut registry = Registry::load(&engine.config().registry_path);
    let mut outcomes = Vec::with_capacity(files.len());

    for path in files {
        let text = read_document(path)?;
        let doc = Document::parse(&text);
        let id = document_id(path);
        let outcome = engine
            .process(&mut registry, doc.body, &id)
            .with_context(|| format!("Failed to process {}", id))?;
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_document(path: &Path, doc: &Document<'_>, outcome: &ProcessOutcome) -> Result<()> {
    if !outcome.changed {
        return Ok(());
    }
    fs::write(path, doc.with_body(&outcome.text))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(document = %outcome.document, "wrote document");
    Ok(())
}

fn report(outcomes: &[ProcessOutcome], format: OutputFormat, preview: bool) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(outcomes)?);
        return Ok(());
    }

    for outcome in outcomes {
        let stats = &outcome.stats;
        if !outcome.changed {
            println!("{} {}", "unchanged".dimmed(), outcome.document);
            continue;
        }

        let label = if preview { "would update" } else { "updated" };
        let mut details = Vec::new();
        if stats.citations_converted > 0 {
            details.push(format!("{} converted", stats.citations_converted));
        }
        if stats.footnotes_added > 0 {
            details.push(format!("{} footnotes added", stats.footnotes_added));
        }
        if stats.footnote_section_added {
            details.push("section added".to_string());
        }
        if stats.duplicate_definitions_removed > 0 {
            details.push(format!(
                "{} duplicates removed",
                stats.duplicate_definitions_removed
            ));
        }

        if details.is_empty() {
            println!("{} {}", label.green(), outcome.document);
        } else {
            println!(
                "{} {} ({})",
                label.green(),
                outcome.document,
                details.join(", ")
            );
        }
    }

    let changed = outcomes.iter().filter(|o| o.changed).count();
    println!(
        "{} of {} document(s) {}",
        changed.to_string().bold(),
        outcomes.len(),
        if preview { "would change" } else { "changed" }
    );
    Ok(())
}

fn print_table(records: &[&CitationRecord]) {
    use tabled::{settings::Style, Table, Tabled};

    #[derive(Tabled)]
    struct CitationRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Files")]
        files: usize,
        #[tabled(rename = "Updated")]
        updated: String,
    }

    if records.is_empty() {
        println!("No citations found");
        return;
    }

    let rows: Vec<CitationRow> = records
        .iter()
        .map(|record| CitationRow {
            id: record.hex_id.clone(),
            source: truncate(
                record
                    .source_title
                    .as_deref()
                    .or(record.source_text.as_deref())
                    .unwrap_or("-"),
                60,
            ),
            files: record.files.len(),
            updated: record.date_updated.format("%Y-%m-%d").to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{}", table);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
