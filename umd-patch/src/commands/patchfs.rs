//! PATCHFS archive command implementations

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use umd_patchfs::{PatchFs, PatchFsBuilder};

use crate::utils::{
    add_table_row, create_progress_bar, create_spinner, create_table, format_bytes,
    matches_pattern, output_path, read_assignment, truncate_path,
};

#[derive(Subcommand)]
pub enum PatchfsCommands {
    /// List entries of an archive and its nested archives
    List {
        /// Path to the archive
        archive: PathBuf,

        /// Filter entries by pattern (supports wildcards)
        #[arg(short, long)]
        filter: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Extract one entry
    Extract {
        /// Path to the archive
        archive: PathBuf,

        /// Entry name
        name: String,

        /// Output file (defaults to the entry's last path component)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a new archive
    Create {
        /// Path for the new archive
        archive: PathBuf,

        /// Add an entry: NAME=FILE (repeatable)
        #[arg(short, long = "add", value_name = "NAME=FILE")]
        files: Vec<String>,

        /// Reference a sibling archive by file name (repeatable)
        #[arg(short, long = "nested", value_name = "FILE")]
        nested: Vec<String>,
    },
}

pub fn execute(command: PatchfsCommands) -> Result<()> {
    match command {
        PatchfsCommands::List {
            archive,
            filter,
            json,
        } => list_entries(&archive, filter.as_deref(), json),
        PatchfsCommands::Extract {
            archive,
            name,
            output,
        } => extract_entry(&archive, &name, output.as_deref()),
        PatchfsCommands::Create {
            archive,
            files,
            nested,
        } => create_archive(&archive, &files, nested),
    }
}

fn open_archive(path: &Path) -> Result<PatchFs> {
    let spinner = create_spinner("Opening archive...");
    let archive = PatchFs::open(path)
        .with_context(|| format!("Failed to open archive {}", path.display()));
    spinner.finish_and_clear();
    let archive = archive?;
    if !archive.is_valid() {
        bail!("{} is not a PATCHFS archive", path.display());
    }
    Ok(archive)
}

#[derive(Serialize)]
struct EntryJson {
    archive: String,
    name: String,
    offset: u64,
    length: u64,
}

fn collect_entries(archive: &PatchFs, pattern: &str, out: &mut Vec<EntryJson>) {
    let archive_name = archive
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for (name, entry) in archive.entries() {
        if matches_pattern(name, pattern) {
            out.push(EntryJson {
                archive: archive_name.clone(),
                name: name.to_string(),
                offset: entry.offset,
                length: entry.length,
            });
        }
    }
    for child in archive.nested() {
        collect_entries(child, pattern, out);
    }
}

fn list_entries(path: &Path, filter: Option<&str>, json: bool) -> Result<()> {
    let archive = open_archive(path)?;
    let pattern = filter.unwrap_or("*");
    let mut entries = Vec::new();
    collect_entries(&archive, pattern, &mut entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No entries found matching pattern: {pattern}");
        return Ok(());
    }

    let mut table = create_table(vec!["Archive", "Entry", "Offset", "Size"]);
    for entry in &entries {
        add_table_row(
            &mut table,
            vec![
                entry.archive.clone(),
                truncate_path(&entry.name, 50),
                format!("0x{:X}", entry.offset),
                format_bytes(entry.length),
            ],
        );
    }
    table.printstd();
    println!(
        "{} entries in {} nested archives",
        archive.files_count(),
        archive.nested().len()
    );
    Ok(())
}

fn extract_entry(path: &Path, name: &str, output: Option<&Path>) -> Result<()> {
    let mut archive = open_archive(path)?;
    let data = archive
        .get(name)
        .with_context(|| format!("Failed to extract {name}"))?;

    let target = output_path(name, output);
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, &data).with_context(|| format!("Failed to write {}", target.display()))?;
    println!(
        "Extracted {name} ({}) to {}",
        format_bytes(data.len() as u64),
        target.display()
    );
    Ok(())
}

fn create_archive(path: &Path, files: &[String], nested: Vec<String>) -> Result<()> {
    let mut builder = PatchFsBuilder::new();

    let pb = create_progress_bar(files.len() as u64, "Adding files");
    for arg in files {
        let (name, data) = read_assignment(arg)?;
        pb.set_message(format!("Adding: {name}"));
        builder = builder.add_file(name, data);
        pb.inc(1);
    }
    pb.finish_and_clear();

    for name in nested {
        builder = builder.add_nested(name);
    }

    let count = builder.file_count();
    builder
        .build(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    println!("Created {} with {count} entries", path.display());
    Ok(())
}
