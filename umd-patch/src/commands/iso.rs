//! ISO image command implementations

use anyhow::{Context, Result, bail};
use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use umd_io::FileCursor;
use umd_iso::{DeltaPatch, IsoEditor, IsoImage, Replace};

use crate::utils::{
    add_table_row, create_byte_progress_bar, create_progress_bar, create_spinner, create_table,
    format_bytes, format_sectors, is_same_file, matches_pattern, output_path, read_assignment,
    truncate_path,
};

/// How `--patch` payloads are applied
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum EngineArg {
    /// The payload is the new file content
    #[default]
    Replace,
    /// The payload is a VCDIFF delta (needs the `xdelta` feature)
    Xdelta,
}

#[derive(Subcommand)]
pub enum IsoCommands {
    /// Show volume information
    Info {
        /// Path to the ISO image
        image: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List files in an ISO image
    List {
        /// Path to the ISO image
        image: PathBuf,

        /// Filter files by pattern (supports wildcards)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show location and size
        #[arg(short, long)]
        long: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Extract one file from an ISO image
    Extract {
        /// Path to the ISO image
        image: PathBuf,

        /// Relative path of the file inside the image
        path: String,

        /// Output file (defaults to the file name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Copy an image and patch files in the copy
    Patch {
        /// Source ISO image (never modified)
        input: PathBuf,

        /// Patched ISO image to write
        output: PathBuf,

        /// Patch a file: PATH=FILE (repeatable)
        #[arg(short, long = "patch", value_name = "PATH=FILE")]
        patches: Vec<String>,

        /// Move a file to the end of the image so it may grow (repeatable)
        #[arg(short, long = "relocate", value_name = "PATH")]
        relocations: Vec<String>,

        /// How patch payloads are interpreted
        #[arg(short, long, value_enum, default_value_t = EngineArg::Replace)]
        engine: EngineArg,
    },
}

pub fn execute(command: IsoCommands) -> Result<()> {
    match command {
        IsoCommands::Info { image, json } => show_info(&image, json),
        IsoCommands::List {
            image,
            filter,
            long,
            json,
        } => list_files(&image, filter.as_deref(), long, json),
        IsoCommands::Extract {
            image,
            path,
            output,
        } => extract_file(&image, &path, output.as_deref()),
        IsoCommands::Patch {
            input,
            output,
            patches,
            relocations,
            engine,
        } => patch_image(&input, &output, &patches, &relocations, engine),
    }
}

fn open_image(path: &Path) -> Result<IsoImage> {
    let spinner = create_spinner("Reading ISO...");
    let image = IsoImage::open(path)
        .with_context(|| format!("Failed to read ISO image {}", path.display()));
    spinner.finish_and_clear();
    image
}

#[derive(Serialize)]
struct InfoJson<'a> {
    system_id: &'a str,
    volume_id: &'a str,
    creation_date: &'a str,
    volume_sectors: u32,
    image_size: u64,
    path_table_size: u32,
    path_table_lba: u32,
    directories: usize,
    files: usize,
    total_file_size: u64,
}

fn show_info(path: &Path, json: bool) -> Result<()> {
    let image = open_image(path)?;
    let info = image.info();
    let creation_date = info.creation_date.trim_end_matches('\0');

    if json {
        let out = InfoJson {
            system_id: &info.system_id,
            volume_id: &info.volume_id,
            creation_date,
            volume_sectors: info.volume_sectors,
            image_size: info.image_size,
            path_table_size: info.path_table_size,
            path_table_lba: info.path_table_lba,
            directories: info.directory_count,
            files: info.file_count,
            total_file_size: info.total_file_size,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("ISO Image Information");
    println!("=====================");
    println!("Path: {}", path.display());
    println!("System identifier: {}", info.system_id);
    println!("Volume identifier: {}", info.volume_id);
    println!("Creation date: {creation_date}");
    println!(
        "Volume size: {}",
        format_sectors(u64::from(info.volume_sectors))
    );
    println!("Image size: {}", format_bytes(info.image_size));
    println!(
        "Path table: {} bytes at LBA {}",
        info.path_table_size, info.path_table_lba
    );
    println!("Directories: {}", info.directory_count);
    println!(
        "Files: {} ({})",
        info.file_count,
        format_bytes(info.total_file_size)
    );

    let declared = image.descriptor().volume_size();
    if declared != info.image_size {
        log::warn!(
            "Declared volume size {declared} differs from image size {}",
            info.image_size
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct EntryJson<'a> {
    path: &'a str,
    lba: u32,
    length: u32,
    sectors: u64,
}

fn list_files(path: &Path, filter: Option<&str>, long: bool, json: bool) -> Result<()> {
    let image = open_image(path)?;
    let pattern = filter.unwrap_or("*");

    let mut files: Vec<_> = image
        .files()
        .filter(|entry| matches_pattern(&entry.path, pattern))
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    if json {
        let out: Vec<_> = files
            .iter()
            .map(|entry| EntryJson {
                path: &entry.path,
                lba: entry.lba,
                length: entry.length,
                sectors: entry.sectors(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("No files found matching pattern: {pattern}");
        return Ok(());
    }

    if long {
        let mut table = create_table(vec!["File", "LBA", "Size", "Sectors"]);
        for entry in &files {
            add_table_row(
                &mut table,
                vec![
                    truncate_path(&entry.path, 50),
                    entry.lba.to_string(),
                    format_bytes(u64::from(entry.length)),
                    entry.sectors().to_string(),
                ],
            );
        }
        table.printstd();
    } else {
        for entry in &files {
            println!("{}", entry.path);
        }
    }
    Ok(())
}

fn extract_file(image_path: &Path, path: &str, output: Option<&Path>) -> Result<()> {
    let image = open_image(image_path)?;
    let mut cursor = FileCursor::open_read_only(image_path)?;
    let data = image
        .read_file(&mut cursor, path)
        .with_context(|| format!("Failed to extract {path}"))?;

    let target = output_path(path, output);
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, &data).with_context(|| format!("Failed to write {}", target.display()))?;
    println!(
        "Extracted {path} ({}) to {}",
        format_bytes(data.len() as u64),
        target.display()
    );
    Ok(())
}

fn delta_engine(kind: EngineArg) -> Result<Box<dyn DeltaPatch>> {
    match kind {
        EngineArg::Replace => Ok(Box::new(Replace)),
        #[cfg(feature = "xdelta")]
        EngineArg::Xdelta => Ok(Box::new(umd_iso::Xdelta3)),
        #[cfg(not(feature = "xdelta"))]
        EngineArg::Xdelta => bail!("umd-patch was built without xdelta support"),
    }
}

fn copy_image(input: &Path, output: &Path) -> Result<()> {
    let len = fs::metadata(input)?.len();
    let pb = create_byte_progress_bar(len, "Copying image");

    let mut reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    let mut buf = vec![0u8; 1 << 20];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        pb.inc(n as u64);
    }
    writer.flush()?;
    pb.finish_and_clear();
    Ok(())
}

/// Patched files listed in `relocations` are moved and patched in one step;
/// remaining relocations are moved unchanged afterwards.
fn patch_image(
    input: &Path,
    output: &Path,
    patches: &[String],
    relocations: &[String],
    engine: EngineArg,
) -> Result<()> {
    if input == output || is_same_file(input, output) {
        bail!("Input and output must be different files");
    }
    let engine = delta_engine(engine)?;
    let patches = patches
        .iter()
        .map(|arg| read_assignment(arg))
        .collect::<Result<Vec<_>>>()?;

    let mut moving: BTreeSet<&str> = relocations.iter().map(String::as_str).collect();
    let patched_and_moved: BTreeSet<&str> = patches
        .iter()
        .map(|(path, _)| path.as_str())
        .filter(|path| moving.remove(path))
        .collect();
    let mut move_only = Vec::with_capacity(moving.len());
    for path in relocations {
        if moving.remove(path.as_str()) {
            move_only.push(path.as_str());
        }
    }

    let image = open_image(input)?;
    copy_image(input, output)
        .with_context(|| format!("Failed to copy image to {}", output.display()))?;

    let mut source = FileCursor::open_read_only(input)?;
    let mut editor = IsoEditor::begin(FileCursor::open(output)?)?;

    let pb = create_progress_bar((patches.len() + move_only.len()) as u64, "Patching");
    for (path, payload) in &patches {
        pb.set_message(format!("Patching: {path}"));
        let result = if patched_and_moved.contains(path.as_str()) {
            editor.relocate_and_patch_file(&image, &mut source, path, payload, &engine)
        } else {
            editor.patch_file(&image, path, payload, &engine)
        };
        let placement = result.with_context(|| format!("Failed to patch {path}"))?;
        log::info!(
            "{path}: {} bytes at LBA {}",
            placement.length,
            placement.lba
        );
        pb.inc(1);
    }

    for path in &move_only {
        pb.set_message(format!("Relocating: {path}"));
        let placement = editor
            .relocate_file(&image, &mut source, path)
            .with_context(|| format!("Failed to relocate {path}"))?;
        log::info!("{path}: moved to LBA {}", placement.lba);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let mut cursor = editor.finish()?;
    let size = cursor.length()?;
    println!(
        "Patched {} files, relocated {} files, {} written to {}",
        patches.len(),
        patched_and_moved.len() + move_only.len(),
        format_bytes(size),
        output.display()
    );
    Ok(())
}
