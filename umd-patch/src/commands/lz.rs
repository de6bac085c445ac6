//! LZ container command implementations

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use umd_lz::Compression;

use crate::utils::{format_bytes, format_expansion};

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum FormatArg {
    /// Detect from the magic
    #[default]
    Auto,
    /// CRILAYLA container
    Crilayla,
    /// IECP container
    Cmp,
}

impl FormatArg {
    fn resolve(self, data: &[u8]) -> Result<Compression> {
        match self {
            Self::Auto => Compression::detect(data).context("Unrecognized container magic"),
            Self::Crilayla => Ok(Compression::CriLayla),
            Self::Cmp => Ok(Compression::Cmp),
        }
    }
}

#[derive(Subcommand)]
pub enum LzCommands {
    /// Decompress a CRILAYLA or CMP container
    Decompress {
        /// Compressed input file
        input: PathBuf,

        /// Output file (defaults to the input path with `.dec` appended)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Container format
        #[arg(short, long, value_enum, default_value_t = FormatArg::Auto)]
        format: FormatArg,
    },

    /// Show the container format and declared size
    Info {
        /// Compressed input file
        input: PathBuf,
    },
}

pub fn execute(command: LzCommands) -> Result<()> {
    match command {
        LzCommands::Decompress {
            input,
            output,
            format,
        } => decompress_file(&input, output, format),
        LzCommands::Info { input } => show_info(&input),
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn decompress_file(input: &Path, output: Option<PathBuf>, format: FormatArg) -> Result<()> {
    let data = read_input(input)?;
    let compression = format.resolve(&data)?;
    log::debug!("Decompressing {} as {compression}", input.display());

    let decoded = compression
        .decompress(&data)
        .with_context(|| format!("Failed to decompress {}", input.display()))?;

    let target = output.unwrap_or_else(|| {
        let mut name = input.as_os_str().to_owned();
        name.push(".dec");
        PathBuf::from(name)
    });
    fs::write(&target, &decoded)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    println!(
        "{compression}: {} -> {} ({}) written to {}",
        format_bytes(data.len() as u64),
        format_bytes(decoded.len() as u64),
        format_expansion(data.len() as u64, decoded.len() as u64),
        target.display()
    );
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let data = read_input(input)?;
    let compression = FormatArg::Auto.resolve(&data)?;
    let size = compression.decompressed_size(&data)?;

    println!("Format: {compression}");
    println!("Compressed size: {}", format_bytes(data.len() as u64));
    println!("Decompressed size: {}", format_bytes(size));
    println!(
        "Expansion: {}",
        format_expansion(data.len() as u64, size)
    );
    Ok(())
}
