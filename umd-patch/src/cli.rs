//! Root CLI structure for umd-patch

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "umd-patch")]
#[command(about = "Inspect and patch PSP UMD images and PATCHFS archives", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ISO9660 image operations
    Iso {
        #[command(subcommand)]
        command: crate::commands::iso::IsoCommands,
    },

    /// PATCHFS archive operations
    Patchfs {
        #[command(subcommand)]
        command: crate::commands::patchfs::PatchfsCommands,
    },

    /// CRILAYLA and CMP decompression
    Lz {
        #[command(subcommand)]
        command: crate::commands::lz::LzCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
