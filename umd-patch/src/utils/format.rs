//! Formatting utilities

use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format how much larger the output is than the input
pub fn format_expansion(compressed: u64, decompressed: u64) -> String {
    if compressed == 0 {
        "N/A".to_string()
    } else {
        format!("{:.2}x", decompressed as f64 / compressed as f64)
    }
}

/// Format a sector count followed by its byte size
pub fn format_sectors(sectors: u64) -> String {
    format!("{sectors} sectors ({})", format_bytes(sectors * umd_iso::SECTOR_SIZE))
}
