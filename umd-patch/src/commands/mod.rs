//! Command implementations for each format

pub mod iso;
pub mod lz;
pub mod patchfs;
