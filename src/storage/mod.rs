// src/storage/mod.rs
// =============================================================================
// Everything that touches the output folders on disk.
//
// Submodules:
// - dirs: Idempotent directory creation
// - report: Writes one route report as pretty-printed JSON
// =============================================================================

mod dirs;
mod report;

pub use dirs::{ensure_dir, prepare_output_dirs};
pub use report::{write_report, ReportEntry, ReportLayout, ReportWriteError};
