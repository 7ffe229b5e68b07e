// src/config/mod.rs
// =============================================================================
// This module loads the YAML configuration file and turns it into the
// directories the audit run writes into.
//
// Submodules:
// - schema: The typed shape of config.yml plus its validation rules
// - loader: Reads the file, parses it and resolves absolute directories
//
// The config is read exactly once, by main.rs, and the resulting values are
// passed down explicitly. Nothing here is global state.
// =============================================================================

mod loader;
mod schema;

pub use loader::{base_dir_of, load, ResolvedPaths, DEFAULT_CONFIG_FILE};
pub use schema::AppConfig;
