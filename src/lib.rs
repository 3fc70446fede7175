//! typecrawler - tally files by type and organize them into category folders
//!
//! This library scans a directory tree and groups files by extension,
//! maps extensions to categories, moves selected files into
//! `Organized/<category>` without ever overwriting, and prunes the empty
//! directories left behind.

pub mod cleaner;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod scanner;
pub mod session;
pub mod worker;

pub use config::{CompiledFilters, ConfigError, FilterConfig};
pub use file_category::{Category, CategoryTable};
pub use file_organizer::{FileOrganizer, OrganizeError, OrganizePlan, OrganizeReport};
pub use scanner::{ScanError, ScanReport, scan_directory};
pub use session::{Session, SessionError, SessionState};

pub use cli::{OrganizeCommand, run_cli};

/// Initializes the `log` backend. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}
