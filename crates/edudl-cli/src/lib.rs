//! Library half of the `edudl` binary.
//!
//! Argument parsing, configuration assembly and terminal rendering live
//! here so they can be tested without spawning the binary.

pub mod bootstrap;
pub mod monitor;
pub mod parser;

pub use bootstrap::build_config;
pub use monitor::Monitor;
pub use parser::{Cli, DownloadTarget};
