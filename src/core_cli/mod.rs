pub mod core_cli;

pub use core_cli::{format_entry, target_segments, Cli, Command};
