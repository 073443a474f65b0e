//! Side-effecting adapters: processes, Git, configuration files, the terminal.

pub mod cancel;
pub mod config;
pub mod executor;
pub mod files;
pub mod git;
pub mod presenter;
pub mod process;
pub mod prompt;
