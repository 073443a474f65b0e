//! Standardized Git workflows and AI prompt generation.
//!
//! Every command is a short list of steps run by a two-phase workflow runner:
//! all pre-checks first, then a plan shown to the user, one confirmation, and
//! the executes in order. The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (configuration document, merge,
//!   naming rules, check records). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (processes, Git, configuration file,
//!   terminal, prompt rendering). Behind traits where tests substitute them.
//!
//! [`workflow`] and [`steps`] build on both; [`commands`] compose steps into
//! the CLI surface.

pub mod app;
pub mod commands;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod steps;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod workflow;
