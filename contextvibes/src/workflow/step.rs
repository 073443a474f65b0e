//! The step contract and the context every step runs against.

use std::path::Path;

use anyhow::Result;

use crate::core::config::Config;
use crate::io::cancel::CancelToken;
use crate::io::executor::Executor;
use crate::io::git::Git;
use crate::io::presenter::Presenter;

/// Capabilities handed to each step.
pub struct StepContext<'a> {
    pub git: &'a Git<'a>,
    pub exec: &'a dyn Executor,
    pub presenter: &'a dyn Presenter,
    pub cancel: &'a CancelToken,
    pub config: &'a Config,
    pub assume_yes: bool,
    /// Directory generated files are written to.
    pub workdir: &'a Path,
}

impl StepContext<'_> {
    /// Ask the user, or answer yes in assume-yes mode.
    pub fn confirm(&self, question: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        self.presenter.confirm(question)
    }
}

/// One unit of a workflow.
///
/// `pre_check` must not mutate the repository or the filesystem; the runner
/// calls every step's pre-check before any `execute`.
pub trait Step {
    fn description(&self) -> String;

    fn pre_check(&self, _ctx: &StepContext<'_>) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()>;

    /// True once `execute` has stashed the user's changes.
    fn stashed_changes(&self) -> bool {
        false
    }
}
