//! Two-phase workflow runner: every pre-check, then the plan and
//! confirmation, then every execute, stopping at the first failure.

use anyhow::{Result, bail};
use tracing::{debug, info, instrument, warn};

use crate::workflow::step::{Step, StepContext};

pub const STASH_POP_ADVICE: &str =
    "Your uncommitted changes were stashed. Run 'git stash pop' to restore them.";

/// How a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// The user declined at the confirmation prompt; nothing executed.
    Aborted,
}

/// An ordered list of steps run as a unit.
pub struct Workflow<'s> {
    title: String,
    steps: Vec<Box<dyn Step + 's>>,
    confirm: bool,
}

impl<'s> Workflow<'s> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            steps: Vec::new(),
            confirm: true,
        }
    }

    #[must_use]
    pub fn step(mut self, step: impl Step + 's) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Skip the confirmation prompt, for workflows that only write
    /// generated files.
    #[must_use]
    pub fn without_confirmation(mut self) -> Self {
        self.confirm = false;
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run the workflow. Step errors are returned unchanged.
    #[instrument(skip_all, fields(workflow = %self.title, steps = self.steps.len()))]
    pub fn run(mut self, ctx: &StepContext<'_>) -> Result<RunOutcome> {
        let presenter = ctx.presenter;
        presenter.summary(&self.title);

        for step in &self.steps {
            let description = step.description();
            debug!(step = %description, "pre-check");
            if let Err(err) = step.pre_check(ctx) {
                warn!(step = %description, err = %format!("{err:#}"), "pre-check failed");
                presenter.error(&format!("Pre-check failed: {description}"));
                return Err(err);
            }
        }

        presenter.info("The following actions will be performed:");
        for (i, step) in self.steps.iter().enumerate() {
            presenter.detail(&format!("{}. {}", i + 1, step.description()));
        }
        presenter.newline();

        if self.confirm && !ctx.confirm("Proceed?")? {
            info!("workflow declined by user");
            presenter.info("Operation aborted by user.");
            return Ok(RunOutcome::Aborted);
        }

        for step in &mut self.steps {
            if ctx.cancel.is_canceled() {
                bail!("workflow '{}' canceled", self.title);
            }
            let description = step.description();
            presenter.step(&description);
            debug!(step = %description, "execute");
            if let Err(err) = step.execute(ctx) {
                warn!(step = %description, err = %format!("{err:#}"), "step failed");
                presenter.error(&format!("Step failed: {description}"));
                return Err(err);
            }
        }

        if self.steps.iter().any(|step| step.stashed_changes()) {
            presenter.advice(STASH_POP_ADVICE);
        }
        info!("workflow completed");
        Ok(RunOutcome::Completed)
    }
}
