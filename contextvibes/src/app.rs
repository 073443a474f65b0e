//! The per-invocation application context.
//!
//! Built once at command entry and passed explicitly to every command; there
//! is no process-wide state.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::config::Config;
use crate::io::cancel::CancelToken;
use crate::io::config::config_path;
use crate::io::executor::Executor;
use crate::io::git::{Git, RepoHandle};
use crate::io::presenter::Presenter;
use crate::workflow::StepContext;

pub struct App<'a> {
    pub exec: &'a dyn Executor,
    pub presenter: &'a dyn Presenter,
    pub cancel: CancelToken,
    /// Where the command was invoked; generated files land here.
    pub workdir: PathBuf,
    /// Effective configuration (file merged over defaults).
    pub config: Config,
    /// The file `config` was loaded from, if one exists.
    pub config_path: Option<PathBuf>,
    /// `--yes`, or `behavior.assumeYes` in the configuration.
    pub assume_yes: bool,
}

impl<'a> App<'a> {
    /// Open the repository containing `workdir` with the configured remote
    /// and main branch.
    pub fn open_git(&self) -> Result<Git<'a>> {
        let repo = RepoHandle::open(
            self.exec,
            &self.cancel,
            &self.workdir,
            &self.config.git.default_remote,
            &self.config.git.default_main_branch,
        )?;
        Ok(Git::new(repo, self.exec))
    }

    pub fn step_context<'c>(&'c self, git: &'c Git<'c>) -> StepContext<'c> {
        StepContext {
            git,
            exec: self.exec,
            presenter: self.presenter,
            cancel: &self.cancel,
            config: &self.config,
            assume_yes: self.assume_yes,
            workdir: &self.workdir,
        }
    }

    /// Ask the user, or answer yes in assume-yes mode.
    pub fn confirm(&self, question: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        self.presenter.confirm(question)
    }

    /// Path the configuration is saved to: the loaded file, or the default
    /// location at the repository root.
    pub fn config_target(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => config_path(self.exec, &self.cancel, &self.workdir),
        }
    }

    pub fn main_branch(&self) -> &str {
        &self.config.git.default_main_branch
    }
}
