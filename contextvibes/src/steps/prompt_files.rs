//! Steps that render AI prompt files into the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::core::config::{
    COMMIT_PROMPT_FILE, PR_PROMPT_FILE, REFACTOR_PROMPT_FILE, REVIEW_PROMPT_FILE,
    STRATEGIC_PROMPT_FILE,
};
use crate::core::rules::Rules;
use crate::io::files::write_atomic;
use crate::io::prompt::{FileBlock, PromptEngine, StrategicKickoff};
use crate::workflow::{Step, StepContext};

fn write_prompt(ctx: &StepContext<'_>, file_name: &str, contents: &str) -> Result<()> {
    let path = ctx.workdir.join(file_name);
    write_atomic(&path, contents.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "prompt written");
    ctx.presenter
        .success(&format!("Prompt written to {}", path.display()));
    Ok(())
}

/// Render the commit-message prompt from the staged diff.
pub struct GenerateCommitPrompt;

impl Step for GenerateCommitPrompt {
    fn description(&self) -> String {
        format!("Generate commit message prompt ({COMMIT_PROMPT_FILE})")
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let branch = ctx.git.current_branch(ctx.cancel)?;
        let diff = ctx.git.staged_diff(ctx.cancel)?;
        let rules = Rules::from_config(ctx.config)?;
        let prompt = PromptEngine::new()?.render_commit(&branch, &diff, rules.commit_pattern())?;
        write_prompt(ctx, COMMIT_PROMPT_FILE, &prompt)?;
        ctx.presenter
            .advice("Paste the prompt into your AI assistant, then run the commit command it suggests.");
        Ok(())
    }
}

/// Render the pull-request description prompt from history since the merge
/// base with main.
pub struct GeneratePrDescriptionPrompt;

impl Step for GeneratePrDescriptionPrompt {
    fn description(&self) -> String {
        format!("Generate pull request description prompt ({PR_PROMPT_FILE})")
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let branch = ctx.git.current_branch(ctx.cancel)?;
        let main = ctx.git.main_branch();
        let base = ctx
            .git
            .merge_base(ctx.cancel, main, "HEAD")
            .with_context(|| format!("find merge base with '{main}'"))?;
        let log = ctx.git.log_since(ctx.cancel, &base)?;
        let diff = ctx.git.diff_since(ctx.cancel, &base)?;
        let prompt = PromptEngine::new()?.render_pr_description(&branch, main, &log, &diff)?;
        write_prompt(ctx, PR_PROMPT_FILE, &prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePromptKind {
    Refactor,
    Review,
}

impl FilePromptKind {
    fn file_name(self) -> &'static str {
        match self {
            Self::Refactor => REFACTOR_PROMPT_FILE,
            Self::Review => REVIEW_PROMPT_FILE,
        }
    }
}

/// Render a refactor or review prompt over the given files.
pub struct GenerateFilePrompt {
    kind: FilePromptKind,
    files: Vec<PathBuf>,
}

impl GenerateFilePrompt {
    pub fn refactor(files: Vec<PathBuf>) -> Self {
        Self {
            kind: FilePromptKind::Refactor,
            files,
        }
    }

    pub fn review(files: Vec<PathBuf>) -> Self {
        Self {
            kind: FilePromptKind::Review,
            files,
        }
    }

    fn resolve(&self, ctx: &StepContext<'_>, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            ctx.workdir.join(file)
        }
    }
}

impl Step for GenerateFilePrompt {
    fn description(&self) -> String {
        let what = match self.kind {
            FilePromptKind::Refactor => "refactor",
            FilePromptKind::Review => "code review",
        };
        format!(
            "Generate {what} prompt for {} file(s) ({})",
            self.files.len(),
            self.kind.file_name()
        )
    }

    fn pre_check(&self, ctx: &StepContext<'_>) -> Result<()> {
        if self.files.is_empty() {
            return Err(anyhow!("at least one file path is required"));
        }
        for file in &self.files {
            if !self.resolve(ctx, file).is_file() {
                return Err(anyhow!("file not found: {}", file.display()));
            }
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let mut blocks = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = self.resolve(ctx, file);
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            blocks.push(FileBlock::new(&file.display().to_string(), &contents));
        }
        let engine = PromptEngine::new()?;
        let prompt = match self.kind {
            FilePromptKind::Refactor => engine.render_refactor(&blocks)?,
            FilePromptKind::Review => engine.render_review(&blocks)?,
        };
        write_prompt(ctx, self.kind.file_name(), &prompt)
    }
}

/// Render the strategic kickoff master prompt from wizard answers.
pub struct GenerateStrategicPrompt {
    input: StrategicKickoff,
}

impl GenerateStrategicPrompt {
    pub fn new(input: StrategicKickoff) -> Self {
        Self { input }
    }
}

impl Step for GenerateStrategicPrompt {
    fn description(&self) -> String {
        format!("Generate strategic kickoff prompt ({STRATEGIC_PROMPT_FILE})")
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let prompt = PromptEngine::new()?.render_strategic_kickoff(&self.input)?;
        write_prompt(ctx, STRATEGIC_PROMPT_FILE, &prompt)?;
        ctx.presenter.advice(
            "Hand the prompt to your AI assistant. When the kickoff is done, run 'contextvibes kickoff --mark-strategic-complete'.",
        );
        Ok(())
    }
}
