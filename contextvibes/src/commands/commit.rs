use anyhow::{Result, anyhow};
use tracing::info;

use crate::app::App;
use crate::core::rules::{Rules, compose_commit_message, subject_line};
use crate::steps::{EnsureNotMain, EnsureStaged, GenerateCommitPrompt};
use crate::workflow::Workflow;

#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// First entry is the subject, the rest are body paragraphs.
    pub messages: Vec<String>,
    /// Generate an AI commit prompt instead of committing.
    pub ai: bool,
}

pub fn run(app: &App<'_>, opts: &CommitOptions) -> Result<()> {
    let git = app.open_git()?;
    let presenter = app.presenter;

    if opts.ai {
        let ctx = app.step_context(&git);
        Workflow::new("Generate AI Commit Prompt")
            .step(EnsureNotMain::new(
                app.main_branch(),
                "refusing to prepare a commit on the main branch",
            ))
            .step(EnsureStaged)
            .step(GenerateCommitPrompt)
            .without_confirmation()
            .run(&ctx)?;
        return Ok(());
    }

    let Some((subject, bodies)) = opts.messages.split_first() else {
        presenter.error("A commit message is required.");
        presenter.advice("Use -m \"<subject>\" (repeat -m for body paragraphs), or --ai to generate a prompt.");
        return Err(anyhow!("commit message is required"));
    };
    if subject.trim().is_empty() {
        return Err(anyhow!("commit subject cannot be empty"));
    }
    let message = compose_commit_message(subject, bodies);
    let subject = subject_line(&message);

    let rules = Rules::from_config(&app.config)?;
    if let Err(err) = rules.check_subject(subject) {
        presenter.error("Invalid commit subject format.");
        if let Some(pattern) = rules.commit_pattern() {
            presenter.detail(&format!("Expected pattern: {pattern}"));
        }
        presenter.advice("Example: contextvibes commit -m \"feat(auth): add login endpoint\"");
        return Err(err.into());
    }

    git.add_all(&app.cancel)?;
    if !git.has_staged_changes(&app.cancel)? {
        presenter.info("No changes staged for commit.");
        return Ok(());
    }

    let branch = git.current_branch(&app.cancel)?;
    let status = git.short_status(&app.cancel)?;
    presenter.summary("Commit Preview");
    presenter.detail(&format!("Branch:  {branch}"));
    presenter.detail(&format!("Subject: {subject}"));
    for line in status.lines().filter(|l| !l.trim().is_empty()) {
        presenter.detail(line);
    }
    presenter.newline();

    if !app.confirm("Create this commit?")? {
        presenter.info("Commit aborted by user.");
        return Ok(());
    }
    git.commit(&app.cancel, &message)?;
    info!(branch = %branch, "commit created");
    presenter.success(&format!("Committed on '{branch}'."));
    Ok(())
}
