//! `contextvibes`: standardized Git workflows and AI prompt generation.
//!
//! Parses the command line, loads the effective configuration, installs
//! logging and the Ctrl-C handler, then dispatches to one command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contextvibes::app::App;
use contextvibes::commands::{
    commit, describe, diff, feedback, finish, init, kickoff, quality, review, status, sync, tidy,
};
use contextvibes::core::config::Config;
use contextvibes::core::rules::RuleError;
use contextvibes::exit_codes;
use contextvibes::io::cancel::CancelToken;
use contextvibes::io::config::{ConfigError, load_effective};
use contextvibes::io::executor::{ExecError, OsExecutor};
use contextvibes::io::presenter::{Presenter, TermPresenter};
use contextvibes::logging;

#[derive(Parser)]
#[command(
    name = "contextvibes",
    version,
    about = "Standardized Git workflows and AI prompt generation"
)]
struct Cli {
    /// Assume "yes" at every confirmation prompt.
    #[arg(short, long, global = true, env = "CONTEXTVIBES_ASSUME_YES")]
    yes: bool,

    /// Append debug-level traces to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the message, stage all changes, confirm, and commit.
    Commit {
        /// Subject, then body paragraphs (repeatable).
        #[arg(short = 'm', long = "message", value_name = "TEXT")]
        messages: Vec<String>,
        /// Write an AI commit-message prompt instead of committing.
        #[arg(long)]
        ai: bool,
    },
    /// Show the short working-tree status.
    Status,
    /// Write a Markdown summary of staged, unstaged, and untracked changes.
    Diff,
    /// Require a clean tree, pull with rebase, and push if ahead.
    Sync,
    /// Start a branch for the day, or run the strategic kickoff wizard.
    Kickoff {
        /// Name of the branch to create.
        #[arg(short, long)]
        branch: Option<String>,
        /// Run the strategic kickoff wizard.
        #[arg(long, conflicts_with = "branch")]
        strategic: bool,
        /// Record that the strategic kickoff has been done.
        #[arg(long, conflicts_with_all = ["branch", "strategic"])]
        mark_strategic_complete: bool,
    },
    /// Push the current branch and offer to open a pull request.
    Finish {
        /// Write an AI pull-request description prompt instead.
        #[arg(long)]
        ai: bool,
    },
    /// Switch to main, update it, and delete the finished branch.
    Tidy,
    /// Write a defaults-populated .contextvibes.yaml.
    Init {
        /// Replace an existing configuration file.
        #[arg(short, long)]
        force: bool,
    },
    /// Write a project snapshot for an AI session.
    Describe {
        /// What you want to work on.
        #[arg(short, long)]
        prompt: Option<String>,
        /// Output file (default: contextvibes.md).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Write a code-review prompt for the given files.
    Review {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Write a refactoring prompt for the given files.
    Refactor {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Run the project's formatters and linters.
    Quality {
        /// Print the results as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Open a GitHub issue with feedback.
    Feedback {
        title: String,
        #[arg(long)]
        body: Option<String>,
        /// Key from `feedback.repositories` (default: contextvibes).
        #[arg(long)]
        repo: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let cancel = CancelToken::new();
    let presenter = TermPresenter;

    // A child being waited on is killed by the executor once the token trips;
    // anywhere else (prompts included) the process ends here.
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        handler_token.cancel();
        if !handler_token.has_running_child() {
            eprintln!("\nCanceled.");
            std::process::exit(exit_codes::CANCELED);
        }
    }) {
        eprintln!("warning: could not install Ctrl-C handler: {err}");
    }

    let code = match run(cli, &cancel, &presenter) {
        Ok(()) if cancel.is_canceled() => {
            eprintln!("Canceled.");
            exit_codes::CANCELED
        }
        Ok(()) => exit_codes::OK,
        Err(err) if is_canceled(&err, &cancel) => {
            eprintln!("Canceled.");
            exit_codes::CANCELED
        }
        Err(err) => {
            if let Some(advice) = environment_advice(&err) {
                presenter.advice(advice);
            }
            eprintln!("error: {err:#}");
            exit_codes::FAILURE
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli, cancel: &CancelToken, presenter: &dyn Presenter) -> Result<()> {
    let exec = OsExecutor;
    let workdir = std::env::current_dir().context("resolve current directory")?;
    let (config, config_path) = match load_effective(&exec, cancel, &workdir) {
        Ok(loaded) => loaded,
        Err(err)
            if matches!(cli.command, Command::Init { force: true }) && is_unusable_config(&err) =>
        {
            presenter.warning(&format!("Replacing unusable configuration: {err:#}"));
            (Config::defaults(), None)
        }
        Err(err) => return Err(err),
    };

    let log_file = cli.log_file.clone().or_else(|| {
        let configured = config.log_file()?;
        let base = config_path
            .as_deref()
            .and_then(|p| p.parent())
            .unwrap_or(workdir.as_path());
        Some(base.join(configured))
    });
    logging::init(log_file.as_deref())?;

    let app = App {
        exec: &exec,
        presenter,
        cancel: cancel.clone(),
        workdir,
        assume_yes: cli.yes || config.assume_yes(),
        config,
        config_path,
    };
    dispatch(&app, cli.command)
}

fn dispatch(app: &App<'_>, command: Command) -> Result<()> {
    match command {
        Command::Commit { messages, ai } => commit::run(app, &commit::CommitOptions { messages, ai }),
        Command::Status => status::run(app),
        Command::Diff => diff::run(app),
        Command::Sync => sync::run(app),
        Command::Kickoff {
            branch,
            strategic,
            mark_strategic_complete,
        } => kickoff::run(
            app,
            &kickoff::KickoffOptions {
                branch,
                strategic,
                mark_strategic_complete,
            },
        ),
        Command::Finish { ai } => finish::run(app, finish::FinishOptions { ai }),
        Command::Tidy => tidy::run(app),
        Command::Init { force } => init::run(app, init::InitOptions { force }),
        Command::Describe { prompt, output } => {
            describe::run(app, &describe::DescribeOptions { prompt, output })
        }
        Command::Review { files } => review::review(app, files),
        Command::Refactor { files } => review::refactor(app, files),
        Command::Quality { json } => quality::run(app, json),
        Command::Feedback { title, body, repo } => {
            feedback::run(app, &feedback::FeedbackOptions { title, body, repo })
        }
    }
}

/// Advice for errors that come from the environment rather than the command.
fn environment_advice(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<ConfigError>()? {
        ConfigError::GitNotFound => Some("Install Git and make sure 'git' is on your PATH."),
        ConfigError::NotInRepository { .. } => {
            Some("Run contextvibes from inside a Git working tree.")
        }
        ConfigError::Empty { .. } | ConfigError::Parse { .. } => {
            Some("Fix the file, or run 'contextvibes init --force' to rewrite it with the defaults.")
        }
    }
}

/// A configuration file `init --force` may overwrite: empty, malformed, or
/// carrying a pattern that does not compile.
fn is_unusable_config(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Empty { .. } | ConfigError::Parse { .. })
    ) || err.downcast_ref::<RuleError>().is_some()
}

fn is_canceled(err: &anyhow::Error, cancel: &CancelToken) -> bool {
    cancel.is_canceled()
        || err
            .chain()
            .any(|cause| matches!(cause.downcast_ref::<ExecError>(), Some(ExecError::Canceled { .. })))
}
