//! `quality`: run the project's formatters and linters and report one
//! result record per check.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::app::App;
use crate::core::check::{CheckResult, CheckStatus, any_failed};
use crate::io::executor::ExecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Rust,
    Go,
    Python,
}

impl ProjectKind {
    fn label(self) -> &'static str {
        match self {
            Self::Rust => "Rust",
            Self::Go => "Go",
            Self::Python => "Python",
        }
    }
}

/// One external check. `fail_on_output` marks tools that exit zero but list
/// offending files on stdout.
#[derive(Debug, Clone, Copy)]
struct Check {
    name: &'static str,
    program: &'static str,
    args: &'static [&'static str],
    fail_on_output: bool,
    advice: &'static str,
}

const RUST_CHECKS: &[Check] = &[
    Check {
        name: "cargo fmt",
        program: "cargo",
        args: &["fmt", "--all", "--", "--check"],
        fail_on_output: false,
        advice: "Run 'cargo fmt --all' to format the code.",
    },
    Check {
        name: "cargo clippy",
        program: "cargo",
        args: &["clippy", "--all-targets", "--", "-D", "warnings"],
        fail_on_output: false,
        advice: "Fix the reported lints, then run the check again.",
    },
];

const GO_CHECKS: &[Check] = &[
    Check {
        name: "gofmt",
        program: "gofmt",
        args: &["-l", "."],
        fail_on_output: true,
        advice: "Run 'gofmt -w .' to format the listed files.",
    },
    Check {
        name: "go vet",
        program: "go",
        args: &["vet", "./..."],
        fail_on_output: false,
        advice: "Fix the issues reported by 'go vet'.",
    },
    Check {
        name: "govulncheck",
        program: "govulncheck",
        args: &["./..."],
        fail_on_output: false,
        advice: "Upgrade the affected modules listed above.",
    },
];

const PYTHON_CHECKS: &[Check] = &[
    Check {
        name: "ruff",
        program: "ruff",
        args: &["check", "."],
        fail_on_output: false,
        advice: "Run 'ruff check --fix .' for the auto-fixable findings.",
    },
    Check {
        name: "black",
        program: "black",
        args: &["--check", "."],
        fail_on_output: false,
        advice: "Run 'black .' to format the code.",
    },
];

/// Marker files in priority order.
pub fn detect_project(root: &Path) -> Option<ProjectKind> {
    [
        ("Cargo.toml", ProjectKind::Rust),
        ("go.mod", ProjectKind::Go),
        ("pyproject.toml", ProjectKind::Python),
    ]
    .into_iter()
    .find(|(marker, _)| root.join(marker).is_file())
    .map(|(_, kind)| kind)
}

fn checks_for(kind: ProjectKind) -> &'static [Check] {
    match kind {
        ProjectKind::Rust => RUST_CHECKS,
        ProjectKind::Go => GO_CHECKS,
        ProjectKind::Python => PYTHON_CHECKS,
    }
}

pub fn run(app: &App<'_>, json: bool) -> Result<()> {
    let git = app.open_git()?;
    let root = git.work_tree();
    let Some(kind) = detect_project(root) else {
        app.presenter.warning("No supported project type detected.");
        app.presenter
            .advice("Quality checks run for projects with Cargo.toml, go.mod, or pyproject.toml.");
        return Ok(());
    };
    info!(project = kind.label(), "running quality checks");

    let mut results = Vec::new();
    for check in checks_for(kind) {
        results.push(run_check(app, root, check)?);
    }

    if json {
        let payload = serde_json::to_string_pretty(&results).context("serialize check results")?;
        println!("{payload}");
    } else {
        report(app, kind, &results);
    }

    if any_failed(&results) {
        return Err(anyhow!("quality checks failed"));
    }
    Ok(())
}

fn run_check(app: &App<'_>, root: &Path, check: &Check) -> Result<CheckResult> {
    if !app.exec.command_exists(check.program) {
        return Ok(
            CheckResult::warn(check.name, format!("'{}' not found on PATH", check.program))
                .with_advice(format!("Install {} to enable this check.", check.program)),
        );
    }
    debug!(check = check.name, "running check");
    match app
        .exec
        .capture_output(&app.cancel, root, check.program, check.args)
    {
        Ok(out) if check.fail_on_output && !out.stdout.trim().is_empty() => {
            Ok(CheckResult::fail(check.name, "reported files needing changes")
                .with_details(&out.stdout)
                .with_advice(check.advice))
        }
        Ok(_) => Ok(CheckResult::pass(check.name, "passed")),
        Err(err @ ExecError::Canceled { .. }) => Err(err.into()),
        Err(err) => {
            let output = match &err {
                ExecError::Exit { stdout, stderr, .. } => format!("{stdout}\n{stderr}"),
                _ => String::new(),
            };
            Ok(CheckResult::fail(check.name, "failed")
                .with_error(err.to_string())
                .with_details(&output)
                .with_advice(check.advice))
        }
    }
}

fn report(app: &App<'_>, kind: ProjectKind, results: &[CheckResult]) {
    let presenter = app.presenter;
    presenter.summary(&format!("Quality Checks ({})", kind.label()));
    for result in results {
        let line = format!("{}: {}", result.name, result.message);
        match result.status {
            CheckStatus::Pass => presenter.success(&line),
            CheckStatus::Warn => presenter.warning(&line),
            CheckStatus::Fail => presenter.error(&line),
        }
        if let Some(details) = &result.details {
            for detail in details.lines() {
                presenter.detail(detail);
            }
        }
        if let Some(advice) = &result.advice {
            presenter.advice(advice);
        }
    }
}
