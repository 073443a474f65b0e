//! Steps that write the describe file (`contextvibes.md`).

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::io::files::write_atomic;
use crate::io::prompt::{DescribeInput, FileBlock, PromptEngine};
use crate::workflow::{Step, StepContext};

/// Project files embedded in the describe output when present.
const KEY_FILES: [&str; 6] = [
    "README.md",
    "Cargo.toml",
    "go.mod",
    "package.json",
    "pyproject.toml",
    ".contextvibes.yaml",
];

/// Largest key file embedded verbatim.
const KEY_FILE_MAX_BYTES: u64 = 64 * 1024;

/// Markdown summary of staged, unstaged, and untracked changes.
pub struct WriteDiffSummary {
    output: PathBuf,
}

impl WriteDiffSummary {
    pub fn new(output: PathBuf) -> Self {
        Self { output }
    }
}

impl Step for WriteDiffSummary {
    fn description(&self) -> String {
        format!("Write change summary to {}", self.output.display())
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let staged = ctx.git.staged_diff(ctx.cancel)?;
        let unstaged = ctx.git.unstaged_diff(ctx.cancel)?;
        let untracked = ctx.git.untracked_files(ctx.cancel)?;

        let markdown = render_diff_summary(&staged, &unstaged, &untracked);
        write_atomic(&self.output, markdown.as_bytes())
            .with_context(|| format!("write {}", self.output.display()))?;
        if staged.trim().is_empty() && unstaged.trim().is_empty() && untracked.is_empty() {
            ctx.presenter.info("No changes found.");
        }
        ctx.presenter
            .success(&format!("Change summary written to {}", self.output.display()));
        Ok(())
    }
}

fn render_diff_summary(staged: &str, unstaged: &str, untracked: &[String]) -> String {
    let mut out = String::from("# Git Change Summary\n");
    for (title, diff) in [
        ("Staged Changes", staged),
        ("Unstaged Changes (vs HEAD)", unstaged),
    ] {
        let _ = write!(out, "\n## {title}\n\n");
        if diff.trim().is_empty() {
            out.push_str("(none)\n");
        } else {
            let _ = write!(out, "```diff\n{}\n```\n", diff.trim_end());
        }
    }
    out.push_str("\n## Untracked Files\n\n");
    if untracked.is_empty() {
        out.push_str("(none)\n");
    } else {
        for file in untracked {
            let _ = writeln!(out, "- `{file}`");
        }
    }
    out
}

/// Project snapshot for an AI session: prompt, branch, status, file list,
/// and key project files.
pub struct GenerateDescribeFile {
    prompt: Option<String>,
    output: PathBuf,
}

impl GenerateDescribeFile {
    pub fn new(prompt: Option<String>, output: PathBuf) -> Self {
        Self { prompt, output }
    }
}

impl Step for GenerateDescribeFile {
    fn description(&self) -> String {
        format!("Write project description to {}", self.output.display())
    }

    fn pre_check(&self, ctx: &StepContext<'_>) -> Result<()> {
        compile_excludes(ctx.config.describe.exclude_patterns.as_deref())?;
        Ok(())
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let excludes = compile_excludes(ctx.config.describe.exclude_patterns.as_deref())?;
        let branch = ctx.git.current_branch(ctx.cancel)?;
        let status = ctx.git.short_status(ctx.cancel)?;
        let files: Vec<String> = ctx
            .git
            .tracked_files(ctx.cancel)?
            .into_iter()
            .filter(|file| !excludes.iter().any(|re| re.is_match(file)))
            .collect();

        let root = ctx.git.work_tree();
        let mut documents = Vec::new();
        for name in KEY_FILES {
            let path = root.join(name);
            let Ok(meta) = fs::metadata(&path) else {
                continue;
            };
            if !meta.is_file() || meta.len() > KEY_FILE_MAX_BYTES {
                debug!(file = name, "skipping key file");
                continue;
            }
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            documents.push(FileBlock::new(name, &contents));
        }

        let project_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        let input = DescribeInput {
            project_name,
            prompt: self.prompt.clone(),
            branch,
            status,
            files,
            documents,
        };
        let rendered = PromptEngine::new()?.render_describe(&input)?;
        write_atomic(&self.output, rendered.as_bytes())
            .with_context(|| format!("write {}", self.output.display()))?;
        ctx.presenter
            .success(&format!("Project description written to {}", self.output.display()));
        Ok(())
    }
}

fn compile_excludes(patterns: Option<&[String]>) -> Result<Vec<Regex>> {
    patterns
        .unwrap_or_default()
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid describe exclude pattern '{p}'")))
        .collect()
}
