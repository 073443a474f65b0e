//! Embedded AI prompt templates rendered with minijinja.

use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

const COMMIT_TEMPLATE: &str = include_str!("prompts/commit.md");
const PR_DESCRIPTION_TEMPLATE: &str = include_str!("prompts/pr_description.md");
const REFACTOR_TEMPLATE: &str = include_str!("prompts/refactor.md");
const REVIEW_TEMPLATE: &str = include_str!("prompts/review.md");
const STRATEGIC_KICKOFF_TEMPLATE: &str = include_str!("prompts/strategic_kickoff.md");
const DESCRIBE_TEMPLATE: &str = include_str!("prompts/describe.md");

/// A file embedded in a prompt as a fenced code block.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileBlock {
    pub path: String,
    pub language: String,
    pub contents: String,
}

impl FileBlock {
    pub fn new(path: &str, contents: &str) -> Self {
        Self {
            path: path.to_string(),
            language: fence_language(path).to_string(),
            contents: contents.trim_end().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub description: String,
    pub stack: String,
    pub stage: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolAvailability {
    pub name: String,
    pub available: bool,
}

/// Everything the strategic kickoff template needs.
#[derive(Debug, Clone, Serialize)]
pub struct StrategicKickoff {
    pub project: ProjectInfo,
    pub tools: Vec<ToolAvailability>,
    /// YAML rendering of the collaboration preferences.
    pub preferences: String,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DescribeInput {
    pub project_name: String,
    pub prompt: Option<String>,
    pub branch: String,
    pub status: String,
    pub files: Vec<String>,
    pub documents: Vec<FileBlock>,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Load every embedded template. Failure here means a template is malformed.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [
            ("commit", COMMIT_TEMPLATE),
            ("pr_description", PR_DESCRIPTION_TEMPLATE),
            ("refactor", REFACTOR_TEMPLATE),
            ("review", REVIEW_TEMPLATE),
            ("strategic_kickoff", STRATEGIC_KICKOFF_TEMPLATE),
            ("describe", DESCRIBE_TEMPLATE),
        ] {
            env.add_template(name, source)
                .with_context(|| format!("embedded template '{name}' is invalid"))?;
        }
        Ok(Self { env })
    }

    pub fn render_commit(&self, branch: &str, diff: &str, subject_pattern: Option<&str>) -> Result<String> {
        self.render(
            "commit",
            context! {
                branch => branch,
                diff => diff.trim_end(),
                subject_pattern => subject_pattern,
            },
        )
    }

    pub fn render_pr_description(
        &self,
        branch: &str,
        main_branch: &str,
        log: &str,
        diff: &str,
    ) -> Result<String> {
        self.render(
            "pr_description",
            context! {
                branch => branch,
                main_branch => main_branch,
                log => log.trim(),
                diff => diff.trim_end(),
            },
        )
    }

    pub fn render_refactor(&self, files: &[FileBlock]) -> Result<String> {
        self.render("refactor", context! { files => files })
    }

    pub fn render_review(&self, files: &[FileBlock]) -> Result<String> {
        self.render("review", context! { files => files })
    }

    pub fn render_strategic_kickoff(&self, input: &StrategicKickoff) -> Result<String> {
        self.render(
            "strategic_kickoff",
            context! {
                project => &input.project,
                tools => &input.tools,
                preferences => input.preferences.trim_end(),
                generated_at => &input.generated_at,
            },
        )
    }

    pub fn render_describe(&self, input: &DescribeInput) -> Result<String> {
        self.render(
            "describe",
            context! {
                project_name => &input.project_name,
                prompt => input.prompt.as_deref().map(str::trim).filter(|s| !s.is_empty()),
                branch => &input.branch,
                status => input.status.trim_end(),
                files => &input.files,
                documents => &input.documents,
            },
        )
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        let mut rendered = template
            .render(ctx)
            .with_context(|| format!("render '{name}' prompt"))?;
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        Ok(rendered)
    }
}

/// Fence info string for a path, by extension.
pub fn fence_language(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match ext {
        "rs" => "rust",
        "go" => "go",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "sh" | "bash" => "bash",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "json" => "json",
        "md" => "markdown",
        "tf" => "hcl",
        "sql" => "sql",
        _ => "",
    }
}
