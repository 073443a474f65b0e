//! `kickoff`: the daily branch workflow, the one-time strategic kickoff
//! wizard, and marking the strategic kickoff complete.

use anyhow::{Context, Result, anyhow};
use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::app::App;
use crate::core::config::{
    AiCollaborationPreferences, AiProactivity, CodeProvisioningStyle, Config, DetailedTaskMode,
    MarkdownDocsStyle, ProactiveDetailLevel,
};
use crate::core::rules::Rules;
use crate::io::config::save;
use crate::io::presenter::Presenter;
use crate::io::prompt::{ProjectInfo, StrategicKickoff, ToolAvailability};
use crate::steps::{
    CheckAndPromptStash, CheckOnMain, CreateAndPushBranch, GenerateStrategicPrompt, PersistConfig,
    PullRebase,
};
use crate::workflow::{RunOutcome, Workflow};

/// Tools the wizard looks for on `PATH`.
const DETECTED_TOOLS: [&str; 8] = [
    "git", "gh", "docker", "terraform", "pulumi", "cargo", "go", "python3",
];

const PROJECT_STAGES: [&str; 4] = ["idea", "prototype", "mvp", "production"];

#[derive(Debug, Clone, Default)]
pub struct KickoffOptions {
    pub branch: Option<String>,
    pub strategic: bool,
    pub mark_strategic_complete: bool,
}

pub fn run(app: &App<'_>, opts: &KickoffOptions) -> Result<()> {
    if opts.mark_strategic_complete {
        return mark_strategic_complete(app);
    }
    if wants_strategic(&app.config, opts) {
        return strategic(app);
    }
    daily(app, opts.branch.as_deref())
}

/// `--strategic` always; otherwise only until the kickoff has been marked
/// complete, and never when a branch was named.
fn wants_strategic(config: &Config, opts: &KickoffOptions) -> bool {
    opts.strategic || (!config.strategic_kickoff_completed() && opts.branch.is_none())
}

fn daily(app: &App<'_>, branch: Option<&str>) -> Result<()> {
    let git = app.open_git()?;
    let name = match branch {
        Some(name) => name.trim().to_string(),
        None => app
            .presenter
            .input("Name for the new branch (e.g. feature/login)", None)?
            .trim()
            .to_string(),
    };
    if name.is_empty() {
        return Err(anyhow!("a branch name is required"));
    }

    let rules = Rules::from_config(&app.config)?;
    if let Err(err) = rules.check_branch(&name) {
        app.presenter.error(&format!("Invalid branch name '{name}'."));
        if let Some(pattern) = rules.branch_pattern() {
            app.presenter.detail(&format!("Expected pattern: {pattern}"));
        }
        return Err(err.into());
    }

    let main = app.main_branch();
    let ctx = app.step_context(&git);
    let outcome = Workflow::new(format!("Daily Kickoff: {name}"))
        .step(CheckOnMain::new(main))
        .step(CheckAndPromptStash::new())
        .step(PullRebase::update_main(main))
        .step(CreateAndPushBranch::new(&name, main))
        .run(&ctx)?;
    if outcome == RunOutcome::Completed {
        app.presenter
            .success(&format!("Ready to work on '{name}'."));
    }
    Ok(())
}

fn strategic(app: &App<'_>) -> Result<()> {
    let git = app.open_git()?;
    let presenter = app.presenter;
    presenter.summary("Strategic Kickoff");
    presenter.info("This wizard records how you like to work with AI assistants and writes a kickoff prompt.");

    presenter.newline();
    presenter.info("Phase 1 of 3: collaboration preferences");
    let preferences = ask_preferences(presenter, &app.config.ai_collaboration_preferences)?;

    presenter.newline();
    presenter.info("Phase 2 of 3: project details");
    let default_name = git
        .work_tree()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = presenter.input("Project name", Some(&default_name))?;
    let description = presenter.input("One-line description", None)?;
    let stack = presenter.input("Primary language or stack", None)?;
    let stage = presenter.select("Current stage", &PROJECT_STAGES, 0)?;
    let project = ProjectInfo {
        name,
        description,
        stack,
        stage: PROJECT_STAGES.get(stage).unwrap_or(&PROJECT_STAGES[0]).to_string(),
    };

    presenter.newline();
    presenter.info("Phase 3 of 3: tooling");
    let mut tools: Vec<ToolAvailability> = DETECTED_TOOLS
        .iter()
        .map(|tool| ToolAvailability {
            name: (*tool).to_string(),
            available: app.exec.command_exists(tool),
        })
        .collect();
    for tool in &tools {
        let found = if tool.available { "found" } else { "not found" };
        presenter.detail(&format!("{}: {found}", tool.name));
    }
    let extra = presenter.input("Other tools you use (comma-separated, optional)", None)?;
    tools.extend(
        extra
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| ToolAvailability {
                name: t.to_string(),
                available: true,
            }),
    );

    let mut config = app.config.clone();
    config.ai_collaboration_preferences = preferences;
    let preferences_yaml = serde_yaml::to_string(&config.ai_collaboration_preferences)
        .context("serialize collaboration preferences")?;
    let input = StrategicKickoff {
        project,
        tools,
        preferences: preferences_yaml,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    };

    let target = app.config_target()?;
    let ctx = app.step_context(&git);
    Workflow::new("Strategic Kickoff Prompt")
        .step(PersistConfig::new(config, target))
        .step(GenerateStrategicPrompt::new(input))
        .run(&ctx)?;
    Ok(())
}

fn ask_preferences(
    presenter: &dyn Presenter,
    current: &AiCollaborationPreferences,
) -> Result<AiCollaborationPreferences> {
    Ok(AiCollaborationPreferences {
        code_provisioning_style: Some(choose(
            presenter,
            "How should the AI hand you code?",
            &[
                (CodeProvisioningStyle::BlockScript, "As a shell script that writes the files"),
                (CodeProvisioningStyle::RawMarkdown, "As raw Markdown code blocks"),
            ],
            current.code_provisioning_style,
        )?),
        markdown_docs_style: Some(choose(
            presenter,
            "How should the AI hand you documentation?",
            &[(MarkdownDocsStyle::RawMarkdown, "As raw Markdown")],
            current.markdown_docs_style,
        )?),
        detailed_task_mode: Some(choose(
            presenter,
            "How should multi-step tasks be run?",
            &[
                (DetailedTaskMode::Guided, "Guided, one step at a time"),
                (DetailedTaskMode::Autonomous, "Autonomously, all at once"),
            ],
            current.detailed_task_mode,
        )?),
        proactive_detail_level: Some(choose(
            presenter,
            "How much detail in explanations?",
            &[
                (ProactiveDetailLevel::Concise, "Concise"),
                (ProactiveDetailLevel::Detailed, "Detailed"),
            ],
            current.proactive_detail_level,
        )?),
        ai_proactivity: Some(choose(
            presenter,
            "Should the AI suggest next steps on its own?",
            &[
                (AiProactivity::Proactive, "Yes, be proactive"),
                (AiProactivity::Reactive, "No, wait to be asked"),
            ],
            current.ai_proactivity,
        )?),
    })
}

fn choose<T: Copy + PartialEq>(
    presenter: &dyn Presenter,
    question: &str,
    options: &[(T, &str)],
    current: Option<T>,
) -> Result<T> {
    let labels: Vec<&str> = options.iter().map(|(_, label)| *label).collect();
    let default = current
        .and_then(|c| options.iter().position(|(value, _)| *value == c))
        .unwrap_or(0);
    let index = presenter.select(question, &labels, default)?;
    options
        .get(index)
        .map(|(value, _)| *value)
        .ok_or_else(|| anyhow!("selection {index} out of range for '{question}'"))
}

fn mark_strategic_complete(app: &App<'_>) -> Result<()> {
    let mut config = app.config.clone();
    let now = Utc::now();
    config.project_state.strategic_kickoff_completed = Some(true);
    config.project_state.last_strategic_kickoff_date = Some(now);
    let target = app.config_target()?;
    save(&config, &target)?;
    info!(path = %target.display(), "strategic kickoff marked complete");
    app.presenter.success(&format!(
        "Strategic kickoff marked complete ({}).",
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategic_mode_selection() {
        let mut config = Config::defaults();
        let none = KickoffOptions::default();
        let named = KickoffOptions {
            branch: Some("feature/a".to_string()),
            ..KickoffOptions::default()
        };
        let forced = KickoffOptions {
            strategic: true,
            ..named.clone()
        };

        assert!(wants_strategic(&config, &none));
        assert!(!wants_strategic(&config, &named));
        assert!(wants_strategic(&config, &forced));

        config.project_state.strategic_kickoff_completed = Some(true);
        assert!(!wants_strategic(&config, &none));
        assert!(wants_strategic(&config, &forced));
    }
}
