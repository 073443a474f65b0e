//! The project configuration document (`.contextvibes.yaml`), its defaults,
//! and the field-by-field merge of a loaded document over those defaults.
//!
//! Every field is optional in the file. Strings use "empty" as absent,
//! tri-state flags and collections use `Option` so an explicit `false` or an
//! explicit empty list can be told apart from "not written".

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::rules::{RuleError, Rules};

pub const CONFIG_FILE_NAME: &str = ".contextvibes.yaml";

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_MAIN_BRANCH: &str = "main";
pub const DEFAULT_COMMIT_PATTERN: &str = r"^(BREAKING|feat|fix|docs|style|refactor|perf|test|chore|build|ci|revert)(\([\w.\-]+\))?!?:\s.+";
pub const DEFAULT_BRANCH_PATTERN: &str = r"^((feature|fix|docs|format)/.+)$";
pub const DEFAULT_LOG_FILE: &str = "contextvibes_ai_trace.log";

/// Well-known output file names.
pub const COMMIT_PROMPT_FILE: &str = "context_commit.md";
pub const PR_PROMPT_FILE: &str = "context_pr.md";
pub const REFACTOR_PROMPT_FILE: &str = "context_refactor.md";
pub const REVIEW_PROMPT_FILE: &str = "context_review.md";
pub const STRATEGIC_PROMPT_FILE: &str = "STRATEGIC_KICKOFF_PROTOCOL_FOR_AI.md";
pub const DESCRIBE_FILE: &str = "contextvibes.md";

/// Every file this tool generates, in the order `init` lists them in `.gitignore`.
pub const GENERATED_FILES: [&str; 6] = [
    COMMIT_PROMPT_FILE,
    PR_PROMPT_FILE,
    REFACTOR_PROMPT_FILE,
    REVIEW_PROMPT_FILE,
    STRATEGIC_PROMPT_FILE,
    DESCRIBE_FILE,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub git: GitSettings,
    pub validation: ValidationSettings,
    pub logging: LoggingSettings,
    pub project_state: ProjectState,
    pub ai_collaboration_preferences: AiCollaborationPreferences,
    pub describe: ExcludeSettings,
    pub export: ExcludeSettings,
    pub feedback: FeedbackSettings,
    pub behavior: BehaviorSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GitSettings {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_remote: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_main_branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationSettings {
    pub branch_name: ValidationRule,
    pub commit_message: ValidationRule,
}

/// A pattern rule. `enable: None` means enabled; only `Some(false)` disables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pattern: String,
}

impl ValidationRule {
    pub fn is_enabled(&self) -> bool {
        self.enable != Some(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(rename = "defaultAILogFile", skip_serializing_if = "String::is_empty")]
    pub default_ai_log_file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategic_kickoff_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_strategic_kickoff_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiCollaborationPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_provisioning_style: Option<CodeProvisioningStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_docs_style: Option<MarkdownDocsStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_task_mode: Option<DetailedTaskMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proactive_detail_level: Option<ProactiveDetailLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_proactivity: Option<AiProactivity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeProvisioningStyle {
    BlockScript,
    RawMarkdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkdownDocsStyle {
    RawMarkdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailedTaskMode {
    Guided,
    Autonomous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProactiveDetailLevel {
    Concise,
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiProactivity {
    Proactive,
    Reactive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExcludeSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedbackSettings {
    /// Short name → `owner/repo` for `contextvibes feedback --repo <name>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repositories: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BehaviorSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assume_yes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_pull_request_in_browser: Option<bool>,
}

impl Config {
    /// The canonical defaults record.
    pub fn defaults() -> Self {
        Self {
            git: GitSettings {
                default_remote: DEFAULT_REMOTE.to_string(),
                default_main_branch: DEFAULT_MAIN_BRANCH.to_string(),
            },
            validation: ValidationSettings {
                branch_name: ValidationRule {
                    enable: Some(true),
                    pattern: DEFAULT_BRANCH_PATTERN.to_string(),
                },
                commit_message: ValidationRule {
                    enable: Some(true),
                    pattern: DEFAULT_COMMIT_PATTERN.to_string(),
                },
            },
            logging: LoggingSettings {
                enable: Some(false),
                default_ai_log_file: DEFAULT_LOG_FILE.to_string(),
            },
            project_state: ProjectState {
                strategic_kickoff_completed: Some(false),
                last_strategic_kickoff_date: None,
            },
            ai_collaboration_preferences: AiCollaborationPreferences {
                code_provisioning_style: Some(CodeProvisioningStyle::BlockScript),
                markdown_docs_style: Some(MarkdownDocsStyle::RawMarkdown),
                detailed_task_mode: Some(DetailedTaskMode::Guided),
                proactive_detail_level: Some(ProactiveDetailLevel::Concise),
                ai_proactivity: Some(AiProactivity::Proactive),
            },
            describe: ExcludeSettings {
                exclude_patterns: Some(default_describe_excludes()),
            },
            export: ExcludeSettings {
                exclude_patterns: Some(default_describe_excludes()),
            },
            feedback: FeedbackSettings {
                repositories: Some(BTreeMap::from([(
                    "contextvibes".to_string(),
                    "contextvibes/cli".to_string(),
                )])),
            },
            behavior: BehaviorSettings {
                assume_yes: Some(false),
                open_pull_request_in_browser: Some(true),
            },
        }
    }

    pub fn strategic_kickoff_completed(&self) -> bool {
        self.project_state.strategic_kickoff_completed == Some(true)
    }

    pub fn assume_yes(&self) -> bool {
        self.behavior.assume_yes == Some(true)
    }

    pub fn open_pull_request_in_browser(&self) -> bool {
        self.behavior.open_pull_request_in_browser != Some(false)
    }

    /// Reject enabled rules whose pattern does not compile.
    pub fn validate(&self) -> Result<(), RuleError> {
        Rules::from_config(self).map(|_| ())
    }

    /// Log file path when file logging is switched on.
    pub fn log_file(&self) -> Option<&str> {
        if self.logging.enable == Some(true) && !self.logging.default_ai_log_file.is_empty() {
            return Some(&self.logging.default_ai_log_file);
        }
        None
    }
}

fn default_describe_excludes() -> Vec<String> {
    let mut patterns: Vec<String> = GENERATED_FILES
        .iter()
        .map(|name| format!("^{}$", regex::escape(name)))
        .collect();
    patterns.extend(
        [r"(^|/)Cargo\.lock$", r"(^|/)go\.sum$", r"(^|/)package-lock\.json$", r"\.(png|jpe?g|gif|ico|pdf)$"]
            .iter()
            .map(|p| (*p).to_string()),
    );
    patterns
}

/// Overlay `loaded` on `defaults`, field by field.
///
/// Non-empty strings and `Some` values from the loaded document win.
/// Collections are replaced wholesale. A rule disabled by the merge result
/// has its pattern cleared.
pub fn merge(loaded: Option<&Config>, defaults: &Config) -> Config {
    let mut out = defaults.clone();
    if let Some(loaded) = loaded {
        overlay_str(&mut out.git.default_remote, &loaded.git.default_remote);
        overlay_str(
            &mut out.git.default_main_branch,
            &loaded.git.default_main_branch,
        );

        overlay_rule(
            &mut out.validation.branch_name,
            &loaded.validation.branch_name,
        );
        overlay_rule(
            &mut out.validation.commit_message,
            &loaded.validation.commit_message,
        );

        overlay(&mut out.logging.enable, &loaded.logging.enable);
        overlay_str(
            &mut out.logging.default_ai_log_file,
            &loaded.logging.default_ai_log_file,
        );

        overlay(
            &mut out.project_state.strategic_kickoff_completed,
            &loaded.project_state.strategic_kickoff_completed,
        );
        overlay(
            &mut out.project_state.last_strategic_kickoff_date,
            &loaded.project_state.last_strategic_kickoff_date,
        );

        let prefs = &loaded.ai_collaboration_preferences;
        let merged = &mut out.ai_collaboration_preferences;
        overlay(
            &mut merged.code_provisioning_style,
            &prefs.code_provisioning_style,
        );
        overlay(&mut merged.markdown_docs_style, &prefs.markdown_docs_style);
        overlay(&mut merged.detailed_task_mode, &prefs.detailed_task_mode);
        overlay(
            &mut merged.proactive_detail_level,
            &prefs.proactive_detail_level,
        );
        overlay(&mut merged.ai_proactivity, &prefs.ai_proactivity);

        overlay(
            &mut out.describe.exclude_patterns,
            &loaded.describe.exclude_patterns,
        );
        overlay(
            &mut out.export.exclude_patterns,
            &loaded.export.exclude_patterns,
        );
        overlay(
            &mut out.feedback.repositories,
            &loaded.feedback.repositories,
        );

        overlay(&mut out.behavior.assume_yes, &loaded.behavior.assume_yes);
        overlay(
            &mut out.behavior.open_pull_request_in_browser,
            &loaded.behavior.open_pull_request_in_browser,
        );
    }

    clear_if_disabled(&mut out.validation.branch_name);
    clear_if_disabled(&mut out.validation.commit_message);
    out
}

fn overlay_str(target: &mut String, loaded: &str) {
    if !loaded.is_empty() {
        *target = loaded.to_string();
    }
}

fn overlay<T: Clone>(target: &mut Option<T>, loaded: &Option<T>) {
    if loaded.is_some() {
        target.clone_from(loaded);
    }
}

fn overlay_rule(target: &mut ValidationRule, loaded: &ValidationRule) {
    overlay(&mut target.enable, &loaded.enable);
    overlay_str(&mut target.pattern, &loaded.pattern);
}

fn clear_if_disabled(rule: &mut ValidationRule) {
    if !rule.is_enabled() {
        rule.pattern.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_total() {
        let d = Config::defaults();
        assert!(!d.git.default_remote.is_empty());
        assert!(!d.git.default_main_branch.is_empty());
        for rule in [&d.validation.branch_name, &d.validation.commit_message] {
            assert_eq!(rule.enable, Some(true));
            assert!(!rule.pattern.is_empty());
        }
        assert!(d.logging.enable.is_some());
        assert!(!d.logging.default_ai_log_file.is_empty());
        assert_eq!(d.project_state.strategic_kickoff_completed, Some(false));
        let prefs = &d.ai_collaboration_preferences;
        assert!(prefs.code_provisioning_style.is_some());
        assert!(prefs.markdown_docs_style.is_some());
        assert!(prefs.detailed_task_mode.is_some());
        assert!(prefs.proactive_detail_level.is_some());
        assert!(prefs.ai_proactivity.is_some());
        assert!(d.describe.exclude_patterns.is_some());
        assert!(d.export.exclude_patterns.is_some());
        assert!(d.feedback.repositories.is_some());
        assert!(d.behavior.assume_yes.is_some());
        assert!(d.behavior.open_pull_request_in_browser.is_some());
    }

    #[test]
    fn merging_nothing_yields_defaults() {
        assert_eq!(merge(None, &Config::defaults()), Config::defaults());
        assert_eq!(
            merge(Some(&Config::default()), &Config::defaults()),
            Config::defaults()
        );
    }

    #[test]
    fn loaded_scalars_win() {
        let mut loaded = Config::default();
        loaded.git.default_remote = "upstream".to_string();
        loaded.git.default_main_branch = "trunk".to_string();
        loaded.validation.commit_message.pattern = "^JIRA-\\d+ .+".to_string();
        loaded.ai_collaboration_preferences.ai_proactivity = Some(AiProactivity::Reactive);
        loaded.ai_collaboration_preferences.detailed_task_mode = Some(DetailedTaskMode::Autonomous);

        let merged = merge(Some(&loaded), &Config::defaults());
        assert_eq!(merged.git.default_remote, "upstream");
        assert_eq!(merged.git.default_main_branch, "trunk");
        assert_eq!(merged.validation.commit_message.pattern, "^JIRA-\\d+ .+");
        assert_eq!(merged.validation.commit_message.enable, Some(true));
        assert_eq!(
            merged.ai_collaboration_preferences.ai_proactivity,
            Some(AiProactivity::Reactive)
        );
        assert_eq!(
            merged.ai_collaboration_preferences.detailed_task_mode,
            Some(DetailedTaskMode::Autonomous)
        );
        // Untouched preferences keep their defaults.
        assert_eq!(
            merged.ai_collaboration_preferences.code_provisioning_style,
            Some(CodeProvisioningStyle::BlockScript)
        );
    }

    #[test]
    fn collections_replace_wholesale() {
        let mut loaded = Config::default();
        loaded.describe.exclude_patterns = Some(Vec::new());
        loaded.feedback.repositories =
            Some(BTreeMap::from([("team".to_string(), "acme/tools".to_string())]));

        let merged = merge(Some(&loaded), &Config::defaults());
        assert_eq!(merged.describe.exclude_patterns, Some(Vec::new()));
        assert_eq!(
            merged.export.exclude_patterns,
            Config::defaults().export.exclude_patterns
        );
        let repos = merged.feedback.repositories.expect("repositories");
        assert_eq!(repos.len(), 1);
        assert_eq!(repos["team"], "acme/tools");
    }

    #[test]
    fn unset_enable_keeps_default_true() {
        let mut loaded = Config::default();
        loaded.validation.branch_name.pattern = "^topic/.+$".to_string();
        let merged = merge(Some(&loaded), &Config::defaults());
        assert!(merged.validation.branch_name.is_enabled());
        assert_eq!(merged.validation.branch_name.pattern, "^topic/.+$");
    }

    #[test]
    fn disabling_clears_pattern() {
        let mut loaded = Config::default();
        loaded.validation.commit_message = ValidationRule {
            enable: Some(false),
            pattern: "^anything$".to_string(),
        };
        loaded.validation.branch_name.enable = Some(false);

        let merged = merge(Some(&loaded), &Config::defaults());
        assert_eq!(merged.validation.commit_message.enable, Some(false));
        assert!(merged.validation.commit_message.pattern.is_empty());
        assert!(merged.validation.branch_name.pattern.is_empty());
    }

    #[test]
    fn yaml_uses_camel_case_keys() {
        let yaml = "git:\n  defaultMainBranch: develop\nvalidation:\n  commitMessage:\n    enable: false\naiCollaborationPreferences:\n  codeProvisioningStyle: raw_markdown\nlogging:\n  defaultAILogFile: trace.log\nunknownKey: 1\n";
        let loaded: Config = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(loaded.git.default_main_branch, "develop");
        assert_eq!(loaded.validation.commit_message.enable, Some(false));
        assert_eq!(loaded.logging.default_ai_log_file, "trace.log");
        assert_eq!(
            loaded.ai_collaboration_preferences.code_provisioning_style,
            Some(CodeProvisioningStyle::RawMarkdown)
        );
    }

    #[test]
    fn log_file_requires_explicit_enable() {
        let mut cfg = Config::defaults();
        assert_eq!(cfg.log_file(), None);
        cfg.logging.enable = Some(true);
        assert_eq!(cfg.log_file(), Some(DEFAULT_LOG_FILE));
    }
}
