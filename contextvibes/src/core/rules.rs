//! Commit-message composition and branch/subject pattern rules.

use regex::Regex;
use thiserror::Error;

use crate::core::config::{Config, DEFAULT_BRANCH_PATTERN, DEFAULT_COMMIT_PATTERN, ValidationRule};

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid {rule} pattern '{pattern}': {source}")]
    InvalidPattern {
        rule: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid commit subject format. Subject '{subject}' does not match pattern: {pattern}")]
    SubjectMismatch { subject: String, pattern: String },

    #[error("Invalid branch name '{name}'. Branch names must match pattern: {pattern}")]
    BranchMismatch { name: String, pattern: String },
}

/// Subject, then each non-blank body paragraph, separated by a blank line.
pub fn compose_commit_message(subject: &str, bodies: &[String]) -> String {
    let mut message = subject.trim().to_string();
    for body in bodies.iter().map(|b| b.trim()).filter(|b| !b.is_empty()) {
        message.push_str("\n\n");
        message.push_str(body);
    }
    message
}

/// Text before the first newline.
pub fn subject_line(message: &str) -> &str {
    message.split('\n').next().unwrap_or_default().trim_end_matches('\r')
}

/// Compiled validation rules. A disabled rule compiles to `None`.
#[derive(Debug, Clone)]
pub struct Rules {
    branch: Option<Regex>,
    commit: Option<Regex>,
}

impl Rules {
    pub fn from_config(config: &Config) -> Result<Self, RuleError> {
        Ok(Self {
            branch: compile(
                "branch name",
                &config.validation.branch_name,
                DEFAULT_BRANCH_PATTERN,
            )?,
            commit: compile(
                "commit message",
                &config.validation.commit_message,
                DEFAULT_COMMIT_PATTERN,
            )?,
        })
    }

    pub fn branch_pattern(&self) -> Option<&str> {
        self.branch.as_ref().map(Regex::as_str)
    }

    pub fn commit_pattern(&self) -> Option<&str> {
        self.commit.as_ref().map(Regex::as_str)
    }

    pub fn check_branch(&self, name: &str) -> Result<(), RuleError> {
        match &self.branch {
            Some(re) if !re.is_match(name) => Err(RuleError::BranchMismatch {
                name: name.to_string(),
                pattern: re.as_str().to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn check_subject(&self, subject: &str) -> Result<(), RuleError> {
        match &self.commit {
            Some(re) if !re.is_match(subject) => Err(RuleError::SubjectMismatch {
                subject: subject.to_string(),
                pattern: re.as_str().to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// An enabled rule with an empty pattern falls back to `default`.
fn compile(
    rule: &'static str,
    settings: &ValidationRule,
    default: &str,
) -> Result<Option<Regex>, RuleError> {
    if !settings.is_enabled() {
        return Ok(None);
    }
    let pattern = if settings.pattern.is_empty() {
        default
    } else {
        settings.pattern.as_str()
    };
    Regex::new(pattern)
        .map(Some)
        .map_err(|source| RuleError::InvalidPattern {
            rule,
            pattern: pattern.to_string(),
            source,
        })
}
