//! Project configuration stored at `<repo root>/.contextvibes.yaml`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::{CONFIG_FILE_NAME, Config, merge};
use crate::io::cancel::CancelToken;
use crate::io::executor::Executor;
use crate::io::files::write_atomic;
use crate::io::git::GIT_EXE;

const NOT_A_REPOSITORY_EXIT: i32 = 128;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {} is empty", path.display())]
    Empty { path: PathBuf },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{} is not inside a Git repository", dir.display())]
    NotInRepository { dir: PathBuf },

    #[error("git executable not found on PATH")]
    GitNotFound,
}

/// Where the configuration file belongs: the repository root joined with
/// [`CONFIG_FILE_NAME`], whether or not the file exists yet.
///
/// Git reports "not a git repository" with exit 128; only that exit maps to
/// [`ConfigError::NotInRepository`].
pub fn config_path(exec: &dyn Executor, cancel: &CancelToken, workdir: &Path) -> Result<PathBuf> {
    if !exec.command_exists(GIT_EXE) {
        return Err(ConfigError::GitNotFound.into());
    }
    let out = match exec.capture_output(cancel, workdir, GIT_EXE, &["rev-parse", "--show-toplevel"])
    {
        Ok(out) => out,
        Err(err) if err.exit_code() == Some(NOT_A_REPOSITORY_EXIT) => {
            return Err(anyhow::Error::new(err).context(ConfigError::NotInRepository {
                dir: workdir.to_path_buf(),
            }));
        }
        Err(err) => {
            return Err(anyhow::Error::new(err).context("locate repository root"));
        }
    };
    Ok(PathBuf::from(out.stdout.trim()).join(CONFIG_FILE_NAME))
}

/// Path of an existing configuration file, `None` when there is none.
pub fn locate(
    exec: &dyn Executor,
    cancel: &CancelToken,
    workdir: &Path,
) -> Result<Option<PathBuf>> {
    let path = config_path(exec, cancel, workdir)?;
    if path.is_file() {
        debug!(path = %path.display(), "found configuration file");
        Ok(Some(path))
    } else {
        debug!(path = %path.display(), "no configuration file");
        Ok(None)
    }
}

/// Read a configuration document.
///
/// A missing file yields `Ok(None)`. An empty file is [`ConfigError::Empty`].
pub fn load(path: &Path) -> Result<Option<Config>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    if contents.trim().is_empty() {
        return Err(ConfigError::Empty {
            path: path.to_path_buf(),
        }
        .into());
    }
    let config: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config))
}

/// Locate, load, merge over defaults, and validate.
///
/// Returns the effective configuration and the file it came from, if any.
pub fn load_effective(
    exec: &dyn Executor,
    cancel: &CancelToken,
    workdir: &Path,
) -> Result<(Config, Option<PathBuf>)> {
    let path = locate(exec, cancel, workdir)?;
    let loaded = match &path {
        Some(path) => load(path)?,
        None => None,
    };
    let config = merge(loaded.as_ref(), &Config::defaults());
    config.validate().context("invalid validation pattern in configuration")?;
    Ok((config, path))
}

/// Atomically write `config` as YAML.
pub fn save(config: &Config, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("serialize configuration")?;
    write_atomic(path, yaml.as_bytes())?;
    info!(path = %path.display(), "saved configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{AiProactivity, ValidationRule};
    use crate::test_support::{Reply, ScriptedExecutor};
    use chrono::{TimeZone, Utc};

    #[test]
    fn load_missing_returns_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let loaded = load(&temp.path().join(CONFIG_FILE_NAME)).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn load_empty_is_sentinel_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "\n  \n").expect("write");
        let err = load(&path).expect_err("empty");
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Empty { .. })));
    }

    #[test]
    fn load_malformed_is_parse_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "git: [unclosed\n").expect("write");
        let err = load(&path).expect_err("malformed");
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Parse { .. })));
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        let mut config = Config::defaults();
        config.project_state.strategic_kickoff_completed = Some(true);
        config.project_state.last_strategic_kickoff_date =
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).single().expect("date"));
        config.ai_collaboration_preferences.ai_proactivity = Some(AiProactivity::Reactive);
        config.validation.branch_name = ValidationRule {
            enable: Some(false),
            pattern: String::new(),
        };

        save(&config, &path).expect("save");
        let loaded = load(&path).expect("load").expect("present");
        assert_eq!(loaded, config);
        assert_eq!(merge(Some(&loaded), &Config::defaults()), config);
    }

    #[test]
    fn locate_uses_repository_root() {
        let exec = ScriptedExecutor::new();
        let root = exec.root().to_path_buf();
        let cancel = CancelToken::new();

        assert!(locate(&exec, &cancel, &root).expect("locate").is_none());

        fs::write(root.join(CONFIG_FILE_NAME), "git:\n  defaultRemote: upstream\n").expect("write");
        let path = locate(&exec, &cancel, &root).expect("locate").expect("present");
        assert_eq!(path, root.join(CONFIG_FILE_NAME));

        let (config, source) = load_effective(&exec, &cancel, &root).expect("effective");
        assert_eq!(config.git.default_remote, "upstream");
        assert_eq!(config.git.default_main_branch, "main");
        assert_eq!(source, Some(path));
    }

    #[test]
    fn locate_outside_repository_fails() {
        let exec = ScriptedExecutor::new();
        exec.on(
            "git",
            &["rev-parse", "--show-toplevel"],
            Reply::fail(128, "fatal: not a git repository"),
        );
        let err = locate(&exec, &CancelToken::new(), exec.root()).expect_err("outside");
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NotInRepository { .. })
        ));
    }

    #[test]
    fn missing_git_is_not_reported_as_outside_repository() {
        let exec = ScriptedExecutor::new();
        exec.without_command("git");
        let err = locate(&exec, &CancelToken::new(), exec.root()).expect_err("no git");
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::GitNotFound)));
        assert_eq!(exec.count_prefix("git"), 0);
    }

    #[test]
    fn other_rev_parse_failures_keep_their_cause() {
        let exec = ScriptedExecutor::new();
        exec.on(
            "git",
            &["rev-parse", "--show-toplevel"],
            Reply::fail(1, "error: unexpected"),
        );
        let err = locate(&exec, &CancelToken::new(), exec.root()).expect_err("failure");
        assert!(err.downcast_ref::<ConfigError>().is_none());
        assert!(format!("{err:#}").contains("locate repository root"));
    }

    #[test]
    fn interrupted_save_keeps_previous_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        let before = Config::defaults();
        save(&before, &path).expect("save");

        let mut after = Config::defaults();
        after.git.default_remote = "upstream".to_string();
        let yaml = serde_yaml::to_string(&after).expect("yaml");
        let staged = crate::io::files::stage(&path, yaml.as_bytes()).expect("stage");
        drop(staged);

        let loaded = load(&path).expect("load").expect("present");
        assert_eq!(loaded, before);
        assert_eq!(fs::read_dir(temp.path()).expect("list").count(), 1);
    }

    #[test]
    fn invalid_pattern_fails_effective_load() {
        let exec = ScriptedExecutor::new();
        let root = exec.root().to_path_buf();
        fs::write(
            root.join(CONFIG_FILE_NAME),
            "validation:\n  commitMessage:\n    pattern: \"(\"\n",
        )
        .expect("write");
        assert!(load_effective(&exec, &CancelToken::new(), &root).is_err());
    }
}
