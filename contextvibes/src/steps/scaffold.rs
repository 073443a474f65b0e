//! Steps used by `init`: scaffold files, `.gitignore` entries, and the
//! configuration document.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use crate::core::config::Config;
use crate::io::config::save;
use crate::io::files::write_atomic;
use crate::workflow::{Step, StepContext};

/// Write a file, refusing to replace an existing one unless `overwrite`.
pub struct ScaffoldFile {
    path: PathBuf,
    contents: String,
    overwrite: bool,
}

impl ScaffoldFile {
    pub fn new(path: PathBuf, contents: String, overwrite: bool) -> Self {
        Self {
            path,
            contents,
            overwrite,
        }
    }
}

impl Step for ScaffoldFile {
    fn description(&self) -> String {
        format!("Write {}", self.path.display())
    }

    fn pre_check(&self, _ctx: &StepContext<'_>) -> Result<()> {
        if self.path.exists() && !self.overwrite {
            return Err(anyhow!(
                "{} already exists (use --force to overwrite)",
                self.path.display()
            ));
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        write_atomic(&self.path, self.contents.as_bytes())?;
        ctx.presenter
            .success(&format!("Wrote {}", self.path.display()));
        Ok(())
    }
}

/// Append missing entries to the repository's `.gitignore`.
pub struct EnsureGitignoreEntries {
    entries: Vec<String>,
}

impl EnsureGitignoreEntries {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }
}

impl Step for EnsureGitignoreEntries {
    fn description(&self) -> String {
        "Add generated files to .gitignore".to_string()
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let path = ctx.git.work_tree().join(".gitignore");
        let existing = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
        };
        let missing = missing_entries(&existing, &self.entries);
        if missing.is_empty() {
            ctx.presenter.info(".gitignore already lists the generated files.");
            return Ok(());
        }

        let mut block = String::new();
        if !existing.is_empty() && !existing.ends_with('\n') {
            block.push('\n');
        }
        if !existing.is_empty() {
            block.push('\n');
        }
        block.push_str("# contextvibes generated files\n");
        for entry in &missing {
            block.push_str(entry);
            block.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        file.write_all(block.as_bytes())
            .with_context(|| format!("append to {}", path.display()))?;
        ctx.presenter
            .success(&format!("Added {} entries to .gitignore.", missing.len()));
        Ok(())
    }
}

fn missing_entries<'e>(existing: &str, wanted: &'e [String]) -> Vec<&'e str> {
    wanted
        .iter()
        .map(String::as_str)
        .filter(|entry| !existing.lines().any(|line| line.trim() == *entry))
        .collect()
}

/// Save the configuration document.
pub struct PersistConfig {
    config: Config,
    path: PathBuf,
}

impl PersistConfig {
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self { config, path }
    }
}

impl Step for PersistConfig {
    fn description(&self) -> String {
        format!("Save configuration to {}", self.path.display())
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        save(&self.config, &self.path)?;
        ctx.presenter
            .success(&format!("Configuration saved to {}", self.path.display()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_absent_entries_are_missing() {
        let wanted = vec!["a.md".to_string(), "b.md".to_string()];
        assert_eq!(missing_entries("", &wanted), vec!["a.md", "b.md"]);
        assert_eq!(missing_entries("target/\n  a.md  \n", &wanted), vec!["b.md"]);
        assert!(missing_entries("b.md\na.md", &wanted).is_empty());
    }
}
