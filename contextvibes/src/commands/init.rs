use anyhow::{Context, Result};

use crate::app::App;
use crate::core::config::{Config, GENERATED_FILES};
use crate::steps::{EnsureGitignoreEntries, ScaffoldFile};
use crate::workflow::Workflow;

const CONFIG_HEADER: &str = "# contextvibes project configuration.\n# Every field is optional; removed fields fall back to the built-in defaults.\n";

#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Replace an existing configuration file.
    pub force: bool,
}

/// Write a defaults-populated `.contextvibes.yaml` and ignore generated files.
pub fn run(app: &App<'_>, opts: InitOptions) -> Result<()> {
    let git = app.open_git()?;
    let target = app.config_target()?;
    if target.exists() && !opts.force {
        app.presenter
            .info(&format!("Configuration already exists at {}.", target.display()));
        app.presenter
            .advice("Run 'contextvibes init --force' to replace it with the defaults.");
        return Ok(());
    }

    let yaml = serde_yaml::to_string(&Config::defaults()).context("serialize default configuration")?;
    let ctx = app.step_context(&git);
    Workflow::new("Initialize contextvibes")
        .step(ScaffoldFile::new(
            target,
            format!("{CONFIG_HEADER}{yaml}"),
            opts.force,
        ))
        .step(EnsureGitignoreEntries::new(GENERATED_FILES))
        .run(&ctx)?;
    Ok(())
}
