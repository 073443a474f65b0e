use anyhow::{Result, anyhow};
use tracing::info;

use crate::workflow::{Step, StepContext};

/// Offer to stash a dirty working tree; records whether it did.
#[derive(Debug, Default)]
pub struct CheckAndPromptStash {
    did_stash: bool,
}

impl CheckAndPromptStash {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Step for CheckAndPromptStash {
    fn description(&self) -> String {
        "Stash uncommitted changes if present".to_string()
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        if ctx.git.is_working_tree_clean(ctx.cancel)? {
            ctx.presenter.info("Working tree is clean; nothing to stash.");
            return Ok(());
        }
        ctx.presenter.warning("The working tree has uncommitted changes.");
        if !ctx.confirm("Stash them before continuing?")? {
            return Err(anyhow!(
                "uncommitted changes must be committed or stashed before continuing"
            ));
        }
        ctx.git.stash_push(ctx.cancel)?;
        self.did_stash = true;
        info!("stashed working tree changes");
        ctx.presenter.success("Changes stashed.");
        Ok(())
    }

    fn stashed_changes(&self) -> bool {
        self.did_stash
    }
}
