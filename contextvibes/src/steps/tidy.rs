use anyhow::Result;
use tracing::warn;

use crate::io::executor::ExecError;
use crate::workflow::{Step, StepContext};

/// Delete a local branch with `branch -d`, escalating to `-D` if the user
/// agrees after git refuses an unmerged branch.
pub struct DeleteBranch {
    name: String,
}

impl DeleteBranch {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Step for DeleteBranch {
    fn description(&self) -> String {
        format!("Delete local branch '{}'", self.name)
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let err = match ctx.git.delete_local_branch(ctx.cancel, &self.name, false) {
            Ok(()) => {
                ctx.presenter
                    .success(&format!("Deleted branch '{}'.", self.name));
                return Ok(());
            }
            Err(err) => err,
        };
        let refused = err
            .downcast_ref::<ExecError>()
            .and_then(ExecError::exit_code)
            .is_some();
        if !refused {
            return Err(err);
        }
        warn!(branch = %self.name, "safe delete refused");
        ctx.presenter.warning(&format!(
            "'git branch -d {}' refused; the branch may not be fully merged.",
            self.name
        ));
        if !ctx.confirm(&format!("Force delete '{}' with 'git branch -D'?", self.name))? {
            ctx.presenter.info(&format!("Kept branch '{}'.", self.name));
            return Ok(());
        }
        ctx.git.delete_local_branch(ctx.cancel, &self.name, true)?;
        ctx.presenter
            .success(&format!("Force deleted branch '{}'.", self.name));
        Ok(())
    }
}
