use anyhow::Result;

use crate::app::App;

pub fn run(app: &App<'_>) -> Result<()> {
    let git = app.open_git()?;
    let status = git.short_status(&app.cancel)?;
    app.presenter.summary("Git Status");
    if status.trim().is_empty() {
        app.presenter.info("Working tree clean.");
        return Ok(());
    }
    app.presenter.info(status.trim_end());
    Ok(())
}
