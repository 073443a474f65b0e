//! Owner-only atomic file writes shared by the config store and prompt steps.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tempfile::NamedTempFile;
use tracing::debug;

/// Write `contents` to `target` via a sibling temp file and rename.
///
/// The parent directory is created (mode 0700 on unix) when missing; the
/// temp file, and therefore the final file, is mode 0600. If anything fails
/// before the rename the target is left untouched.
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    let staged = stage(target, contents)?;
    staged
        .persist(target)
        .map_err(|err| err.error)
        .with_context(|| format!("rename temp file onto {}", target.display()))?;
    debug!(path = %target.display(), bytes = contents.len(), "wrote file atomically");
    Ok(())
}

/// First half of [`write_atomic`]: a synced, owner-only temp file next to
/// `target` holding `contents`. Dropping it without persisting removes it and
/// leaves `target` as it was.
pub(crate) fn stage(target: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => return Err(anyhow!("{} has no parent directory", target.display())),
    };
    if !parent.exists() {
        create_private_dir(parent)?;
    }
    if target.is_dir() {
        return Err(anyhow!("{} is a directory", target.display()));
    }

    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    set_owner_only(temp.path())?;
    temp.write_all(contents)
        .with_context(|| format!("write temp file for {}", target.display()))?;
    temp.flush()
        .with_context(|| format!("flush temp file for {}", target.display()))?;
    temp.as_file()
        .sync_all()
        .with_context(|| format!("sync temp file for {}", target.display()))?;
    Ok(temp)
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .with_context(|| format!("create directory {}", dir.display()))
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> Result<()> {
    Ok(())
}
