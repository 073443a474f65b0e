//! Git façade over the [`Executor`] capability.
//!
//! Every method maps to a single `git` invocation, trims its output, and
//! translates exit codes that carry meaning (e.g. `diff --quiet`) into typed
//! booleans. The façade never writes to the user's terminal.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::io::cancel::CancelToken;
use crate::io::executor::{CommandOutput, ExecError, Executor, snippet};

pub const GIT_EXE: &str = "git";

/// Typed failures the façade raises on top of [`ExecError`].
#[derive(Debug, Error)]
pub enum GitError {
    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    #[error("git reported an empty branch name")]
    EmptyBranchName,

    #[error("commit message cannot be empty")]
    EmptyCommitMessage,

    #[error("git {op} exited with unexpected code {code}")]
    UnexpectedExit {
        op: &'static str,
        code: i32,
        #[source]
        source: ExecError,
    },
}

/// An initialized working copy, resolved once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    work_tree: PathBuf,
    git_dir: PathBuf,
    remote: String,
    main_branch: String,
    git_exe: String,
}

impl RepoHandle {
    /// Resolve the repository containing `workdir`.
    ///
    /// Fails when the `git` executable is not on `PATH` or `workdir` is not
    /// inside a working tree.
    #[instrument(skip_all, fields(workdir = %workdir.display()))]
    pub fn open(
        exec: &dyn Executor,
        cancel: &CancelToken,
        workdir: &Path,
        remote: &str,
        main_branch: &str,
    ) -> Result<Self> {
        if !exec.command_exists(GIT_EXE) {
            return Err(anyhow!("git executable not found on PATH"));
        }
        let top = exec
            .capture_output(cancel, workdir, GIT_EXE, &["rev-parse", "--show-toplevel"])
            .with_context(|| format!("{} is not inside a Git repository", workdir.display()))?;
        let work_tree = PathBuf::from(top.stdout.trim());
        let git_dir = exec
            .capture_output(cancel, workdir, GIT_EXE, &["rev-parse", "--absolute-git-dir"])
            .context("resolve git metadata directory")?;
        let handle = Self {
            work_tree,
            git_dir: PathBuf::from(git_dir.stdout.trim()),
            remote: remote.to_string(),
            main_branch: main_branch.to_string(),
            git_exe: GIT_EXE.to_string(),
        };
        debug!(work_tree = %handle.work_tree.display(), "opened repository");
        Ok(handle)
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn main_branch(&self) -> &str {
        &self.main_branch
    }
}

/// Git operations for one repository.
pub struct Git<'a> {
    repo: RepoHandle,
    exec: &'a dyn Executor,
}

impl<'a> Git<'a> {
    pub fn new(repo: RepoHandle, exec: &'a dyn Executor) -> Self {
        Self { repo, exec }
    }

    pub fn repo(&self) -> &RepoHandle {
        &self.repo
    }

    pub fn work_tree(&self) -> &Path {
        self.repo.work_tree()
    }

    pub fn remote(&self) -> &str {
        self.repo.remote()
    }

    pub fn main_branch(&self) -> &str {
        self.repo.main_branch()
    }

    /// Return the current branch name (errors on detached HEAD).
    #[instrument(skip_all)]
    pub fn current_branch(&self, cancel: &CancelToken) -> Result<String> {
        let out = self.capture(cancel, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let name = out.stdout.trim();
        if name == "HEAD" {
            warn!("detached HEAD detected");
            return Err(GitError::DetachedHead.into());
        }
        if name.is_empty() {
            return Err(GitError::EmptyBranchName.into());
        }
        debug!(branch = %name, "current branch");
        Ok(name.to_string())
    }

    /// Stage every working-tree change, untracked files included.
    #[instrument(skip_all)]
    pub fn add_all(&self, cancel: &CancelToken) -> Result<()> {
        self.capture(cancel, &["add", "."])?;
        debug!("staged all changes");
        Ok(())
    }

    #[instrument(skip_all)]
    pub fn commit(&self, cancel: &CancelToken, message: &str) -> Result<()> {
        if message.trim().is_empty() {
            return Err(GitError::EmptyCommitMessage.into());
        }
        self.capture(cancel, &["commit", "-m", message])?;
        debug!("commit created");
        Ok(())
    }

    /// True if the index differs from HEAD.
    pub fn has_staged_changes(&self, cancel: &CancelToken) -> Result<bool> {
        self.differs(cancel, "diff --quiet --cached", &["diff", "--quiet", "--cached"])
    }

    /// True if the working tree differs from the index.
    pub fn has_unstaged_changes(&self, cancel: &CancelToken) -> Result<bool> {
        self.differs(cancel, "diff --quiet", &["diff", "--quiet"])
    }

    /// Raw `git status --short` output.
    pub fn short_status(&self, cancel: &CancelToken) -> Result<String> {
        Ok(self.capture(cancel, &["status", "--short"])?.stdout)
    }

    pub fn staged_diff(&self, cancel: &CancelToken) -> Result<String> {
        self.diff_output(cancel, &["diff", "--cached"])
    }

    pub fn unstaged_diff(&self, cancel: &CancelToken) -> Result<String> {
        self.diff_output(cancel, &["diff", "HEAD"])
    }

    pub fn untracked_files(&self, cancel: &CancelToken) -> Result<Vec<String>> {
        let out = self.capture(cancel, &["ls-files", "--others", "--exclude-standard"])?;
        Ok(non_empty_lines(&out.stdout))
    }

    pub fn tracked_files(&self, cancel: &CancelToken) -> Result<Vec<String>> {
        let out = self.capture(cancel, &["ls-files"])?;
        Ok(non_empty_lines(&out.stdout))
    }

    /// True iff nothing is staged, nothing is modified, and nothing is untracked.
    #[instrument(skip_all)]
    pub fn is_working_tree_clean(&self, cancel: &CancelToken) -> Result<bool> {
        if self.has_unstaged_changes(cancel)? {
            debug!("working tree has unstaged changes");
            return Ok(false);
        }
        if self.has_staged_changes(cancel)? {
            debug!("working tree has staged changes");
            return Ok(false);
        }
        let untracked = self.untracked_files(cancel)?;
        if !untracked.is_empty() {
            debug!(untracked = untracked.len(), "working tree has untracked files");
            return Ok(false);
        }
        Ok(true)
    }

    #[instrument(skip_all, fields(branch = ?branch))]
    pub fn pull_rebase(&self, cancel: &CancelToken, branch: &str) -> Result<()> {
        debug!(remote = %self.remote(), "pulling with rebase");
        self.capture(cancel, &["pull", "--rebase", self.remote(), branch])?;
        Ok(())
    }

    /// True iff `status -sb` reports the branch ahead of its upstream.
    pub fn is_ahead_of_upstream(&self, cancel: &CancelToken) -> Result<bool> {
        let out = self.capture(cancel, &["status", "-sb"])?;
        let ahead = out.stdout.contains("[ahead ");
        debug!(ahead, "upstream comparison");
        Ok(ahead)
    }

    /// Push the current branch, or `branch` to the default remote.
    ///
    /// "Everything up-to-date" counts as success.
    #[instrument(skip_all, fields(branch = ?branch))]
    pub fn push(&self, cancel: &CancelToken, branch: Option<&str>) -> Result<()> {
        let mut args = vec!["push"];
        if let Some(branch) = branch {
            args.push(self.remote());
            args.push(branch);
        }
        match self.exec.capture_output(cancel, self.work_tree(), GIT_EXE, &args) {
            Ok(out) => {
                if is_up_to_date(&out) {
                    debug!("remote already up to date");
                }
                Ok(())
            }
            Err(err) if err.stderr().contains("Everything up-to-date") => {
                debug!("remote already up to date");
                Ok(())
            }
            Err(err) => {
                log_failure(&err);
                Err(err.into())
            }
        }
    }

    /// `show-ref --verify --quiet refs/heads/<name>`: 0 exists, 1 missing.
    pub fn local_branch_exists(&self, cancel: &CancelToken, name: &str) -> Result<bool> {
        let reference = format!("refs/heads/{name}");
        let differs = self.differs(
            cancel,
            "show-ref --verify",
            &["show-ref", "--verify", "--quiet", &reference],
        )?;
        Ok(!differs)
    }

    #[instrument(skip_all, fields(name = %name))]
    pub fn switch_branch(&self, cancel: &CancelToken, name: &str) -> Result<()> {
        self.capture(cancel, &["switch", name])?;
        Ok(())
    }

    #[instrument(skip_all, fields(name = %name, base = ?base))]
    pub fn create_and_switch(
        &self,
        cancel: &CancelToken,
        name: &str,
        base: Option<&str>,
    ) -> Result<()> {
        let mut args = vec!["switch", "-c", name];
        if let Some(base) = base {
            args.push(base);
        }
        self.capture(cancel, &args)?;
        Ok(())
    }

    #[instrument(skip_all, fields(branch = ?branch))]
    pub fn push_set_upstream(&self, cancel: &CancelToken, branch: &str) -> Result<()> {
        self.capture(cancel, &["push", "--set-upstream", self.remote(), branch])?;
        Ok(())
    }

    #[instrument(skip_all)]
    pub fn stash_push(&self, cancel: &CancelToken) -> Result<()> {
        self.capture(cancel, &["stash", "push"])?;
        Ok(())
    }

    pub fn merge_base(&self, cancel: &CancelToken, a: &str, b: &str) -> Result<String> {
        let out = self.capture(cancel, &["merge-base", a, b])?;
        Ok(out.stdout.trim().to_string())
    }

    /// One-line log of commits in `<base>..HEAD`.
    pub fn log_since(&self, cancel: &CancelToken, base: &str) -> Result<String> {
        let range = format!("{base}..HEAD");
        let out = self.capture(cancel, &["log", "--no-color", "--format=%h %s%n%b", &range])?;
        Ok(out.stdout.trim_end().to_string())
    }

    pub fn diff_since(&self, cancel: &CancelToken, base: &str) -> Result<String> {
        let range = format!("{base}..HEAD");
        self.diff_output(cancel, &["diff", &range])
    }

    #[instrument(skip_all, fields(name = %name, force = force))]
    pub fn delete_local_branch(&self, cancel: &CancelToken, name: &str, force: bool) -> Result<()> {
        let flag = if force { "-D" } else { "-d" };
        self.capture(cancel, &["branch", flag, name])?;
        Ok(())
    }

    /// Run git and treat any failure as an error worth reporting.
    fn capture(&self, cancel: &CancelToken, args: &[&str]) -> Result<CommandOutput, ExecError> {
        self.run(cancel, args).inspect_err(log_failure)
    }

    /// Run git without judging the exit; callers interpret expected codes.
    fn run(&self, cancel: &CancelToken, args: &[&str]) -> Result<CommandOutput, ExecError> {
        self.exec
            .capture_output(cancel, self.work_tree(), &self.repo.git_exe, args)
    }

    /// Run a `--quiet`-style check: exit 0 → false, exit 1 → true, else error.
    fn differs(&self, cancel: &CancelToken, op: &'static str, args: &[&str]) -> Result<bool> {
        match self.run(cancel, args) {
            Ok(_) => Ok(false),
            Err(err) => match err.exit_code() {
                Some(1) => Ok(true),
                Some(code) => {
                    log_failure(&err);
                    Err(GitError::UnexpectedExit {
                        op,
                        code,
                        source: err,
                    }
                    .into())
                }
                None => {
                    log_failure(&err);
                    Err(err.into())
                }
            },
        }
    }

    /// Diff output where exit 1 signals differences rather than failure.
    fn diff_output(&self, cancel: &CancelToken, args: &[&str]) -> Result<String> {
        match self.run(cancel, args) {
            Ok(out) => Ok(out.stdout),
            Err(ExecError::Exit { code: 1, stdout, .. }) => Ok(stdout),
            Err(err) => {
                log_failure(&err);
                Err(err.into())
            }
        }
    }
}

fn log_failure(err: &ExecError) {
    match err {
        ExecError::Exit {
            command,
            code,
            stderr,
            ..
        } => error!(
            command = %command,
            exit_code = *code,
            stderr = %snippet(stderr),
            "git command failed"
        ),
        other => error!(err = %other, "git command failed"),
    }
}

fn is_up_to_date(out: &CommandOutput) -> bool {
    out.stdout.contains("Everything up-to-date") || out.stderr.contains("Everything up-to-date")
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::executor::exit_code_of;
    use crate::test_support::{Reply, ScriptedExecutor, capture_logs};
    use tracing::Level;

    fn git_for(exec: &ScriptedExecutor) -> Git<'_> {
        let repo = RepoHandle::open(exec, &CancelToken::new(), exec.root(), "origin", "main")
            .expect("open repo");
        Git::new(repo, exec)
    }

    #[test]
    fn open_requires_git_on_path() {
        let exec = ScriptedExecutor::new();
        exec.without_command("git");
        let err = RepoHandle::open(&exec, &CancelToken::new(), exec.root(), "origin", "main")
            .expect_err("missing git");
        assert!(err.to_string().contains("git executable not found"));
    }

    #[test]
    fn open_outside_repository_is_an_error() {
        let exec = ScriptedExecutor::new();
        exec.on("git", &["rev-parse", "--show-toplevel"], Reply::fail(128, "fatal: not a git repository"));
        let err = RepoHandle::open(&exec, &CancelToken::new(), exec.root(), "origin", "main")
            .expect_err("outside repo");
        assert!(format!("{err:#}").contains("is not inside a Git repository"));
        assert_eq!(exit_code_of(&err), Some(128));
    }

    #[test]
    fn current_branch_trims_output() {
        let exec = ScriptedExecutor::new();
        exec.on_branch("feature/x");
        let git = git_for(&exec);
        assert_eq!(git.current_branch(&CancelToken::new()).expect("branch"), "feature/x");
    }

    #[test]
    fn current_branch_rejects_detached_head() {
        let exec = ScriptedExecutor::new();
        exec.on_branch("HEAD");
        let git = git_for(&exec);
        let err = git.current_branch(&CancelToken::new()).expect_err("detached");
        assert!(matches!(err.downcast_ref::<GitError>(), Some(GitError::DetachedHead)));
        assert!(err.to_string().contains("detached"));
    }

    #[test]
    fn current_branch_rejects_empty_output() {
        let exec = ScriptedExecutor::new();
        exec.on_branch("");
        let git = git_for(&exec);
        let err = git.current_branch(&CancelToken::new()).expect_err("empty");
        assert!(matches!(err.downcast_ref::<GitError>(), Some(GitError::EmptyBranchName)));
    }

    #[test]
    fn staged_changes_follow_exit_codes() {
        let cancel = CancelToken::new();
        for (code, expected) in [(0, Some(false)), (1, Some(true)), (2, None), (128, None)] {
            let exec = ScriptedExecutor::new();
            exec.on("git", &["diff", "--quiet", "--cached"], Reply::exit(code));
            let git = git_for(&exec);
            let result = git.has_staged_changes(&cancel);
            match expected {
                Some(value) => assert_eq!(result.expect("typed result"), value, "exit {code}"),
                None => {
                    let err = result.expect_err("unexpected exit should error");
                    assert_eq!(exit_code_of(&err), Some(code));
                }
            }
        }
    }

    #[test]
    fn expected_exit_codes_are_not_logged_as_failures() {
        let cancel = CancelToken::new();
        let exec = ScriptedExecutor::new();
        exec.staged_changes();
        exec.on(
            "git",
            &["show-ref", "--verify", "--quiet", "refs/heads/feature/b"],
            Reply::exit(1),
        );
        let git = git_for(&exec);
        let logs = capture_logs(Level::WARN, || {
            assert!(git.has_staged_changes(&cancel).expect("staged"));
            assert!(!git.local_branch_exists(&cancel, "feature/b").expect("missing"));
        });
        assert!(logs.is_empty(), "unexpected warnings: {logs}");
    }

    #[test]
    fn unexpected_exit_is_logged_as_failure() {
        let cancel = CancelToken::new();
        let exec = ScriptedExecutor::new();
        exec.on(
            "git",
            &["diff", "--quiet", "--cached"],
            Reply::fail(129, "usage: git diff"),
        );
        let git = git_for(&exec);
        let logs = capture_logs(Level::WARN, || {
            git.has_staged_changes(&cancel).expect_err("usage error");
        });
        assert!(logs.contains("ERROR"), "logs: {logs}");
        assert!(logs.contains("git command failed"), "logs: {logs}");
        assert!(logs.contains("usage: git diff"), "logs: {logs}");
    }

    #[test]
    fn local_branch_exists_inverts_show_ref() {
        let cancel = CancelToken::new();
        let exec = ScriptedExecutor::new();
        exec.on(
            "git",
            &["show-ref", "--verify", "--quiet", "refs/heads/feature/a"],
            Reply::exit(0),
        );
        exec.on(
            "git",
            &["show-ref", "--verify", "--quiet", "refs/heads/feature/b"],
            Reply::exit(1),
        );
        exec.on(
            "git",
            &["show-ref", "--verify", "--quiet", "refs/heads/feature/c"],
            Reply::exit(128),
        );
        let git = git_for(&exec);
        assert!(git.local_branch_exists(&cancel, "feature/a").expect("a"));
        assert!(!git.local_branch_exists(&cancel, "feature/b").expect("b"));
        assert!(git.local_branch_exists(&cancel, "feature/c").is_err());
    }

    #[test]
    fn clean_tree_requires_all_three_checks() {
        let cancel = CancelToken::new();
        let exec = ScriptedExecutor::new();
        exec.clean_tree();
        let git = git_for(&exec);
        assert!(git.is_working_tree_clean(&cancel).expect("clean"));

        exec.on(
            "git",
            &["ls-files", "--others", "--exclude-standard"],
            Reply::ok("new.txt\n"),
        );
        assert!(!git.is_working_tree_clean(&cancel).expect("untracked"));
    }

    #[test]
    fn diff_exit_one_is_not_an_error() {
        let exec = ScriptedExecutor::new();
        exec.on("git", &["diff", "--cached"], Reply::ok("+added").with_code(1));
        let git = git_for(&exec);
        assert_eq!(git.staged_diff(&CancelToken::new()).expect("diff"), "+added");
    }

    #[test]
    fn ahead_detection_uses_status_sb() {
        let cancel = CancelToken::new();
        let exec = ScriptedExecutor::new();
        exec.on(
            "git",
            &["status", "-sb"],
            Reply::ok("## feature/z...origin/feature/z [ahead 2]\n"),
        );
        let git = git_for(&exec);
        assert!(git.is_ahead_of_upstream(&cancel).expect("ahead"));

        exec.on("git", &["status", "-sb"], Reply::ok("## feature/z...origin/feature/z\n"));
        assert!(!git.is_ahead_of_upstream(&cancel).expect("not ahead"));
    }

    #[test]
    fn push_treats_up_to_date_failure_as_success() {
        let exec = ScriptedExecutor::new();
        exec.on(
            "git",
            &["push", "origin", "feature/x"],
            Reply::fail(1, "Everything up-to-date"),
        );
        let git = git_for(&exec);
        git.push(&CancelToken::new(), Some("feature/x")).expect("push");
    }

    #[test]
    fn commit_rejects_blank_message_without_calling_git() {
        let exec = ScriptedExecutor::new();
        let git = git_for(&exec);
        let err = git.commit(&CancelToken::new(), "  \n").expect_err("blank");
        assert!(matches!(err.downcast_ref::<GitError>(), Some(GitError::EmptyCommitMessage)));
        assert_eq!(exec.count_prefix("git commit"), 0);
    }

    #[test]
    fn create_and_switch_passes_base() {
        let exec = ScriptedExecutor::new();
        let git = git_for(&exec);
        git.create_and_switch(&CancelToken::new(), "feature/y", Some("main"))
            .expect("switch");
        assert!(exec.called("git switch -c feature/y main"));
    }
}
