//! Test-only fakes for the executor and presenter capabilities, plus helpers
//! for building an [`App`] around them and for throwaway Git repositories.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use tempfile::TempDir;
use tracing::Level;

use crate::app::App;
use crate::core::config::Config;
use crate::io::cancel::CancelToken;
use crate::io::executor::{CommandOutput, ExecError, Executor, render_command};
use crate::io::presenter::Presenter;

/// Canned answer for one scripted command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            ..Self::default()
        }
    }

    pub fn exit(code: i32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    pub fn fail(code: i32, stderr: &str) -> Self {
        Self {
            stderr: stderr.to_string(),
            code,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }
}

#[derive(Debug)]
struct Rule {
    program: String,
    args: Vec<String>,
    reply: Reply,
}

/// Executor that records every command and answers from exact-match rules.
///
/// Owns a temp directory that stands in for the repository root; the
/// `rev-parse` queries used to open a repository answer with it by default.
/// Commands without a rule succeed with empty output. The most recently
/// added rule for a command wins.
pub struct ScriptedExecutor {
    root: TempDir,
    rules: RefCell<Vec<Rule>>,
    missing: RefCell<Vec<String>>,
    calls: RefCell<Vec<String>>,
}

impl Default for ScriptedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("scripted executor tempdir");
        let exec = Self {
            root,
            rules: RefCell::new(Vec::new()),
            missing: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        };
        let top = format!("{}\n", exec.root().display());
        let git_dir = format!("{}\n", exec.root().join(".git").display());
        exec.on("git", &["rev-parse", "--show-toplevel"], Reply::ok(&top));
        exec.on("git", &["rev-parse", "--absolute-git-dir"], Reply::ok(&git_dir));
        exec
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn on(&self, program: &str, args: &[&str], reply: Reply) {
        self.rules.borrow_mut().push(Rule {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            reply,
        });
    }

    pub fn on_branch(&self, name: &str) {
        self.on(
            "git",
            &["rev-parse", "--abbrev-ref", "HEAD"],
            Reply::ok(&format!("{name}\n")),
        );
    }

    pub fn clean_tree(&self) {
        self.on("git", &["diff", "--quiet"], Reply::exit(0));
        self.on("git", &["diff", "--quiet", "--cached"], Reply::exit(0));
        self.on("git", &["ls-files", "--others", "--exclude-standard"], Reply::ok(""));
    }

    /// Unstaged modifications present, nothing staged.
    pub fn dirty_tree(&self) {
        self.on("git", &["diff", "--quiet"], Reply::exit(1));
        self.on("git", &["diff", "--quiet", "--cached"], Reply::exit(0));
    }

    pub fn staged_changes(&self) {
        self.on("git", &["diff", "--quiet", "--cached"], Reply::exit(1));
    }

    pub fn without_command(&self, program: &str) {
        self.missing.borrow_mut().push(program.to_string());
    }

    /// Every command run so far, rendered as `program arg arg`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, command: &str) -> bool {
        self.count(command) > 0
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == command).count()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Index of `command` in the call log.
    pub fn position(&self, command: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c == command)
    }

    fn answer(
        &self,
        cancel: &CancelToken,
        workdir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<CommandOutput, ExecError> {
        let command = render_command(program, args);
        if cancel.is_canceled() {
            return Err(ExecError::Canceled { command });
        }
        self.calls.borrow_mut().push(command.clone());
        if self.missing.borrow().iter().any(|p| p == program) {
            return Err(ExecError::Spawn {
                command,
                dir: workdir.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }
        let reply = self
            .rules
            .borrow()
            .iter()
            .rev()
            .find(|rule| rule.program == program && rule.args == args)
            .map(|rule| rule.reply.clone())
            .unwrap_or_default();
        if reply.code == 0 {
            return Ok(CommandOutput {
                stdout: reply.stdout,
                stderr: reply.stderr,
            });
        }
        Err(ExecError::Exit {
            command,
            dir: workdir.display().to_string(),
            code: reply.code,
            stdout: reply.stdout,
            stderr: reply.stderr,
        })
    }
}

impl Executor for ScriptedExecutor {
    fn execute(
        &self,
        cancel: &CancelToken,
        workdir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<(), ExecError> {
        self.answer(cancel, workdir, program, args).map(|_| ())
    }

    fn capture_output(
        &self,
        cancel: &CancelToken,
        workdir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<CommandOutput, ExecError> {
        self.answer(cancel, workdir, program, args)
    }

    fn command_exists(&self, program: &str) -> bool {
        !self.missing.borrow().iter().any(|p| p == program)
    }
}

/// Output channel a [`RecordingPresenter`] message was sent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Summary,
    Step,
    Info,
    Success,
    Warning,
    Error,
    Detail,
    Advice,
}

/// Presenter that records output and answers prompts from queues.
///
/// A prompt with an empty queue is an error, so tests notice unexpected
/// interaction.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    messages: RefCell<Vec<(Channel, String)>>,
    confirms: RefCell<VecDeque<bool>>,
    inputs: RefCell<VecDeque<String>>,
    selections: RefCell<VecDeque<usize>>,
    prompts: RefCell<Vec<String>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer_confirm(&self, answer: bool) -> &Self {
        self.confirms.borrow_mut().push_back(answer);
        self
    }

    pub fn answer_input(&self, answer: &str) -> &Self {
        self.inputs.borrow_mut().push_back(answer.to_string());
        self
    }

    pub fn answer_select(&self, index: usize) -> &Self {
        self.selections.borrow_mut().push_back(index);
        self
    }

    pub fn messages(&self, channel: Channel) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, channel: Channel, needle: &str) -> bool {
        self.messages(channel).iter().any(|m| m.contains(needle))
    }

    /// Questions asked through any prompt, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    fn record(&self, channel: Channel, message: &str) {
        self.messages
            .borrow_mut()
            .push((channel, message.to_string()));
    }
}

impl Presenter for RecordingPresenter {
    fn summary(&self, message: &str) {
        self.record(Channel::Summary, message);
    }

    fn step(&self, message: &str) {
        self.record(Channel::Step, message);
    }

    fn info(&self, message: &str) {
        self.record(Channel::Info, message);
    }

    fn success(&self, message: &str) {
        self.record(Channel::Success, message);
    }

    fn warning(&self, message: &str) {
        self.record(Channel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.record(Channel::Error, message);
    }

    fn detail(&self, message: &str) {
        self.record(Channel::Detail, message);
    }

    fn advice(&self, message: &str) {
        self.record(Channel::Advice, message);
    }

    fn newline(&self) {}

    fn confirm(&self, question: &str) -> Result<bool> {
        self.prompts.borrow_mut().push(question.to_string());
        self.confirms
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected confirmation prompt: {question}"))
    }

    fn input(&self, question: &str, default: Option<&str>) -> Result<String> {
        self.prompts.borrow_mut().push(question.to_string());
        match self.inputs.borrow_mut().pop_front() {
            Some(answer) if answer.is_empty() => Ok(default.unwrap_or_default().to_string()),
            Some(answer) => Ok(answer),
            None => Err(anyhow!("unexpected input prompt: {question}")),
        }
    }

    fn select(&self, question: &str, options: &[&str], default: usize) -> Result<usize> {
        self.prompts.borrow_mut().push(question.to_string());
        let index = self
            .selections
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected selection prompt: {question}"))?;
        if index >= options.len() {
            return Ok(default);
        }
        Ok(index)
    }
}

/// An [`App`] over scripted capabilities rooted at the executor's temp dir,
/// with default configuration and confirmation prompts enabled.
pub fn app<'a>(exec: &'a ScriptedExecutor, presenter: &'a RecordingPresenter) -> App<'a> {
    App {
        exec,
        presenter,
        cancel: CancelToken::new(),
        workdir: exec.root().to_path_buf(),
        config: Config::defaults(),
        config_path: None,
        assume_yes: false,
    }
}

/// A real Git repository on `main` with one commit.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("repo tempdir");
        let repo = Self { dir };
        repo.git(&["init", "-q", "-b", "main"]);
        repo.git(&["config", "user.email", "dev@example.com"]);
        repo.git(&["config", "user.name", "Dev"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.write("README.md", "# demo\n");
        repo.git(&["add", "."]);
        repo.git(&["commit", "-q", "-m", "chore: initial commit"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Run git in the repository and return trimmed stdout, panicking on failure.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .expect("spawn git");
        assert!(
            output.status.success(),
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` under a thread-local subscriber and return every event at `level`
/// or more severe, formatted without colors.
pub fn capture_logs(level: Level, f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(level)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().expect("log buffer").clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
