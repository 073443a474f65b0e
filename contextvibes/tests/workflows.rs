//! End-to-end command scenarios against the scripted executor.
//!
//! Each test builds an [`App`] over a `ScriptedExecutor` and a
//! `RecordingPresenter`, runs one command, and checks the exact Git
//! commands issued and the messages shown.

use std::fs;

use contextvibes::app::App;
use contextvibes::commands::{commit, diff, finish, init, kickoff, sync, tidy};
use contextvibes::core::config::{
    COMMIT_PROMPT_FILE, CONFIG_FILE_NAME, DEFAULT_COMMIT_PATTERN, DESCRIBE_FILE, PR_PROMPT_FILE,
    STRATEGIC_PROMPT_FILE,
};
use contextvibes::io::config::load;
use contextvibes::test_support::{Channel, RecordingPresenter, Reply, ScriptedExecutor, app};

fn assume_yes<'a>(exec: &'a ScriptedExecutor, presenter: &'a RecordingPresenter) -> App<'a> {
    let mut app = app(exec, presenter);
    app.assume_yes = true;
    app
}

fn branch_missing(exec: &ScriptedExecutor, name: &str) {
    let reference = format!("refs/heads/{name}");
    exec.on(
        "git",
        &["show-ref", "--verify", "--quiet", &reference],
        Reply::exit(1),
    );
}

#[test]
fn commit_with_valid_subject_stages_and_commits_once() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("feature/a");
    exec.staged_changes();
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    let opts = commit::CommitOptions {
        messages: vec!["feat(a): add x".to_string(), "Details line".to_string()],
        ai: false,
    };
    commit::run(&app, &opts).expect("commit");

    assert_eq!(exec.count("git add ."), 1);
    assert_eq!(exec.count("git commit -m feat(a): add x\n\nDetails line"), 1);
    assert!(presenter.prompts().is_empty());
    assert!(presenter.contains(Channel::Success, "Committed on 'feature/a'"));
}

#[test]
fn commit_with_invalid_subject_touches_nothing() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("feature/a");
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    let opts = commit::CommitOptions {
        messages: vec!["update".to_string()],
        ai: false,
    };
    let err = commit::run(&app, &opts).expect_err("subject rejected");

    assert!(err.to_string().contains(DEFAULT_COMMIT_PATTERN));
    assert_eq!(exec.count_prefix("git add"), 0);
    assert_eq!(exec.count_prefix("git commit"), 0);
    assert!(presenter.contains(Channel::Error, "Invalid commit subject format."));
}

#[test]
fn commit_declined_at_prompt_does_not_commit() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("feature/a");
    exec.staged_changes();
    let presenter = RecordingPresenter::new();
    presenter.answer_confirm(false);
    let app = app(&exec, &presenter);

    let opts = commit::CommitOptions {
        messages: vec!["fix: handle empty input".to_string()],
        ai: false,
    };
    commit::run(&app, &opts).expect("declining is not an error");

    assert_eq!(exec.count_prefix("git commit"), 0);
    assert!(presenter.contains(Channel::Info, "Commit aborted by user."));
}

#[test]
fn daily_kickoff_updates_main_then_creates_and_pushes() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("main");
    exec.clean_tree();
    branch_missing(&exec, "feature/new-y");
    let presenter = RecordingPresenter::new();
    presenter.answer_confirm(true);
    let app = app(&exec, &presenter);

    let opts = kickoff::KickoffOptions {
        branch: Some("feature/new-y".to_string()),
        ..kickoff::KickoffOptions::default()
    };
    kickoff::run(&app, &opts).expect("kickoff");

    let pull = exec.position("git pull --rebase origin main").expect("pull");
    let create = exec
        .position("git switch -c feature/new-y main")
        .expect("create");
    let push = exec
        .position("git push --set-upstream origin feature/new-y")
        .expect("push");
    assert!(pull < create && create < push);
    assert_eq!(presenter.prompts(), vec!["Proceed?".to_string()]);
    assert_eq!(exec.count("git stash push"), 0);
}

#[test]
fn daily_kickoff_refuses_existing_branch_before_any_change() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("main");
    exec.clean_tree();
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    let opts = kickoff::KickoffOptions {
        branch: Some("feature/new-y".to_string()),
        ..kickoff::KickoffOptions::default()
    };
    let err = kickoff::run(&app, &opts).expect_err("branch exists");

    assert!(err.to_string().contains("already exists"));
    assert_eq!(exec.count_prefix("git switch"), 0);
    assert_eq!(exec.count_prefix("git push"), 0);
    assert_eq!(exec.count_prefix("git pull"), 0);
    assert!(presenter.contains(Channel::Error, "Pre-check failed"));
}

#[test]
fn daily_kickoff_rejects_branch_name_outside_pattern() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("main");
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    let opts = kickoff::KickoffOptions {
        branch: Some("my-branch".to_string()),
        ..kickoff::KickoffOptions::default()
    };
    kickoff::run(&app, &opts).expect_err("invalid name");
    assert_eq!(exec.count_prefix("git pull"), 0);
    assert!(presenter.contains(Channel::Error, "Invalid branch name 'my-branch'."));
}

#[test]
fn kickoff_stashes_dirty_tree_and_reminds_to_pop() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("main");
    exec.dirty_tree();
    branch_missing(&exec, "fix/crash");
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    let opts = kickoff::KickoffOptions {
        branch: Some("fix/crash".to_string()),
        ..kickoff::KickoffOptions::default()
    };
    kickoff::run(&app, &opts).expect("kickoff");

    let stash = exec.position("git stash push").expect("stash");
    let pull = exec.position("git pull --rebase origin main").expect("pull");
    assert!(stash < pull);
    assert!(presenter.contains(Channel::Advice, "git stash pop"));
}

#[test]
fn sync_without_local_commits_skips_push() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("feature/a");
    exec.clean_tree();
    exec.on(
        "git",
        &["status", "-sb"],
        Reply::ok("## feature/a...origin/feature/a\n"),
    );
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    sync::run(&app).expect("sync");

    assert_eq!(exec.count("git pull --rebase origin feature/a"), 1);
    assert_eq!(exec.count_prefix("git push"), 0);
    assert!(presenter.contains(Channel::Success, "Sync completed successfully."));
}

#[test]
fn sync_pushes_when_ahead() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("feature/a");
    exec.clean_tree();
    exec.on(
        "git",
        &["status", "-sb"],
        Reply::ok("## feature/a...origin/feature/a [ahead 2]\n"),
    );
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    sync::run(&app).expect("sync");
    assert_eq!(exec.count("git push"), 1);
}

#[test]
fn sync_refuses_dirty_tree() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("feature/a");
    exec.dirty_tree();
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    let err = sync::run(&app).expect_err("dirty");
    assert!(err.to_string().contains("uncommitted changes"));
    assert_eq!(exec.count_prefix("git pull"), 0);
}

#[test]
fn finish_on_main_is_refused_before_push() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("main");
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    let err = finish::run(&app, finish::FinishOptions::default()).expect_err("on main");

    assert!(
        err.to_string()
            .contains("cannot create a pull request from the main branch")
    );
    assert_eq!(exec.count_prefix("git push"), 0);
    assert_eq!(exec.count_prefix("gh"), 0);
}

#[test]
fn finish_pushes_and_opens_pull_request() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("feature/a");
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    finish::run(&app, finish::FinishOptions::default()).expect("finish");

    let push = exec.position("git push origin feature/a").expect("push");
    let pr = exec.position("gh pr create --fill --web").expect("pr");
    assert!(push < pr);
}

#[test]
fn finish_without_github_cli_warns_after_push() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("feature/a");
    exec.without_command("gh");
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    finish::run(&app, finish::FinishOptions::default()).expect("finish");

    assert_eq!(exec.count("git push origin feature/a"), 1);
    assert_eq!(exec.count_prefix("gh"), 0);
    assert!(presenter.contains(Channel::Warning, "GitHub CLI (gh) not found"));
}

#[test]
fn tidy_escalates_to_force_delete_on_confirmation() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("feature/a");
    exec.clean_tree();
    exec.on(
        "git",
        &["branch", "-d", "feature/a"],
        Reply::fail(1, "error: the branch 'feature/a' is not fully merged."),
    );
    let presenter = RecordingPresenter::new();
    presenter.answer_confirm(true).answer_confirm(true);
    let app = app(&exec, &presenter);

    tidy::run(&app).expect("tidy");

    let switch = exec.position("git switch main").expect("switch");
    let pull = exec.position("git pull --rebase origin main").expect("pull");
    let force = exec.position("git branch -D feature/a").expect("force");
    assert!(switch < pull && pull < force);
}

#[test]
fn diff_writes_change_summary() {
    let exec = ScriptedExecutor::new();
    exec.on("git", &["diff", "--cached"], Reply::ok("+staged line\n"));
    exec.on(
        "git",
        &["ls-files", "--others", "--exclude-standard"],
        Reply::ok("new.txt\n"),
    );
    let presenter = RecordingPresenter::new();
    let app = app(&exec, &presenter);

    diff::run(&app).expect("diff");

    let written = fs::read_to_string(exec.root().join(DESCRIBE_FILE)).expect("read summary");
    assert!(written.contains("+staged line"));
    assert!(written.contains("- `new.txt`"));
    assert!(presenter.prompts().is_empty());
}

#[test]
fn ai_prompt_workflows_do_not_ask_to_proceed() {
    let exec = ScriptedExecutor::new();
    exec.on_branch("feature/a");
    exec.staged_changes();
    exec.on("git", &["diff", "--cached"], Reply::ok("+staged line\n"));
    exec.on("git", &["merge-base", "main", "HEAD"], Reply::ok("abc123\n"));
    let presenter = RecordingPresenter::new();
    let app = app(&exec, &presenter);

    let opts = commit::CommitOptions {
        ai: true,
        ..Default::default()
    };
    commit::run(&app, &opts).expect("commit --ai");
    finish::run(&app, finish::FinishOptions { ai: true }).expect("finish --ai");

    assert!(presenter.prompts().is_empty(), "prompts: {:?}", presenter.prompts());
    let commit_prompt =
        fs::read_to_string(exec.root().join(COMMIT_PROMPT_FILE)).expect("commit prompt");
    assert!(commit_prompt.contains("+staged line"));
    assert!(exec.root().join(PR_PROMPT_FILE).exists());
    assert!(!exec.called("git add ."));
}

#[test]
fn init_writes_config_and_leaves_existing_file_alone() {
    let exec = ScriptedExecutor::new();
    let presenter = RecordingPresenter::new();
    let app = assume_yes(&exec, &presenter);

    init::run(&app, init::InitOptions::default()).expect("init");
    let path = exec.root().join(CONFIG_FILE_NAME);
    let written = fs::read_to_string(&path).expect("read config");
    assert!(written.contains("defaultMainBranch: main"));
    let ignore = fs::read_to_string(exec.root().join(".gitignore")).expect("read gitignore");
    assert!(ignore.contains("context_commit.md"));

    fs::write(&path, "git:\n  defaultRemote: upstream\n").expect("edit");
    init::run(&app, init::InitOptions::default()).expect("second init");
    let kept = fs::read_to_string(&path).expect("read config");
    assert!(kept.contains("upstream"));
    assert!(presenter.contains(Channel::Info, "already exists"));
}

#[test]
fn first_kickoff_without_branch_runs_strategic_wizard() {
    let exec = ScriptedExecutor::new();
    let presenter = RecordingPresenter::new();
    // code style, docs style, task mode, detail level, proactivity
    for index in [1, 0, 0, 0, 1] {
        presenter.answer_select(index);
    }
    presenter
        .answer_input("")
        .answer_input("A workflow CLI")
        .answer_input("Rust")
        .answer_select(2)
        .answer_input("");
    let app = assume_yes(&exec, &presenter);

    kickoff::run(&app, &kickoff::KickoffOptions::default()).expect("strategic kickoff");

    let prompt = fs::read_to_string(exec.root().join(STRATEGIC_PROMPT_FILE)).expect("prompt");
    assert!(prompt.contains("A workflow CLI"));
    let saved = load(&exec.root().join(CONFIG_FILE_NAME))
        .expect("load")
        .expect("config saved");
    let prefs = saved.ai_collaboration_preferences;
    assert_eq!(
        serde_yaml::to_string(&prefs.ai_proactivity).expect("yaml").trim(),
        "reactive"
    );
    assert_eq!(exec.count_prefix("git switch"), 0);
}

#[test]
fn mark_strategic_complete_persists_flag() {
    let exec = ScriptedExecutor::new();
    let presenter = RecordingPresenter::new();
    let app = app(&exec, &presenter);

    let opts = kickoff::KickoffOptions {
        mark_strategic_complete: true,
        ..kickoff::KickoffOptions::default()
    };
    kickoff::run(&app, &opts).expect("mark complete");

    let saved = load(&exec.root().join(CONFIG_FILE_NAME))
        .expect("load")
        .expect("config saved");
    assert!(saved.strategic_kickoff_completed());
    assert!(saved.project_state.last_strategic_kickoff_date.is_some());
}
