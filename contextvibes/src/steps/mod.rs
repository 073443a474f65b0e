//! The step library. Each step is an independently testable unit with a
//! side-effect-free pre-check and an execute.

pub mod branch;
pub mod describe;
pub mod prompt_files;
pub mod remote;
pub mod scaffold;
pub mod stage;
pub mod stash;
pub mod tidy;

pub use branch::{CheckOnMain, CreateAndPushBranch, EnsureCleanTree, EnsureNotMain, SwitchBranch};
pub use describe::{GenerateDescribeFile, WriteDiffSummary};
pub use prompt_files::{
    GenerateCommitPrompt, GenerateFilePrompt, GeneratePrDescriptionPrompt, GenerateStrategicPrompt,
};
pub use remote::{CreateIssue, CreatePullRequest, PullRebase, PushBranch, PushIfAhead};
pub use scaffold::{EnsureGitignoreEntries, PersistConfig, ScaffoldFile};
pub use stage::EnsureStaged;
pub use stash::CheckAndPromptStash;
pub use tidy::DeleteBranch;
