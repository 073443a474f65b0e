//! Composable workflows: steps with a side-effect-free pre-check and an
//! execute, driven in order by the two-phase [`runner::Workflow`].

pub mod runner;
pub mod step;

pub use runner::{RunOutcome, Workflow};
pub use step::{Step, StepContext};
