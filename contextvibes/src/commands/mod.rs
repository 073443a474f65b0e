//! One module per CLI command. Each command builds its workflow from the
//! step library and runs it against the [`App`](crate::app::App) context.

pub mod commit;
pub mod describe;
pub mod diff;
pub mod feedback;
pub mod finish;
pub mod init;
pub mod kickoff;
pub mod quality;
pub mod review;
pub mod status;
pub mod sync;
pub mod tidy;
