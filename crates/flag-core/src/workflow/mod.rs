//! Máquina de estados de aprobación sobre el ciclo de vida de un flag.

mod core;
mod views;

pub use self::core::ApprovalWorkflow;
pub use views::{ApprovalView, Decision, FlagDetails, SubmissionOutcome};
