// flag-domain library entry point
pub mod approval;
pub mod error;
pub mod flag;
pub mod risk;

pub use approval::{Approval, ApprovalStatus, ApproverTier, DecisionOutcome};
pub use error::DomainError;
pub use flag::{Flag, FlagConfig, FlagStatus, FlagSubmission, RolloutPercentage, Scope};
pub use risk::{AssessmentSource, RiskAssessment, RiskLevel};
