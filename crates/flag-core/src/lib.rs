//! flag-core: núcleo determinista de evaluación de riesgo, aprobación y
//! rollout de feature flags.
pub mod constants;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod repo;
pub mod risk;
pub mod rollout;
pub mod workflow;

pub use errors::{ReasonerError, WorkflowError};
pub use event::{EventStore, FlagEvent, FlagEventKind, InMemoryEventStore};
pub use repo::{ApprovalFilter, FlagStore, InMemoryFlagStore, RiskRecord, StoreError};
pub use risk::{fallback_assessment, AssessmentRequest, ExternalReasoner, RiskScorer, ScoringStrategy};
pub use rollout::{evaluate, Evaluation, EvaluationReason, RolloutPreview};
pub use workflow::{ApprovalView, ApprovalWorkflow, Decision, FlagDetails, SubmissionOutcome};
