//! Evaluación de rollout por usuario.

mod evaluator;

pub use evaluator::{bucket, evaluate, preview, Evaluation, EvaluationReason, RolloutPreview};
