//! Evaluación de riesgo: modelo determinista de palabras clave y override
//! opcional por un razonador externo.

mod fallback;
mod keywords;
mod parse;
mod reasoner;
mod scorer;

pub use fallback::{fallback_assessment, recommendation_for};
pub use keywords::{KeywordTable, KeywordTier, KEYWORD_TABLES};
pub use parse::parse_reasoner_reply;
pub use reasoner::{AssessmentRequest, ExternalReasoner};
pub use scorer::{RiskScorer, ScoringStrategy};
