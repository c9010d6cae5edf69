//! `RiskScorer`: estrategia externa con escape incondicional al modelo de
//! palabras clave.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flag_domain::{AssessmentSource, FlagSubmission, RiskAssessment};
use log::{debug, warn};

use super::fallback::fallback_assessment;
use super::parse::parse_reasoner_reply;
use super::reasoner::{AssessmentRequest, ExternalReasoner};
use crate::constants::DEFAULT_REASONER_TIMEOUT;
use crate::errors::ReasonerError;

/// Estrategia elegida al construir el scorer.
#[derive(Clone)]
pub enum ScoringStrategy {
    /// Sólo el modelo determinista.
    KeywordFallback,
    /// Intenta el razonador externo, acotado por `timeout`.
    ExternalBacked {
        reasoner: Arc<dyn ExternalReasoner>,
        timeout: Duration,
    },
}

impl fmt::Debug for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringStrategy::KeywordFallback => f.write_str("KeywordFallback"),
            ScoringStrategy::ExternalBacked { reasoner, timeout } => f.debug_struct("ExternalBacked")
                                                                     .field("reasoner", &reasoner.name())
                                                                     .field("timeout", timeout)
                                                                     .finish(),
        }
    }
}

/// Productor de evaluaciones de riesgo. `score` es total: cualquier fallo del
/// razonador externo (indisponible, timeout, respuesta inválida) se registra y
/// degrada al modelo de palabras clave.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    strategy: ScoringStrategy,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::keyword_fallback()
    }
}

impl RiskScorer {
    pub fn keyword_fallback() -> Self {
        Self { strategy: ScoringStrategy::KeywordFallback }
    }

    pub fn external_backed(reasoner: Arc<dyn ExternalReasoner>, timeout: Duration) -> Self {
        Self { strategy: ScoringStrategy::ExternalBacked { reasoner, timeout } }
    }

    /// Igual que `external_backed` con `DEFAULT_REASONER_TIMEOUT`.
    pub fn with_reasoner(reasoner: Arc<dyn ExternalReasoner>) -> Self {
        Self::external_backed(reasoner, DEFAULT_REASONER_TIMEOUT)
    }

    pub fn strategy(&self) -> &ScoringStrategy {
        &self.strategy
    }

    pub fn score(&self, submission: &FlagSubmission) -> RiskAssessment {
        self.score_with_source(submission).0
    }

    pub fn score_with_source(&self, submission: &FlagSubmission) -> (RiskAssessment, AssessmentSource) {
        match &self.strategy {
            ScoringStrategy::KeywordFallback => (fallback_assessment(submission), AssessmentSource::Fallback),
            ScoringStrategy::ExternalBacked { reasoner, timeout } => {
                match Self::try_external(reasoner, *timeout, submission) {
                    Ok(assessment) => {
                        debug!("reasoner '{}' accepted: name={} level={} score={}",
                               reasoner.name(),
                               submission.name,
                               assessment.risk_level(),
                               assessment.risk_score());
                        (assessment, AssessmentSource::External)
                    }
                    Err(e) => {
                        warn!("reasoner '{}' failed for '{}', using fallback: {}", reasoner.name(), submission.name, e);
                        (fallback_assessment(submission), AssessmentSource::Fallback)
                    }
                }
            }
        }
    }

    /// Ejecuta el razonador en un hilo propio y espera como máximo `timeout`.
    /// Si vence, el hilo queda desacoplado y su respuesta tardía se descarta.
    fn try_external(reasoner: &Arc<dyn ExternalReasoner>,
                    timeout: Duration,
                    submission: &FlagSubmission)
                    -> Result<RiskAssessment, ReasonerError> {
        let request = AssessmentRequest::from_submission(submission);
        let worker = Arc::clone(reasoner);
        let (tx, rx) = mpsc::channel();
        thread::Builder::new().name("risk-reasoner".to_string())
                              .spawn(move || {
                                  let _ = tx.send(worker.assess(&request));
                              })
                              .map_err(|e| ReasonerError::Unavailable(format!("spawn reasoner worker: {e}")))?;
        let raw = match rx.recv_timeout(timeout) {
            Ok(reply) => reply?,
            Err(RecvTimeoutError::Timeout) => return Err(ReasonerError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ReasonerError::Unavailable("reasoner worker ended without a reply".to_string()))
            }
        };
        parse_reasoner_reply(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flag_domain::{RiskLevel, Scope};

    struct Canned(Result<String, ReasonerError>);
    impl ExternalReasoner for Canned {
        fn name(&self) -> &str { "canned" }
        fn assess(&self, _request: &AssessmentRequest) -> Result<String, ReasonerError> { self.0.clone() }
    }

    struct Slow;
    impl ExternalReasoner for Slow {
        fn name(&self) -> &str { "slow" }
        fn assess(&self, _request: &AssessmentRequest) -> Result<String, ReasonerError> {
            thread::sleep(Duration::from_millis(500));
            Ok(r#"{"risk_level":"low","risk_score":1,"detected_issues":["x"],"reasoning":"r","recommendation":"r"}"#.into())
        }
    }

    struct Panicky;
    impl ExternalReasoner for Panicky {
        fn name(&self) -> &str { "panicky" }
        fn assess(&self, _request: &AssessmentRequest) -> Result<String, ReasonerError> {
            panic!("client blew up")
        }
    }

    fn submission() -> FlagSubmission {
        FlagSubmission::new("dark-mode", "dark mode toggle", Scope::Frontend, "")
    }

    fn scorer(r: impl ExternalReasoner + 'static) -> RiskScorer {
        RiskScorer::external_backed(Arc::new(r), Duration::from_millis(100))
    }

    #[test]
    fn keyword_strategy_uses_fallback() {
        let (a, src) = RiskScorer::keyword_fallback().score_with_source(&submission());
        assert_eq!(src, AssessmentSource::Fallback);
        assert_eq!(a, fallback_assessment(&submission()));
    }

    #[test]
    fn valid_external_reply_is_trusted() {
        let reply = r#"```json
{"risk_level":"medium","risk_score":45,"detected_issues":["ui_regression"],"reasoning":"r","recommendation":"senior review"}
```"#;
        let (a, src) = scorer(Canned(Ok(reply.into()))).score_with_source(&submission());
        assert_eq!(src, AssessmentSource::External);
        assert_eq!(a.risk_level(), RiskLevel::Medium);
        assert_eq!(a.risk_score(), 45);
    }

    #[test]
    fn malformed_reply_falls_back() {
        let reply = r#"{"risk_level":"low","risk_score":5,"detected_issues":["x"],"reasoning":"r"}"#;
        let (a, src) = scorer(Canned(Ok(reply.into()))).score_with_source(&submission());
        assert_eq!(src, AssessmentSource::Fallback);
        assert_eq!(a, fallback_assessment(&submission()));
    }

    #[test]
    fn unavailable_falls_back() {
        let s = scorer(Canned(Err(ReasonerError::Unavailable("no route".into()))));
        assert_eq!(s.score(&submission()), fallback_assessment(&submission()));
    }

    #[test]
    fn timeout_falls_back() {
        let (a, src) = scorer(Slow).score_with_source(&submission());
        assert_eq!(src, AssessmentSource::Fallback);
        assert_eq!(a.risk_score(), 10);
    }

    #[test]
    fn panicking_reasoner_falls_back() {
        let (_, src) = scorer(Panicky).score_with_source(&submission());
        assert_eq!(src, AssessmentSource::Fallback);
    }

    #[test]
    fn debug_hides_reasoner_internals() {
        let s = format!("{:?}", scorer(Slow).strategy());
        assert!(s.contains("ExternalBacked"));
        assert!(s.contains("slow"));
    }
}
