//! Configuración del razonador externo desde variables de entorno.
//!
//! Variables:
//! - `REASONER_API_KEY` (o `OPENAI_API_KEY`): credencial. Ausente, vacía o
//!   `fake-key-for-testing` deja el scorer en modo sólo palabras clave.
//! - `REASONER_ENDPOINT`, `REASONER_MODEL`, `REASONER_TIMEOUT_MS`: opcionales.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use flag_core::RiskScorer;
use log::{info, warn};
use once_cell::sync::Lazy;

use crate::chat::ChatCompletionsReasoner;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // sin .env no es un error
});

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;
/// Credencial de relleno que se trata como ausente.
pub const PLACEHOLDER_KEY: &str = "fake-key-for-testing";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonerConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self { api_key: None,
               endpoint: DEFAULT_ENDPOINT.to_string(),
               model: DEFAULT_MODEL.to_string(),
               timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS) }
    }
}

impl ReasonerConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda
    /// arbitraria (el entorno real en `from_env`).
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let api_key = lookup("REASONER_API_KEY").or_else(|| lookup("OPENAI_API_KEY"))
                                                .map(|k| k.trim().to_string())
                                                .filter(|k| !k.is_empty() && k != PLACEHOLDER_KEY);
        let endpoint = lookup("REASONER_ENDPOINT").filter(|v| !v.trim().is_empty())
                                                  .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let model = lookup("REASONER_MODEL").filter(|v| !v.trim().is_empty())
                                            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout_ms = match lookup("REASONER_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                                                      warn!("REASONER_TIMEOUT_MS inválido ({raw}), usando {DEFAULT_TIMEOUT_MS}");
                                                      DEFAULT_TIMEOUT_MS
                                                  }),
            None => DEFAULT_TIMEOUT_MS,
        };
        Self { api_key,
               endpoint,
               model,
               timeout: Duration::from_millis(timeout_ms) }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Construye el `RiskScorer` que corresponde a la configuración: con razonador
/// externo si hay credencial y el cliente se pudo crear; si no, sólo
/// palabras clave.
pub fn build_scorer(cfg: &ReasonerConfig) -> RiskScorer {
    if !cfg.is_enabled() {
        info!("no reasoner credential configured, using keyword fallback only");
        return RiskScorer::keyword_fallback();
    }
    match ChatCompletionsReasoner::from_config(cfg) {
        Ok(reasoner) => {
            info!("external reasoner enabled model={} endpoint={}", cfg.model, cfg.endpoint);
            RiskScorer::external_backed(Arc::new(reasoner), cfg.timeout)
        }
        Err(e) => {
            warn!("failed to initialise reasoner client, using keyword fallback: {e}");
            RiskScorer::keyword_fallback()
        }
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;
    use flag_core::ScoringStrategy;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_or_placeholder_key_disables_reasoner() {
        assert!(!ReasonerConfig::from_lookup(lookup(&[])).is_enabled());
        assert!(!ReasonerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "fake-key-for-testing")])).is_enabled());
        assert!(!ReasonerConfig::from_lookup(lookup(&[("REASONER_API_KEY", "  ")])).is_enabled());
    }

    #[test]
    fn reasoner_key_takes_precedence() {
        let cfg = ReasonerConfig::from_lookup(lookup(&[("REASONER_API_KEY", "k1"), ("OPENAI_API_KEY", "k2")]));
        assert_eq!(cfg.api_key.as_deref(), Some("k1"));
        let cfg = ReasonerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "k2")]));
        assert_eq!(cfg.api_key.as_deref(), Some("k2"));
    }

    #[test]
    fn defaults_and_overrides() {
        let cfg = ReasonerConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, ReasonerConfig::default());

        let cfg = ReasonerConfig::from_lookup(lookup(&[("REASONER_MODEL", "gpt-4o-mini"),
                                                        ("REASONER_ENDPOINT", "http://localhost:8080/v1/chat/completions"),
                                                        ("REASONER_TIMEOUT_MS", "1500")]));
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.endpoint, "http://localhost:8080/v1/chat/completions");
        assert_eq!(cfg.timeout, Duration::from_millis(1500));

        let cfg = ReasonerConfig::from_lookup(lookup(&[("REASONER_TIMEOUT_MS", "soon")]));
        assert_eq!(cfg.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn scorer_strategy_follows_config() {
        let scorer = build_scorer(&ReasonerConfig::default());
        assert!(matches!(scorer.strategy(), ScoringStrategy::KeywordFallback));

        let cfg = ReasonerConfig { api_key: Some("k".into()),
                                   timeout: Duration::from_millis(250),
                                   ..ReasonerConfig::default() };
        match build_scorer(&cfg).strategy() {
            ScoringStrategy::ExternalBacked { reasoner, timeout } => {
                assert_eq!(reasoner.name(), "chat-completions");
                assert_eq!(*timeout, Duration::from_millis(250));
            }
            other => panic!("unexpected strategy {other:?}"),
        }
    }
}
