//! Constantes del núcleo.
//!
//! Algunas participan en resultados reproducibles (bucketing, score base del
//! modelo de palabras clave): cambiarlas altera decisiones ya observadas por
//! usuarios, por lo que `BUCKETING_VERSION` debe cambiar junto con ellas.

use std::time::Duration;

/// Versión del algoritmo de bucketing: SHA-256 de `"{flag}:{user}"` leído como
/// entero big-endian, módulo 100.
pub const BUCKETING_VERSION: &str = "sha256-mod100-v1";

/// Número de buckets de rollout.
pub const BUCKET_COUNT: u32 = 100;

/// Score inicial del modelo de palabras clave.
pub const BASE_RISK_SCORE: u32 = 10;

/// Penalización por alcance `all`.
pub const ALL_SYSTEMS_SCOPE_WEIGHT: u32 = 15;

/// Penalización por alcance `database`.
pub const DATABASE_SCOPE_WEIGHT: u32 = 20;

/// Timeout por defecto para el razonador externo.
pub const DEFAULT_REASONER_TIMEOUT: Duration = Duration::from_secs(20);
