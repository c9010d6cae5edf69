//! Bucketing determinista.
//!
//! El bucket de un usuario depende sólo de `"{flag_name}:{user_id}"` y del
//! algoritmo fijado por `BUCKETING_VERSION`, así que el mismo par cae siempre
//! en el mismo bucket entre reinicios y entre implementaciones.

use std::fmt;

use flag_domain::{FlagStatus, RolloutPercentage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::BUCKET_COUNT;
use crate::hashing::digest_mod;

/// Motivo de una evaluación.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationReason {
    NotFound,
    NotActive { status: FlagStatus },
    FullRollout,
    NoIdentity,
    Bucketed { bucket: u8, rollout: u8 },
}

impl fmt::Display for EvaluationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationReason::NotFound => f.write_str("not found"),
            EvaluationReason::NotActive { status } => write!(f, "flag is {status}, not active"),
            EvaluationReason::FullRollout => f.write_str("full rollout (100%)"),
            EvaluationReason::NoIdentity => f.write_str("no identity for bucketing"),
            EvaluationReason::Bucketed { bucket, rollout } => {
                write!(f, "user bucket {bucket}, rollout {rollout}%, enabled: {}", bucket < rollout)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub flag_name: String,
    pub enabled: bool,
    pub rollout_percentage: u8,
    pub reason: EvaluationReason,
}

/// Bucket en [0,99] para un par (flag, usuario).
pub fn bucket(flag_name: &str, user_id: &str) -> u8 {
    digest_mod(&format!("{flag_name}:{user_id}"), BUCKET_COUNT) as u8
}

/// Decide si un flag está habilitado para un usuario.
///
/// Reglas, en orden:
/// 1. flag desconocido (`status == None`) -> deshabilitado.
/// 2. estado distinto de `Active` -> deshabilitado.
/// 3. rollout 100% -> habilitado, sin necesidad de identidad.
/// 4. sin identidad (o identidad vacía) -> deshabilitado.
/// 5. habilitado si `bucket(flag, user) < rollout`.
pub fn evaluate(flag_name: &str, status: Option<FlagStatus>, rollout: RolloutPercentage, user_id: Option<&str>) -> Evaluation {
    let done = |enabled: bool, pct: u8, reason: EvaluationReason| Evaluation { flag_name: flag_name.to_string(),
                                                                              enabled,
                                                                              rollout_percentage: pct,
                                                                              reason };
    let status = match status {
        None => return done(false, 0, EvaluationReason::NotFound),
        Some(s) => s,
    };
    let pct = rollout.value();
    if status != FlagStatus::Active {
        return done(false, pct, EvaluationReason::NotActive { status });
    }
    if rollout.is_full() {
        return done(true, pct, EvaluationReason::FullRollout);
    }
    match user_id.filter(|u| !u.is_empty()) {
        None => done(false, pct, EvaluationReason::NoIdentity),
        Some(user) => {
            let b = bucket(flag_name, user);
            done(b < pct, pct, EvaluationReason::Bucketed { bucket: b, rollout: pct })
        }
    }
}

/// Resumen de cuántos usuarios de una cohorte verían un flag activo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutPreview {
    pub total: usize,
    pub enabled: usize,
}

/// Cuenta, en paralelo, los usuarios habilitados si el flag estuviera activo
/// con `rollout`.
pub fn preview(flag_name: &str, rollout: RolloutPercentage, user_ids: &[String]) -> RolloutPreview {
    let enabled = user_ids.par_iter()
                          .filter(|u| evaluate(flag_name, Some(FlagStatus::Active), rollout, Some(u.as_str())).enabled)
                          .count();
    RolloutPreview { total: user_ids.len(), enabled }
}
