// flag.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{DomainError, RiskLevel};

/// Alcance declarado del cambio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Frontend,
    Backend,
    Database,
    #[serde(alias = "all systems")]
    All,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Frontend => "frontend",
            Scope::Backend => "backend",
            Scope::Database => "database",
            Scope::All => "all",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frontend" => Ok(Scope::Frontend),
            "backend" => Ok(Scope::Backend),
            "database" => Ok(Scope::Database),
            "all" | "all systems" => Ok(Scope::All),
            other => Err(DomainError::ValidationError(format!("unknown scope: {other}"))),
        }
    }
}

/// Porcentaje de rollout garantizado en [0,100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RolloutPercentage(u8);

impl RolloutPercentage {
    pub const FULL: RolloutPercentage = RolloutPercentage(100);
    pub const NONE: RolloutPercentage = RolloutPercentage(0);

    pub fn value(&self) -> u8 { self.0 }
    pub fn is_full(&self) -> bool { self.0 == 100 }
}

impl TryFrom<i64> for RolloutPercentage {
    type Error = DomainError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        if (0..=100).contains(&v) {
            Ok(RolloutPercentage(v as u8))
        } else {
            Err(DomainError::ValidationError(format!("rollout_percentage must be between 0 and 100, got {v}")))
        }
    }
}

impl From<RolloutPercentage> for i64 {
    fn from(p: RolloutPercentage) -> Self { i64::from(p.0) }
}

impl fmt::Display for RolloutPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Configuración de un flag: un campo conocido (`rollout_percentage`) más un
/// mapa abierto para claves futuras (p.ej. `target_users`, que no se evalúa).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout_percentage: Option<RolloutPercentage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlagConfig {
    /// Porcentaje efectivo: 100 si no se definió.
    pub fn effective_rollout(&self) -> RolloutPercentage {
        self.rollout_percentage.unwrap_or(RolloutPercentage::FULL)
    }

    pub fn with_rollout(mut self, pct: RolloutPercentage) -> Self {
        self.rollout_percentage = Some(pct);
        self
    }
}

/// Estado del ciclo de vida de un flag.
///
/// Transiciones válidas:
/// - `Pending` -> `Approved` | `Rejected` (sólo por decisión de una Approval)
/// - `Approved` | `Inactive` -> `Active`
/// - `Active` -> `Inactive`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagStatus {
    Pending,
    Approved,
    Rejected,
    Active,
    Inactive,
}

impl FlagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagStatus::Pending => "pending",
            FlagStatus::Approved => "approved",
            FlagStatus::Rejected => "rejected",
            FlagStatus::Active => "active",
            FlagStatus::Inactive => "inactive",
        }
    }

    /// Estado destino de un toggle, o `None` si el toggle no es legal.
    pub fn toggled(&self) -> Option<FlagStatus> {
        match self {
            FlagStatus::Approved | FlagStatus::Inactive => Some(FlagStatus::Active),
            FlagStatus::Active => Some(FlagStatus::Inactive),
            FlagStatus::Pending | FlagStatus::Rejected => None,
        }
    }
}

impl fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlagStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(FlagStatus::Pending),
            "approved" => Ok(FlagStatus::Approved),
            "rejected" => Ok(FlagStatus::Rejected),
            "active" => Ok(FlagStatus::Active),
            "inactive" => Ok(FlagStatus::Inactive),
            other => Err(DomainError::ValidationError(format!("unknown flag status: {other}"))),
        }
    }
}

/// Entrada efímera de un envío de flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagSubmission {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub scope: Scope,
    #[serde(default)]
    pub code_changes: String,
    #[serde(default)]
    pub config: FlagConfig,
    #[serde(default)]
    pub created_by: String,
}

impl FlagSubmission {
    pub fn new(name: impl Into<String>, description: impl Into<String>, scope: Scope, code_changes: impl Into<String>) -> Self {
        Self { name: name.into(),
               description: description.into(),
               scope,
               code_changes: code_changes.into(),
               config: FlagConfig::default(),
               created_by: String::new() }
    }

    pub fn with_config(mut self, config: FlagConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Valida lo que el tipo no garantiza por sí solo (nombre no vacío).
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::ValidationError("flag name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Entidad Flag persistida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub scope: Scope,
    pub code_changes: String,
    pub created_by: String,
    pub status: FlagStatus,
    pub risk_level: Option<RiskLevel>,
    pub config: FlagConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flag {
    /// Crea un flag en `Pending` a partir de un envío ya validado.
    pub fn from_submission(submission: &FlagSubmission, now: DateTime<Utc>) -> Self {
        Self { id: Uuid::new_v4(),
               name: submission.name.trim().to_string(),
               description: submission.description.clone(),
               scope: submission.scope,
               code_changes: submission.code_changes.clone(),
               created_by: submission.created_by.clone(),
               status: FlagStatus::Pending,
               risk_level: None,
               config: submission.config.clone(),
               created_at: now,
               updated_at: now }
    }

    pub fn rollout(&self) -> RolloutPercentage { self.config.effective_rollout() }
}
