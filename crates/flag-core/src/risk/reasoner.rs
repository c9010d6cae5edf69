//! Contrato del razonador externo (colaborador opaco).

use flag_domain::FlagSubmission;
use serde::{Deserialize, Serialize};

use crate::errors::ReasonerError;

/// Petición estructurada construida a partir de un envío.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub name: String,
    pub description: String,
    pub scope: String,
    pub code_changes: String,
    pub config: serde_json::Value,
}

impl AssessmentRequest {
    pub fn from_submission(submission: &FlagSubmission) -> Self {
        Self { name: submission.name.clone(),
               description: submission.description.clone(),
               scope: submission.scope.as_str().to_string(),
               code_changes: submission.code_changes.clone(),
               config: serde_json::to_value(&submission.config).unwrap_or(serde_json::Value::Null) }
    }
}

/// Servicio externo que opina sobre el riesgo de un cambio.
///
/// Devuelve texto crudo que debe contener un único objeto JSON (opcionalmente
/// dentro de un bloque de código). El handle se construye una vez y se
/// comparte entre hilos; cada llamada es independiente.
pub trait ExternalReasoner: Send + Sync {
    /// Nombre para logs.
    fn name(&self) -> &str;
    fn assess(&self, request: &AssessmentRequest) -> Result<String, ReasonerError>;
}
