//! Errores del núcleo.

use std::time::Duration;

use flag_domain::DomainError;
use thiserror::Error;

use crate::repo::StoreError;

/// Errores visibles para quien invoca el workflow. Ningún error deja estado
/// mutado.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum WorkflowError {
    #[error("validation error: {0}")] Validation(String),
    #[error("not found: {0}")] NotFound(String),
    #[error("conflict: {0}")] Conflict(String),
    #[error("store error: {0}")] Store(String),
}

impl From<DomainError> for WorkflowError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::ValidationError(msg) => WorkflowError::Validation(msg),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => WorkflowError::NotFound(msg),
            StoreError::Conflict(msg) => WorkflowError::Conflict(msg),
            StoreError::Backend(msg) => WorkflowError::Store(msg),
        }
    }
}

/// Fallos del razonador externo. Nunca salen de `RiskScorer`: se registran y
/// se degrada al modelo de palabras clave.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ReasonerError {
    #[error("external reasoner unavailable: {0}")] Unavailable(String),
    #[error("external reasoner timed out after {0:?}")] Timeout(Duration),
    #[error("malformed reasoner reply: {0}")] Malformed(String),
}
