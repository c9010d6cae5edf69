use thiserror::Error;

/// Error del dominio: construcción de valores fuera de su rango o formato.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    ValidationError(String),
}
