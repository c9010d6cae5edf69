use flag_core::WorkflowError;
use flag_persistence::PersistenceError;
use thiserror::Error;

/// Error de la capa de aplicación (binarios y CLI).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
}

impl AppError {
    /// Código de salida de proceso: 3 validación, 4 no encontrado o conflicto,
    /// 5 backend o configuración.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Workflow(WorkflowError::Validation(_)) => 3,
            AppError::Workflow(WorkflowError::NotFound(_)) | AppError::Workflow(WorkflowError::Conflict(_)) => 4,
            AppError::Workflow(WorkflowError::Store(_)) | AppError::Persistence(_) | AppError::Config(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::from(WorkflowError::Validation("x".into())).exit_code(), 3);
        assert_eq!(AppError::from(WorkflowError::Conflict("x".into())).exit_code(), 4);
        assert_eq!(AppError::from(WorkflowError::NotFound("x".into())).exit_code(), 4);
        assert_eq!(AppError::Config("x".into()).exit_code(), 5);
        assert_eq!(AppError::from(PersistenceError::SerializationConflict).exit_code(), 5);
    }

    #[test]
    fn test_workflow_errors_display_transparently() {
        let err = AppError::from(WorkflowError::Conflict("approval already approved".into()));
        assert_eq!(err.to_string(), "conflict: approval already approved");
        assert_eq!(AppError::Config("falta DATABASE_URL".into()).to_string(),
                   "Error de configuración: falta DATABASE_URL");
    }
}
