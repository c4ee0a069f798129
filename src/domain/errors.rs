use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Los bytes subidos no se pueden decodificar como imagen.
    #[error("Imagen inválida: {0}")]
    InvalidImage(String),
    /// La invocación del modelo falló (tensor malformado, sesión caída, etc.).
    #[error("Error de inferencia: {0}")]
    ModelInvocation(String),
    #[error("Error de operación: {0}")]
    OperationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
