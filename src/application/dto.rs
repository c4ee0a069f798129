use serde::{Deserialize, Serialize};

use crate::domain::detection::Detection;

/// Respuesta de `POST /detect/`: todas las cajas más la lista de avisos
/// deduplicada (como máximo un aviso por clase distinta detectada).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub detections: Vec<Detection>,
    pub warnings: Vec<String>,
}

/// Cuerpo de error JSON. Una respuesta de error nunca lleva `detections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
