use std::sync::Arc;

use crate::application::services::DetectionService;

/// Estado compartido para los manejadores HTTP de Axum.
/// Todo es de solo lectura tras el arranque: seguro para peticiones
/// concurrentes sin sincronización adicional.
#[derive(Clone)]
pub struct HttpState {
    /// Caso de uso: decodificar -> inferir -> mapear avisos.
    pub service: Arc<DetectionService>,
    /// Nombre del modelo cargado, para el endpoint de salud.
    pub model_name: String,
    /// Número de clases de la tabla del modelo.
    pub class_count: usize,
}
