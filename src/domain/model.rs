use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tabla índice de clase -> nombre, propia del modelo cargado.
/// Nunca se duplica en código: la fuente de verdad son los metadatos
/// del artefacto ONNX.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassTable {
    names: HashMap<usize, String>,
}

impl ClassTable {
    pub fn new(names: HashMap<usize, String>) -> Self {
        Self { names }
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Detección cruda tal como sale del motor de inferencia: índice de clase,
/// caja [x_min, y_min, x_max, y_max] en píxeles de la imagen original y
/// confianza en [0, 1].
#[derive(Debug, Clone)]
pub struct RawDetection {
    pub class_id: usize,
    pub bbox: [f32; 4],
    pub confidence: f32,
}

/// Resultado completo de una invocación del modelo: la tabla de clases
/// vigente y cero o más detecciones crudas.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub classes: ClassTable,
    pub detections: Vec<RawDetection>,
}

/// Parámetros del motor YOLO. Los umbrales y la supresión de no máximos
/// son comportamiento interno del modelo; el pipeline de normalización
/// no vuelve a filtrar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineParams {
    pub input_size: u32,       // 640 típico
    pub conf_threshold: f32,   // 0..1
    pub iou_threshold: f32,    // 0..1
    pub max_detections: usize, // p.ej. 100
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 100,
        }
    }
}
