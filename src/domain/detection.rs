use serde::{Deserialize, Serialize};

/// Un hallazgo del modelo, normalizado al esquema de salida del servicio.
/// La caja va en píxeles de la imagen original, orden [x_min, y_min, x_max, y_max].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub class_name: String,
    pub bbox: [f32; 4],
    pub confidence: f32,
}

/// Clases distintas presentes en la lista, en orden de primera aparición.
/// El orden determinista hace que las respuestas sean comparables en tests.
pub fn distinct_classes(detections: &[Detection]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for det in detections {
        if !seen.contains(&det.class_name.as_str()) {
            seen.push(&det.class_name);
        }
    }
    seen
}
