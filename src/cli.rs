use clap::Parser;

use crate::domain::model::EngineParams;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Ruta del modelo ONNX (export Ultralytics con metadatos `names`)
    #[arg(long, env = "SIGN_ADVISOR_MODEL", default_value = "models/best.onnx")]
    pub model: String,

    /// Dirección de escucha del servidor HTTP
    #[arg(long, env = "SIGN_ADVISOR_BIND", default_value = "0.0.0.0:8090")]
    pub bind: String,

    /// Hilos intra-op de ONNX Runtime
    #[arg(long, default_value_t = 4)]
    pub intra_threads: usize,

    /// Lado del tensor de entrada del modelo
    #[arg(long, default_value_t = 640)]
    pub imgsz: u32,

    /// Umbral de confianza interno del motor
    #[arg(long, default_value_t = 0.25)]
    pub conf_thres: f32,

    /// Umbral IoU para la supresión de no máximos
    #[arg(long, default_value_t = 0.45)]
    pub iou_thres: f32,

    /// Máximo de detecciones por imagen
    #[arg(long, default_value_t = 100)]
    pub max_det: usize,
}

impl Args {
    pub fn engine_params(&self) -> EngineParams {
        EngineParams {
            input_size: self.imgsz,
            conf_threshold: self.conf_thres,
            iou_threshold: self.iou_thres,
            max_detections: self.max_det,
        }
    }
}
