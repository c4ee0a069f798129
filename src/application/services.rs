use std::sync::Arc;

use image::RgbImage;
use tracing::info;

use crate::{
    application::{decoder, dto::DetectResponse, ports::DetectorPort},
    domain::{
        advisory::AdvisoryTable,
        detection::{distinct_classes, Detection},
        errors::DomainResult,
        model::ModelReport,
    },
};

/// Orquestador del flujo decodificar -> inferir -> mapear avisos.
///
/// El detector y la tabla de avisos son inmutables tras el arranque, así
/// que el servicio se comparte entre peticiones concurrentes sin locks.
#[derive(Clone)]
pub struct DetectionService {
    detector: Arc<dyn DetectorPort>,
    advisories: AdvisoryTable,
}

impl DetectionService {
    pub fn new(detector: Arc<dyn DetectorPort>, advisories: AdvisoryTable) -> Self {
        Self {
            detector,
            advisories,
        }
    }

    /// Pipeline completo para una petición: decodifica los bytes subidos,
    /// invoca el modelo una sola vez y normaliza su salida.
    pub async fn detect_upload(&self, bytes: &[u8]) -> DomainResult<DetectResponse> {
        let rgb = decoder::decode_rgb(bytes)?;
        self.detect_image(&rgb).await
    }

    pub async fn detect_image(&self, rgb: &RgbImage) -> DomainResult<DetectResponse> {
        let report = self.detector.detect(rgb).await?;
        let response = self.normalize(report);
        info!(
            detections = response.detections.len(),
            warnings = response.warnings.len(),
            "Inferencia completada"
        );
        Ok(response)
    }

    /// Normalización de la salida cruda del modelo:
    /// resuelve índice -> nombre con la tabla del propio modelo, emite una
    /// Detection por caja sin filtrar nada más, y calcula los avisos para
    /// las clases distintas en orden de primera aparición.
    fn normalize(&self, report: ModelReport) -> DetectResponse {
        let detections: Vec<Detection> = report
            .detections
            .into_iter()
            .map(|raw| Detection {
                class_name: report
                    .classes
                    .name(raw.class_id)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("clase {}", raw.class_id)),
                bbox: raw.bbox,
                confidence: raw.confidence,
            })
            .collect();

        let warnings = distinct_classes(&detections)
            .into_iter()
            .map(|class| self.advisories.advice(class))
            .collect();

        DetectResponse {
            detections,
            warnings,
        }
    }
}
