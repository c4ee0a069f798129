use std::fs;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayViewD, Axis, IxDyn};
use ort::session::Session;
use ort::value::Value;
use tracing::info;

use crate::adapters::onnx::class_table::parse_names;
use crate::application::ports::DetectorPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{ClassTable, EngineParams, ModelReport, RawDetection};

/// Motor de detección de señales sobre ONNX Runtime.
///
/// El umbral de confianza y la supresión de no máximos son parte del
/// comportamiento interno del modelo tal como lo envolvía Ultralytics;
/// aguas arriba nadie vuelve a filtrar. La sesión va tras un Mutex
/// (la inferencia se serializa); la tabla de clases y los parámetros
/// son de solo lectura.
pub struct OnnxSignEngine {
    session: Mutex<Session>,
    classes: ClassTable,
    params: EngineParams,
}

impl OnnxSignEngine {
    pub fn load(path: &str, params: EngineParams, intra_threads: usize) -> Result<Self> {
        let model_bytes =
            fs::read(path).with_context(|| format!("no se pudo leer el modelo {}", path))?;

        let session = Session::builder()?
            .with_intra_threads(intra_threads)
            .map_err(ort::Error::<()>::from)?
            .commit_from_memory(&model_bytes)?;

        Self::validate_io(&session)?;
        let classes = Self::read_class_table(&session)?;
        info!(model = path, clases = classes.len(), "Modelo ONNX cargado");

        Ok(Self {
            session: Mutex::new(session),
            classes,
            params,
        })
    }

    /// La tabla de clases vive en los metadatos del propio artefacto
    /// (entrada `names` del export de Ultralytics), nunca en código.
    /// Un modelo sin tabla no arranca.
    fn read_class_table(session: &Session) -> Result<ClassTable> {
        let metadata = session.metadata()?;
        let raw = metadata
            .custom("names")
            .ok_or_else(|| anyhow!("el modelo no trae la entrada de metadatos 'names'"))?;
        parse_names(&raw)
    }

    /// El contrato de formas se comprueba al cargar: una salida única,
    /// tensor 3D con al menos 4 coordenadas más una puntuación de clase.
    /// Las dimensiones simbólicas (-1) se resuelven por petición y se
    /// vuelven a comprobar allí.
    fn validate_io(session: &Session) -> Result<()> {
        if session.inputs().is_empty() {
            return Err(anyhow!("el modelo no declara ninguna entrada"));
        }
        let output = session
            .outputs()
            .first()
            .ok_or_else(|| anyhow!("el modelo no declara ninguna salida"))?;
        let dims: Vec<i64> = output
            .dtype()
            .tensor_shape()
            .ok_or_else(|| anyhow!("la salida del modelo no es un tensor"))?
            .iter()
            .copied()
            .collect();
        if dims.len() != 3 {
            return Err(anyhow!("forma de salida inesperada: {:?}", dims));
        }
        if dims[1] >= 0 && dims[1] < 5 {
            return Err(anyhow!(
                "la salida del modelo no trae puntuaciones de clase: {:?}",
                dims
            ));
        }
        Ok(())
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    fn infer(&self, rgb: &RgbImage) -> DomainResult<Vec<RawDetection>> {
        let imgsz = self.params.input_size as usize;
        let resized =
            image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Nearest);

        // NCHW f32 en [0,1], canales en orden RGB (el mismo que emite el decoder)
        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Value::from_array((input_shape, input.into_raw_vec()))
            .map_err(|e| DomainError::ModelInvocation(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DomainError::OperationFailed("lock de sesión envenenado".into()))?;
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| DomainError::ModelInvocation(e.to_string()))?;
        let (shape_out, data_out) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| DomainError::ModelInvocation(e.to_string()))?;

        let dims: Vec<usize> = shape_out.into_iter().map(|&x| x as usize).collect();
        validate_output_dims(&dims)?;
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)
            .map_err(|e| DomainError::ModelInvocation(e.to_string()))?;
        // [1, 4 + clases, candidatos] -> [4 + clases, candidatos]
        let view = array_view.index_axis(Axis(0), 0);

        let num_candidates = view.shape()[1];
        let src_w = rgb.width() as f32;
        let src_h = rgb.height() as f32;
        let sx = src_w / imgsz as f32;
        let sy = src_h / imgsz as f32;

        let mut candidates = Vec::new();

        for i in 0..num_candidates {
            let scores = view.slice(s![4.., i]);
            let Some((class_id, &max_score)) = scores
                .indexed_iter()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
            else {
                continue;
            };

            if !max_score.is_finite() || max_score < self.params.conf_threshold {
                continue;
            }

            // cxcywh en la escala del tensor -> xyxy en píxeles de la imagen origen
            let cx = view[[0, i]];
            let cy = view[[1, i]];
            let w = view[[2, i]];
            let h = view[[3, i]];
            if w <= 0.0 || h <= 0.0 {
                continue;
            }

            let bbox = scale_box(cx, cy, w, h, sx, sy, src_w, src_h);
            if bbox.iter().any(|v| !v.is_finite()) {
                continue;
            }

            candidates.push(RawDetection {
                class_id,
                bbox,
                confidence: max_score,
            });
        }

        let mut detections = non_max_suppression(candidates, self.params.iou_threshold);
        detections.truncate(self.params.max_detections);
        Ok(detections)
    }
}

#[async_trait]
impl DetectorPort for OnnxSignEngine {
    async fn detect(&self, image: &RgbImage) -> DomainResult<ModelReport> {
        let detections = self.infer(image)?;
        Ok(ModelReport {
            classes: self.classes.clone(),
            detections,
        })
    }
}

/// Guardia por petición sobre la forma concreta del tensor de salida,
/// [lote, 4 + clases, candidatos]: un desajuste es un fallo de
/// inferencia, nunca un pánico del manejador.
fn validate_output_dims(dims: &[usize]) -> DomainResult<()> {
    if dims.len() != 3 || dims[1] < 5 {
        return Err(DomainError::ModelInvocation(format!(
            "salida inesperada del modelo: {:?}",
            dims
        )));
    }
    Ok(())
}

/// Reescala una caja cxcywh del espacio del tensor a xyxy en píxeles de
/// la imagen origen, recortada a los límites [0,W]x[0,H].
fn scale_box(cx: f32, cy: f32, w: f32, h: f32, sx: f32, sy: f32, src_w: f32, src_h: f32) -> [f32; 4] {
    [
        ((cx - w / 2.0) * sx).clamp(0.0, src_w),
        ((cy - h / 2.0) * sy).clamp(0.0, src_h),
        ((cx + w / 2.0) * sx).clamp(0.0, src_w),
        ((cy + h / 2.0) * sy).clamp(0.0, src_h),
    ]
}

/// Supresión de no máximos por clase, en orden de confianza descendente.
fn non_max_suppression(mut candidates: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    candidates.sort_unstable_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawDetection> = Vec::with_capacity(candidates.len());
    'next: for det in candidates {
        for k in &kept {
            if k.class_id == det.class_id && iou(&k.bbox, &det.bbox) > iou_threshold {
                continue 'next;
            }
        }
        kept.push(det);
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;

    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;

    if union > f32::EPSILON {
        inter / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(class_id: usize, bbox: [f32; 4], confidence: f32) -> RawDetection {
        RawDetection {
            class_id,
            bbox,
            confidence,
        }
    }

    #[test]
    fn accepts_yolo_output_shape() {
        // 4 coordenadas + 15 clases, 8400 candidatos
        assert!(validate_output_dims(&[1, 19, 8400]).is_ok());
    }

    #[test]
    fn rejects_output_without_class_scores() {
        let err = validate_output_dims(&[1, 4, 8400]).unwrap_err();
        assert!(matches!(err, DomainError::ModelInvocation(_)));
    }

    #[test]
    fn rejects_output_with_wrong_rank() {
        assert!(validate_output_dims(&[19, 8400]).is_err());
        assert!(validate_output_dims(&[1, 1, 19, 8400]).is_err());
    }

    #[test]
    fn scaled_boxes_stay_within_image_bounds() {
        // caja parcialmente fuera del borde izquierdo/superior
        let bbox = scale_box(5.0, 5.0, 40.0, 40.0, 2.0, 1.5, 1280.0, 720.0);
        assert_eq!(bbox[0], 0.0);
        assert_eq!(bbox[1], 0.0);
        assert!(bbox[0] <= bbox[2] && bbox[2] <= 1280.0);
        assert!(bbox[1] <= bbox[3] && bbox[3] <= 720.0);

        // caja desbordando el borde opuesto
        let bbox = scale_box(630.0, 630.0, 60.0, 60.0, 2.0, 1.125, 1280.0, 720.0);
        assert_eq!(bbox[2], 1280.0);
        assert_eq!(bbox[3], 720.0);
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = [0.0, 0.0, 10.0, 10.0];
        assert!((iou(&b, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        assert_eq!(iou(&[0.0, 0.0, 5.0, 5.0], &[10.0, 10.0, 20.0, 20.0]), 0.0);
    }

    #[test]
    fn nms_keeps_highest_confidence_of_overlapping_pair() {
        let dets = vec![
            raw(0, [0.0, 0.0, 10.0, 10.0], 0.6),
            raw(0, [1.0, 1.0, 11.0, 11.0], 0.9),
        ];
        let kept = non_max_suppression(dets, 0.45);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn nms_does_not_suppress_across_classes() {
        let dets = vec![
            raw(0, [0.0, 0.0, 10.0, 10.0], 0.9),
            raw(1, [0.0, 0.0, 10.0, 10.0], 0.8),
        ];
        let kept = non_max_suppression(dets, 0.45);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn nms_keeps_separated_boxes_of_same_class() {
        let dets = vec![
            raw(0, [0.0, 0.0, 10.0, 10.0], 0.9),
            raw(0, [50.0, 50.0, 60.0, 60.0], 0.8),
        ];
        let kept = non_max_suppression(dets, 0.45);
        assert_eq!(kept.len(), 2);
    }
}
