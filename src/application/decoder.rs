use image::RgbImage;

use crate::domain::errors::{DomainError, DomainResult};

/// Decodifica los bytes subidos como imagen en color.
///
/// El orden de canales queda fijado a RGB en todo el servicio: el motor
/// ONNX rellena el tensor de entrada en ese mismo orden, así que un
/// desajuste aquí degradaría la precisión sin producir ningún error.
pub fn decode_rgb(bytes: &[u8]) -> DomainResult<RgbImage> {
    if bytes.is_empty() {
        return Err(DomainError::InvalidImage("cuerpo vacío".into()));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| DomainError::InvalidImage(e.to_string()))?;

    let rgb = decoded.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(DomainError::InvalidImage("imagen de dimensión cero".into()));
    }

    Ok(rgb)
}
