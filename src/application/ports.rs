use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{errors::DomainResult, model::ModelReport};

/// Puerto hacia el motor de detección. Una invocación por petición,
/// síncrona desde el punto de vista del llamante: sin reintentos,
/// sin colas, sin estado entre llamadas.
#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn detect(&self, image: &RgbImage) -> DomainResult<ModelReport>;
}
