use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::adapters::http::state::HttpState;
use crate::application::dto::ErrorResponse;
use crate::domain::errors::DomainError;

/// Límite de subida: 20 MB comprimidos.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub async fn detect(State(st): State<HttpState>, req: Request) -> Response {
    let bytes = match read_image_bytes(req).await {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match st.service.detect_upload(&bytes).await {
        Ok(res) => Json(res).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn health(State(st): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "model": st.model_name,
        "classes": st.class_count
    }))
}

/// El endpoint acepta tanto `multipart/form-data` (campo `file`, el
/// contrato del frontend original) como los bytes crudos de la imagen
/// en el cuerpo de la petición.
async fn read_image_bytes(req: Request) -> Result<Vec<u8>, Response> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| error_response(DomainError::InvalidImage(e.to_string())))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| error_response(DomainError::InvalidImage(e.to_string())))?
        {
            if field.name() == Some("file") {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| error_response(DomainError::InvalidImage(e.to_string())))?;
                return Ok(data.to_vec());
            }
        }
        return Err(error_response(DomainError::InvalidImage(
            "falta el campo 'file' en el formulario".into(),
        )));
    }

    let body = axum::body::to_bytes(req.into_body(), MAX_UPLOAD_BYTES)
        .await
        .map_err(|e| error_response(DomainError::InvalidImage(e.to_string())))?;
    Ok(body.to_vec())
}

/// Mapeo de la taxonomía de errores a códigos HTTP: una imagen inválida
/// es un error del cliente; un fallo de inferencia, del servidor.
/// El cuerpo de error nunca incluye `detections`.
fn error_response(err: DomainError) -> Response {
    let status = match err {
        DomainError::InvalidImage(_) => StatusCode::BAD_REQUEST,
        DomainError::ModelInvocation(_) | DomainError::OperationFailed(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        warn!(error = %err, "Fallo al procesar la petición");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}
