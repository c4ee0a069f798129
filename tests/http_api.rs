use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use image::RgbImage;
use tower::ServiceExt;

use sign_advisor::adapters::http::{router, state::HttpState};
use sign_advisor::application::{ports::DetectorPort, services::DetectionService};
use sign_advisor::domain::{
    advisory::AdvisoryTable,
    errors::{DomainError, DomainResult},
    model::{ClassTable, ModelReport, RawDetection},
};

struct FakeDetector {
    detections: Vec<RawDetection>,
    fail: bool,
}

#[async_trait]
impl DetectorPort for FakeDetector {
    async fn detect(&self, _image: &RgbImage) -> DomainResult<ModelReport> {
        if self.fail {
            return Err(DomainError::ModelInvocation("tensor malformado".into()));
        }
        Ok(ModelReport {
            classes: classes(),
            detections: self.detections.clone(),
        })
    }
}

fn classes() -> ClassTable {
    let mut names = HashMap::new();
    names.insert(0, "Red Light".to_string());
    names.insert(1, "Crosswalk".to_string());
    ClassTable::new(names)
}

fn raw(class_id: usize, confidence: f32) -> RawDetection {
    RawDetection {
        class_id,
        bbox: [10.0, 20.0, 30.0, 40.0],
        confidence,
    }
}

fn app(detector: FakeDetector) -> axum::Router {
    let service = Arc::new(DetectionService::new(
        Arc::new(detector),
        AdvisoryTable::default(),
    ));
    router(HttpState {
        service,
        model_name: "fake.onnx".into(),
        class_count: classes().len(),
    })
}

fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(16, 16, image::Rgb([200, 30, 30]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn multipart_body(boundary: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"sign.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn detect_with_raw_body_returns_detections_and_deduplicated_warnings() {
    // Confianzas representables de forma exacta en binario, para poder
    // comparar el JSON de la respuesta con igualdad estricta.
    let app = app(FakeDetector {
        detections: vec![raw(0, 0.5), raw(0, 0.25), raw(1, 0.75)],
        fail: false,
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/detect/")
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(png_bytes()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    assert_eq!(json["detections"].as_array().unwrap().len(), 3);
    assert_eq!(json["detections"][0]["class_name"], "Red Light");
    assert_eq!(json["detections"][0]["confidence"], 0.5);
    assert_eq!(
        json["detections"][0]["bbox"],
        serde_json::json!([10.0, 20.0, 30.0, 40.0])
    );
    // "Red Light" está mapeada en la tabla; "Crosswalk" cae al nombre de clase
    assert_eq!(json["warnings"], serde_json::json!(["Stop", "Crosswalk"]));
}

#[tokio::test]
async fn detect_with_multipart_upload_works() {
    let app = app(FakeDetector {
        detections: vec![raw(0, 0.8)],
        fail: false,
    });

    let boundary = "sign-advisor-test-boundary";
    let body = multipart_body(boundary, &png_bytes());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/detect/")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["warnings"], serde_json::json!(["Stop"]));
}

#[tokio::test]
async fn invalid_image_yields_400_without_detections_field() {
    let app = app(FakeDetector {
        detections: vec![],
        fail: false,
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/detect/")
                .body(Body::from("esto no es una imagen"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json.get("error").is_some());
    assert!(json.get("detections").is_none());
}

#[tokio::test]
async fn model_failure_yields_500() {
    let app = app(FakeDetector {
        detections: vec![],
        fail: true,
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/detect/")
                .body(Body::from(png_bytes()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert!(json.get("detections").is_none());
}

#[tokio::test]
async fn zero_detections_yield_empty_lists() {
    let app = app(FakeDetector {
        detections: vec![],
        fail: false,
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/detect/")
                .body(Body::from(png_bytes()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["detections"], serde_json::json!([]));
    assert_eq!(json["warnings"], serde_json::json!([]));
}

#[tokio::test]
async fn health_reports_loaded_model() {
    let app = app(FakeDetector {
        detections: vec![],
        fail: false,
    });

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model"], "fake.onnx");
    assert_eq!(json["classes"], 2);
}
