use std::sync::Arc;

use clap::Parser;

use sign_advisor::adapters::http::{router, state::HttpState};
use sign_advisor::adapters::onnx::sign_engine::OnnxSignEngine;
use sign_advisor::application::services::DetectionService;
use sign_advisor::cli::Args;
use sign_advisor::domain::advisory::AdvisoryTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    // 2. Cargar el modelo una sola vez, de forma bloqueante: si el
    // artefacto o su tabla de clases no valen, el proceso no arranca.
    tracing::info!("🔧 Cargando modelo ONNX desde {}...", args.model);
    let engine = Arc::new(OnnxSignEngine::load(
        &args.model,
        args.engine_params(),
        args.intra_threads,
    )?);

    // 3. Servicio de aplicación: detector + tabla de avisos, ambos
    // inmutables durante toda la vida del proceso.
    let class_count = engine.classes().len();
    let service = Arc::new(DetectionService::new(engine, AdvisoryTable::default()));

    let state = HttpState {
        service,
        model_name: args.model.clone(),
        class_count,
    };
    let app = router(state);

    tracing::info!("🚀 Servicio de avisos de señales en http://{}", args.bind);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
