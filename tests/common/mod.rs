#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;

use nexusflow::core::config::RagSettings;
use nexusflow::rag::memory::IndexRecord;
use nexusflow::rag::mock::KeywordEmbedder;
use nexusflow::rag::{Generator, InMemoryIndex, RagPipeline, Retriever};
use nexusflow::server::router::router;
use nexusflow::state::AppState;

pub const POD_TEXT: &str = "A pod is the smallest deployable unit in Kubernetes.";
pub const SERVICE_TEXT: &str = "A service exposes a set of pods behind one stable address.";

/// Serves `app` on an ephemeral loopback port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

pub async fn spawn_service(pipeline: RagPipeline) -> SocketAddr {
    let config = json!({
        "vector_store": { "api_key": "pc-secret", "index_name": "aws-rag" },
        "generation": { "api_key": "sk-secret", "model": "gpt-4o-mini" }
    });
    let state = Arc::new(AppState::new(RagSettings::default(), &config, pipeline));
    serve(router(state)).await
}

/// Two-passage index over the `pod` / `service` keyword space.
pub fn kubernetes_index() -> InMemoryIndex {
    InMemoryIndex::from_records(vec![
        IndexRecord {
            id: "pods.md#0".to_string(),
            text: POD_TEXT.to_string(),
            vector: vec![1.0, 0.0],
            metadata: Default::default(),
        },
        IndexRecord {
            id: "services.md#0".to_string(),
            text: SERVICE_TEXT.to_string(),
            vector: vec![0.0, 1.0],
            metadata: Default::default(),
        },
    ])
    .expect("index")
}

pub fn keyword_pipeline(
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    top_k: usize,
) -> RagPipeline {
    RagPipeline::new(
        Arc::new(KeywordEmbedder::new(["pod", "service"])),
        retriever,
        generator,
        top_k,
    )
}
