use autostream_store::KnowledgeStore;
use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct HealthCheck {
    status: &'static str,
    details: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: HealthCheck,
    knowledge: HealthCheck,
    checked_at: String,
}

pub fn router(knowledge: KnowledgeStore) -> Router {
    Router::new().route("/health", get(health)).with_state(knowledge)
}

async fn health(State(knowledge): State<KnowledgeStore>) -> Json<HealthResponse> {
    let document = knowledge.get();

    // The knowledge document was validated at bootstrap; a blank plan price
    // here means the store was constructed around an empty document.
    let knowledge_ok =
        !document.pricing.basic.price.is_empty() && !document.pricing.pro.price.is_empty();
    let knowledge_check = if knowledge_ok {
        HealthCheck { status: "ready", details: "knowledge document loaded".to_string() }
    } else {
        HealthCheck { status: "degraded", details: "knowledge document is incomplete".to_string() }
    };

    let status = if knowledge_ok { "ready" } else { "degraded" };

    Json(HealthResponse {
        status,
        service: HealthCheck { status: "ready", details: "accepting chat turns".to_string() },
        knowledge: knowledge_check,
        checked_at: Utc::now().to_rfc3339(),
    })
}
