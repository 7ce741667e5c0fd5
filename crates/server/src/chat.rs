//! Single-page chat surface over the dialogue controller.
//!
//! Endpoints:
//! - `GET  /`         - the one-page chat form (text box + transcript)
//! - `POST /api/chat` - process one turn for a session
//!
//! Sessions are held in-process, keyed by a server-issued id. A session's
//! turn is fully processed before its next one is accepted: the session map
//! lock is held across the turn.

use std::collections::HashMap;
use std::sync::Arc;

use autostream_agent::{AgentError, DialogueController, IntentClassifier};
use autostream_core::SessionState;
use autostream_store::LeadSink;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

type Controller = DialogueController<Arc<dyn IntentClassifier>, Arc<dyn LeadSink>>;

#[derive(Clone)]
pub struct ChatState {
    controller: Arc<Controller>,
    sessions: Arc<Mutex<HashMap<Uuid, SessionState>>>,
}

impl ChatState {
    pub fn new(controller: Controller) -> Self {
        Self { controller: Arc::new(controller), sessions: Arc::new(Mutex::new(HashMap::new())) }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<Uuid>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct ChatErrorBody {
    pub error: String,
}

pub fn router(state: ChatState) -> Router {
    Router::new()
        .route("/", get(chat_page))
        .route("/api/chat", post(chat_turn))
        .with_state(state)
}

async fn chat_page() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

async fn chat_turn(
    State(state): State<ChatState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ChatErrorBody { error: "message must not be empty".to_string() }),
        )
            .into_response();
    }

    let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);

    let mut sessions = state.sessions.lock().await;
    let session = sessions.entry(session_id).or_insert_with(|| {
        info!(session_id = %session_id, "new chat session");
        SessionState::new()
    });

    match state.controller.take_turn(session, &request.message).await {
        Ok(reply) => (StatusCode::OK, Json(ChatResponse { session_id, reply })).into_response(),
        Err(err @ AgentError::Classify(_)) => {
            error!(session_id = %session_id, error = %err, "classifier failure");
            (
                StatusCode::BAD_GATEWAY,
                Json(ChatErrorBody { error: "intent classification failed".to_string() }),
            )
                .into_response()
        }
        Err(err @ AgentError::LeadCapture(_)) => {
            error!(session_id = %session_id, error = %err, "lead capture failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatErrorBody { error: "lead could not be recorded".to_string() }),
            )
                .into_response()
        }
    }
}

const CHAT_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>AutoStream Support</title>
<style>
  body { font-family: sans-serif; max-width: 640px; margin: 2rem auto; }
  #transcript { border: 1px solid #ccc; padding: 1rem; height: 320px; overflow-y: scroll; }
  .user { color: #333; }
  .agent { color: #0a6; white-space: pre-wrap; }
  form { display: flex; gap: .5rem; margin-top: 1rem; }
  input[type=text] { flex: 1; }
</style>
</head>
<body>
<h1>AutoStream Support</h1>
<div id="transcript"></div>
<form id="chat-form">
  <input type="text" id="message" autocomplete="off" placeholder="Ask about plans, pricing, or sign up...">
  <button type="submit">Send</button>
</form>
<script>
let sessionId = null;
const transcript = document.getElementById('transcript');
const input = document.getElementById('message');

function append(cls, who, text) {
  const line = document.createElement('p');
  line.className = cls;
  line.textContent = who + ': ' + text;
  transcript.appendChild(line);
  transcript.scrollTop = transcript.scrollHeight;
}

document.getElementById('chat-form').addEventListener('submit', async (event) => {
  event.preventDefault();
  const message = input.value.trim();
  if (!message) return;
  append('user', 'You', message);
  input.value = '';
  const response = await fetch('/api/chat', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ session_id: sessionId, message }),
  });
  const payload = await response.json();
  if (response.ok) {
    sessionId = payload.session_id;
    append('agent', 'Agent', payload.reply);
  } else {
    append('agent', 'Agent', 'error: ' + payload.error);
  }
});
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use autostream_agent::{
        AnswerRetriever, ClassifyError, DialogueController, IntentClassifier,
    };
    use autostream_core::{Intent, KnowledgeDocument, Plan, Policies, Pricing};
    use autostream_store::{LeadSink, MemoryLeadSink};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::{router, ChatState};

    struct FixedClassifier {
        intent: Intent,
        fail: bool,
    }

    #[async_trait]
    impl IntentClassifier for FixedClassifier {
        async fn classify(&self, _utterance: &str) -> Result<Intent, ClassifyError> {
            if self.fail {
                return Err(ClassifyError::EmptyResponse);
            }
            Ok(self.intent)
        }
    }

    fn document() -> KnowledgeDocument {
        KnowledgeDocument {
            pricing: Pricing {
                basic: Plan {
                    price: "$29/month".to_string(),
                    videos: "10 videos/month".to_string(),
                    resolution: "720p".to_string(),
                    features: Vec::new(),
                },
                pro: Plan {
                    price: "$99/month".to_string(),
                    videos: "Unlimited videos".to_string(),
                    resolution: "4K".to_string(),
                    features: vec!["AI captions".to_string()],
                },
            },
            policies: Policies {
                refund: "Full refund within 7 days of purchase.".to_string(),
                support: "24/7 support on the Pro plan.".to_string(),
            },
        }
    }

    fn state(intent: Intent, fail: bool) -> ChatState {
        let classifier: Arc<dyn IntentClassifier> = Arc::new(FixedClassifier { intent, fail });
        let sink: Arc<dyn LeadSink> = Arc::new(MemoryLeadSink::new());
        ChatState::new(DialogueController::new(
            classifier,
            sink,
            AnswerRetriever::new(Arc::new(document())),
        ))
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn chat_page_is_served_at_root() {
        let app = router(state(Intent::Greeting, false));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let page = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(page.contains("AutoStream Support"));
        assert!(page.contains("/api/chat"));
    }

    #[tokio::test]
    async fn chat_turn_issues_a_session_and_replies() {
        let app = router(state(Intent::Greeting, false));
        let response = app
            .oneshot(chat_request(json!({"message": "hello"})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = response_json(response).await;
        assert_eq!(payload["reply"], "Hi! How can I help you with AutoStream today?");
        assert!(payload["session_id"].as_str().expect("session id").parse::<Uuid>().is_ok());
    }

    #[tokio::test]
    async fn session_state_persists_across_turns() {
        let app = router(state(Intent::HighIntent, false));

        let first = app
            .clone()
            .oneshot(chat_request(json!({"message": "I want to sign up"})))
            .await
            .expect("response");
        let first_payload = response_json(first).await;
        assert_eq!(first_payload["reply"], "Great! May I know your name?");
        let session_id = first_payload["session_id"].clone();

        // Same session: the next utterance fills the name slot.
        let second = app
            .oneshot(chat_request(json!({"session_id": session_id, "message": "Jane Doe"})))
            .await
            .expect("response");
        let second_payload = response_json(second).await;
        assert_eq!(second_payload["reply"], "Thanks! Could you share your email?");
        assert_eq!(second_payload["session_id"], first_payload["session_id"]);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let app = router(state(Intent::Greeting, false));
        let response = app
            .oneshot(chat_request(json!({"message": "   "})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn classifier_failure_maps_to_bad_gateway() {
        let app = router(state(Intent::Greeting, true));
        let response = app
            .oneshot(chat_request(json!({"message": "hello"})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let payload = response_json(response).await;
        assert_eq!(payload["error"], "intent classification failed");
    }
}
