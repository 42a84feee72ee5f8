//! Router and shared state for the ID server.
//!
//! [`AppState`] owns the process's single [`Registry`]; handlers reach it
//! either directly or through the [`IdAssigner`] capability, the way a
//! persistence layer would.

pub mod error;
pub mod handler;

use axum::{
    Router,
    extract::FromRef,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use seqid::{IdAssigner, Registry};
use std::sync::Arc;

use crate::{
    header::IdHeaderName,
    log::{BodyLogLimit, log_exchange},
};

/// State shared by every request.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<Registry>,
    id_header: IdHeaderName,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, id_header: IdHeaderName) -> Self {
        Self {
            registry,
            id_header,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn assigner(&self) -> &dyn IdAssigner {
        self.registry.as_ref()
    }
}

impl FromRef<AppState> for IdHeaderName {
    fn from_ref(state: &AppState) -> Self {
        state.id_header.clone()
    }
}

/// Builds the ID service with exchange logging around every route.
pub fn router(state: AppState, body_limit: BodyLogLimit) -> Router {
    Router::new()
        .route("/ids/{entity}", get(handler::next_id))
        .route("/records/{entity}", post(handler::create_record))
        .route("/health", get(handler::health))
        .layer(from_fn_with_state(body_limit, log_exchange))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header::CONTENT_TYPE},
        response::Response,
    };
    use seqid::{NodeId, SequenceId};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let registry = Arc::new(Registry::new(NodeId::new(5).unwrap()));
        router(
            AppState::new(registry, IdHeaderName::default()),
            BodyLogLimit::default(),
        )
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn issues_ids_per_entity() {
        let app = app();
        let mut previous = 0;
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(Request::get("/ids/Order").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let id: u64 = body_string(response).await.parse().unwrap();
            assert_eq!(SequenceId::from_raw(id).node_id(), 5);
            assert!(id > previous);
            previous = id;
        }
    }

    #[tokio::test]
    async fn creates_record_for_header_owner() {
        let request = Request::post("/records/Invoice")
            .header("x-user-id", "77")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"total":12}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let created: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(created["entity"], "Invoice");
        assert_eq!(created["owner"], 77);
        assert_eq!(created["data"]["total"], 12);
        let id = created["id"].as_u64().unwrap();
        assert_eq!(SequenceId::from_raw(id).node_id(), 5);
    }

    #[tokio::test]
    async fn record_larger_than_log_limit_is_created() {
        let blob = "a".repeat(70 * 1024);
        let request = Request::post("/records/Invoice")
            .header("x-user-id", "77")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"blob":"{blob}"}}"#)))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let created: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(created["data"]["blob"].as_str().map(str::len), Some(70 * 1024));
    }

    #[tokio::test]
    async fn record_without_owner_is_rejected() {
        let request = Request::post("/records/Invoice")
            .header("x-user-id", "seventy")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("not a number"));
    }

    #[tokio::test]
    async fn health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }
}
