use crate::config::toml_config::CodegenConfig;
use crate::core::pipeline::CodegenPipeline;
use crate::domain::model::Schema;
use crate::domain::ports::CompletionService;
use crate::utils::error::{CodegenError, ErrorCategory, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const GENERATE_PATH: &str = "/api/codegen/generate";

pub struct AppState<G: CompletionService> {
    pub pipeline: CodegenPipeline<G>,
    pub archive_name: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    category: String,
    suggestion: &'static str,
}

impl IntoResponse for CodegenError {
    fn into_response(self) -> Response {
        let status = match self.category() {
            ErrorCategory::Input => StatusCode::BAD_REQUEST,
            ErrorCategory::Generation | ErrorCategory::Artifact | ErrorCategory::Network => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.user_friendly_message(),
            category: format!("{:?}", self.category()),
            suggestion: self.recovery_suggestion(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router<G: CompletionService + 'static>(state: Arc<AppState<G>>) -> Router {
    Router::new()
        .route(GENERATE_PATH, post(generate_handler::<G>))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

async fn generate_handler<G: CompletionService + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Json(payload): Json<serde_json::Value>,
) -> std::result::Result<Response, CodegenError> {
    let schema = Schema::new(payload)?;
    let archive = state.pipeline.generate(&schema).await?;

    let disposition = format!("attachment; filename={}", state.archive_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive,
    )
        .into_response())
}

/// 啟動 HTTP 服務直到收到 Ctrl-C
pub async fn serve<G: CompletionService + 'static>(
    config: &CodegenConfig,
    pipeline: CodegenPipeline<G>,
) -> Result<()> {
    let state = Arc::new(AppState {
        pipeline,
        archive_name: config.output.filename.clone(),
    });

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(transport = "http", bind = %actual_addr, path = GENERATE_PATH, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::{PipelineOptions, WorkspaceMode};
    use crate::core::prompts::PromptSet;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct CannedGenerator {
        bundle: String,
    }

    #[async_trait::async_trait]
    impl CompletionService for CannedGenerator {
        async fn complete(&self, prompt: &str) -> Result<String> {
            if prompt.starts_with("BRIEF") {
                Ok("Item(name: string)".to_string())
            } else {
                Ok(self.bundle.clone())
            }
        }
    }

    fn app(bundle: &str) -> Router {
        let options = PipelineOptions {
            prompts: PromptSet {
                brief: "BRIEF {{input}}".to_string(),
                bundle: "BUNDLE {{input}}\nSplit files with {{separator}}".to_string(),
            },
            workspace: WorkspaceMode::InMemory,
            ..PipelineOptions::default()
        };
        let generator = CannedGenerator {
            bundle: bundle.to_string(),
        };
        let pipeline = CodegenPipeline::with_options(generator, options).unwrap();
        router(Arc::new(AppState {
            pipeline,
            archive_name: "generated-project.zip".to_string(),
        }))
    }

    fn full_bundle() -> String {
        [
            "package com.acme.shop.model;\npublic class Item {\n}",
            "package com.acme.shop.repository;\npublic interface ItemRepository {\n}",
            "package com.acme.shop.service;\npublic class ItemService {\n}",
            "package com.acme.shop.controller;\npublic class ItemController {\n}",
            "package com.acme.shop;\npublic class Application {\n}",
            "<project></project>",
            "spring.cloud.gcp.spanner.enabled=true",
        ]
        .join("\ncodegenseparator\n")
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(GENERATE_PATH)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_zip_attachment() {
        let response = app(&full_bundle())
            .oneshot(post_json(r#"{"rootPackage":"com.acme.shop","fields":{"Item":{"name":"string"}}}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=generated-project.zip"
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
        assert!(archive
            .file_names()
            .any(|name| name == "src/main/java/com/acme/shop/model/Item.java"));
    }

    #[tokio::test]
    async fn test_schema_without_root_package_is_bad_request() {
        let response = app(&full_bundle())
            .oneshot(post_json(r#"{"fields":{}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_incomplete_generation_is_bad_gateway() {
        let response = app("only one artifact")
            .oneshot(post_json(r#"{"rootPackage":"com.acme.shop"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Generation failed, retry the request.");
        assert_eq!(body["category"], "Generation");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(&full_bundle())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
