use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Router,
};
use chrono::Utc;

use crate::api::extract::AppJson;
use crate::api::middleware::{
    auth::{require_admin, AuthenticatedUser},
    state::AppState,
};
use crate::error::Result;
use crate::models::{export_request::ExportRequest, order::Order};
use crate::services::export_client::REGISTRY_EXPORT_PATH;
use crate::services::registry_export;

/// Generates the registry report for the export desk
async fn registry_export(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    AppJson(request): AppJson<ExportRequest>,
) -> Result<Response> {
    tracing::info!(
        user_id = %user.user_id,
        format = ?request.format,
        filter_by = ?request.filter_by,
        statuses = request.statuses.len(),
        "Registry export requested"
    );

    let orders =
        Order::list_for_export(&state.pool, &request, state.config.export_max_rows).await?;

    let format = request.format;
    let bytes = tokio::task::spawn_blocking(move || registry_export::render(&orders, format))
        .await
        .map_err(anyhow::Error::from)??;

    let filename = registry_export::export_filename(format, Utc::now());

    tracing::info!(filename = %filename, bytes = bytes.len(), "Registry export generated");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(REGISTRY_EXPORT_PATH, post(registry_export))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::auth::{
        tests::{token_for, TEST_SECRET},
        Role,
    };
    use crate::api::test_support::test_state;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = test_state(TEST_SECRET);
        router(state.clone()).with_state(state)
    }

    fn export_request(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(REGISTRY_EXPORT_PATH)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder
            .body(Body::from(r#"{"format":"CSV","filterBy":"all"}"#))
            .unwrap()
    }

    #[tokio::test]
    async fn test_export_requires_token() {
        let response = app().oneshot(export_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_export_requires_admin() {
        let token = token_for(Role::User, TEST_SECRET, 3600);
        let response = app().oneshot(export_request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
