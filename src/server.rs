use crate::config::ServerConfig;
use crate::db::{create_memory_pool, create_pool, run_migrations};
use crate::schema::{build_schema, selected_operation, TrackerSchema};
use anyhow::{Context, Result};
use async_graphql::http::GraphiQLSource;
use async_graphql::parser::types::OperationType;
use axum::{
    extract::{rejection::JsonRejection, RawQuery, State},
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub const GRAPHQL_PATH: &str = "/graphql";

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub schema: TrackerSchema,
    pub graphiql: bool,
}

/// GraphQL server instance
pub struct GraphqlServer {
    config: ServerConfig,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

impl GraphqlServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Open the store, then serve until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let db_pool = if self.config.in_memory {
            create_memory_pool()
                .await
                .context("Failed to open in-memory store")?
        } else {
            create_pool(&self.config.db_path).await.with_context(|| {
                format!("Failed to open database {}", self.config.db_path.display())
            })?
        };

        run_migrations(&db_pool)
            .await
            .context("Failed to run migrations")?;

        let state = AppState {
            schema: build_schema(db_pool.clone()),
            graphiql: self.config.graphiql,
        };
        let app = create_router(state);

        let addr = self.config.socket_addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        tracing::info!("Server listening on http://{}{}", addr, GRAPHQL_PATH);
        if self.config.in_memory {
            tracing::info!("Database: in-memory");
        } else {
            tracing::info!("Database: {}", self.config.db_path.display());
        }
        if self.config.graphiql {
            tracing::info!("GraphiQL enabled");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        db_pool.close().await;
        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(GRAPHQL_PATH, get(graphql_get).post(graphql_post))
        .route("/api/health", get(health_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn graphql_post(
    State(state): State<AppState>,
    payload: Result<Json<async_graphql::Request>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => Json(state.schema.execute(request).await).into_response(),
        Err(rejection) => {
            tracing::debug!("Rejected GraphQL body: {}", rejection.body_text());
            (
                rejection.status(),
                Json(serde_json::json!({
                    "errors": [{ "message": rejection.body_text() }]
                })),
            )
                .into_response()
        },
    }
}

/// `GET /graphql`: run a query from the query string, or serve GraphiQL
async fn graphql_get(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let raw = raw.unwrap_or_default();

    if raw.is_empty() {
        if state.graphiql {
            return Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish()).into_response();
        }
        return bad_request("Must provide query string.");
    }

    let request = match async_graphql::http::parse_query_string(&raw) {
        Ok(request) => request,
        Err(e) => return bad_request(&format!("Invalid query string: {}", e)),
    };

    if is_mutation(&request) {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(serde_json::json!({
                "error": "Can only perform a mutation operation from a POST request.",
                "code": "METHOD_NOT_ALLOWED"
            })),
        )
            .into_response();
    }

    Json(state.schema.execute(request).await).into_response()
}

/// True when the operation the request selects is a mutation. Unparseable
/// documents and unresolvable operation names are left for the executor to
/// report.
fn is_mutation(request: &async_graphql::Request) -> bool {
    let Ok(document) = async_graphql::parser::parse_query(&request.query) else {
        return false;
    };
    selected_operation(&document, request.operation_name.as_deref())
        .is_some_and(|operation| operation.ty == OperationType::Mutation)
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": message,
            "code": "BAD_REQUEST"
        })),
    )
        .into_response()
}

/// Health check handler
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "project-tracker".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// 404 Not Found handler
async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Not found",
            "code": "NOT_FOUND"
        })),
    )
}
