//! Common utilities for integration tests

use assert_cmd::Command;
use project_tracker::db::{create_pool, run_migrations};
use project_tracker::schema::build_schema;
use project_tracker::server::{create_router, AppState, GRAPHQL_PATH};
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get the path to the `project-tracker` binary
#[allow(dead_code)]
pub fn tracker_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_project-tracker"))
}

/// Create a Command for the binary with the tracker environment cleared
#[allow(dead_code)]
pub fn tracker_command() -> Command {
    let mut cmd = Command::new(tracker_binary());
    cmd.env_remove("PORT")
        .env_remove("TRACKER_BIND")
        .env_remove("TRACKER_DB_PATH")
        .env_remove("TRACKER_ENV")
        .env_remove("TRACKER_LOG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

/// Fresh migrated store in a temporary directory
#[allow(dead_code)]
pub async fn setup_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("tracker_test.db");
    let pool = create_pool(&db_path)
        .await
        .expect("Failed to create test database");

    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    (temp_dir, pool)
}

/// Router over a fresh store
#[allow(dead_code)]
pub async fn test_router(graphiql: bool) -> (TempDir, SqlitePool, axum::Router) {
    let (temp_dir, pool) = setup_test_db().await;
    let router = create_router(AppState {
        schema: build_schema(pool.clone()),
        graphiql,
    });
    (temp_dir, pool, router)
}

/// Serve a fresh store on an ephemeral port and return the GraphQL URL
#[allow(dead_code)]
pub async fn spawn_server() -> (TempDir, SqlitePool, String) {
    let (temp_dir, pool, router) = test_router(false).await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (temp_dir, pool, format!("http://{}{}", addr, GRAPHQL_PATH))
}
