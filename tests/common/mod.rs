use axum_test::TestServer;
use rescue_chat::core::{AppState, encode_jwt};
use rescue_chat::messaging::RoleCatalog;
use sqlx::SqlitePool;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "rescue-chat-test-secret-do-not-deploy";

/// Builds an AppState for tests around the pool provided by `#[sqlx::test]`
///
/// # Arguments
/// * `pool` - SQLite pool with the migrations already applied
///
/// # Returns
/// Arc<AppState> with the default role catalog and the test JWT secret
#[allow(dead_code)]
pub fn create_test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState::new(
        pool,
        TEST_JWT_SECRET.to_string(),
        RoleCatalog::default(),
    ))
}

/// Builds a TestServer around the full router
#[allow(dead_code)]
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = rescue_chat::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Issues a token for `email` as the identity provider would
#[allow(dead_code)]
pub fn create_test_jwt(email: &str) -> String {
    encode_jwt(email, TEST_JWT_SECRET).expect("Failed to create JWT token")
}
