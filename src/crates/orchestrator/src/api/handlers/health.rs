//! Health check endpoint handler

use crate::api::models::HealthResponse;
use axum::Json;

/// Handler for GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = health().await;
        assert_eq!(response.0.status, "healthy");
    }
}
