use actix_web::HttpResponse;

/// Liveness probe; does not touch the database
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "caa-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Fallback for unmatched routes
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(caa_shared::ErrorResponse::new(
        caa_shared::error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
