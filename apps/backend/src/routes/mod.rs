use actix_web::web;

pub mod games;
pub mod health;
pub mod realtime;

/// Configure application routes for tests and non-HttpServer contexts.
///
/// In production, `main.rs` wires these with additional middleware (CORS,
/// request tracing, structured logging). For tests we register the same
/// paths without those wrappers so that endpoint behavior can be exercised
/// directly.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Health check routes: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // Session routes: /api/games/**
    cfg.service(web::scope("/api/games").configure(games::configure_routes));

    // Realtime routes: /api/ws
    cfg.service(web::scope("/api/ws").configure(realtime::configure_routes));
}
