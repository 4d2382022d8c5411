use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// CORS for the browser editor: any origin, the methods the article routes use.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
