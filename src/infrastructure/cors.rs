use actix_cors::Cors;
use actix_web::http::{header, Method};

/// Builds the CORS policy from the configured origins. `*` allows any
/// origin (rejected in production by config validation).
pub fn build_cors(origins: &[String]) -> Cors {
    let base = Cors::default()
        .allowed_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers(vec![header::CONTENT_LENGTH])
        .max_age(3600);

    if origins.iter().any(|origin| origin == "*") {
        return base.allow_any_origin();
    }

    origins
        .iter()
        .fold(base.supports_credentials(), |cors, origin| cors.allowed_origin(origin))
}
