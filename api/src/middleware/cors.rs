//! CORS middleware configuration for cross-origin requests.
//!
//! Development is permissive. Production only admits the origins listed in
//! `ALLOWED_ORIGINS` (comma separated). `CORS_MAX_AGE` sets the preflight
//! cache lifetime in seconds.

use actix_cors::Cors;
use actix_web::http::{header, Method};
use caa_shared::Environment;
use std::env;

const DEFAULT_MAX_AGE: usize = 3600;

/// Creates a CORS middleware instance configured for `environment`
pub fn create_cors(environment: Environment) -> Cors {
    let max_age = env::var("CORS_MAX_AGE")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_AGE);

    if environment.is_production() {
        create_production_cors(max_age)
    } else {
        create_development_cors(max_age)
    }
}

fn allowed_methods() -> Vec<Method> {
    vec![
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]
}

fn create_development_cors(max_age: usize) -> Cors {
    tracing::info!("Configuring CORS for development environment");

    Cors::default()
        .allow_any_origin()
        .allowed_methods(allowed_methods())
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::USER_AGENT,
            header::CACHE_CONTROL,
            header::HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(max_age)
        .supports_credentials()
}

fn create_production_cors(max_age: usize) -> Cors {
    tracing::info!("Configuring CORS for production environment");

    let mut cors = Cors::default()
        .allowed_methods(allowed_methods())
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(max_age);

    for origin in configured_origins() {
        tracing::info!(origin = %origin, "Adding allowed origin");
        cors = cors.allowed_origin(&origin);
    }

    cors
}

fn configured_origins() -> Vec<String> {
    env::var("ALLOWED_ORIGINS")
        .map(|origins| parse_origins(&origins))
        .unwrap_or_default()
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://caa.example.com, ,https://admin.caa.example.com "),
            vec![
                "https://caa.example.com".to_string(),
                "https://admin.caa.example.com".to_string()
            ]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_create_cors_for_each_environment() {
        let _development = create_cors(Environment::Development);
        let _production = create_cors(Environment::Production);
    }
}
