pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod lifecycle;
pub mod media;
pub mod models;
pub mod routes;
pub mod schema;
pub mod seed;
pub mod state;
pub mod store;
pub mod utils;
pub mod validation;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

/// Headroom above the per-file upload limit for the other multipart parts.
const FORM_OVERHEAD: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio CMS API",
        version = "1.0.0",
        description = "Content management API for a portfolio website: soft-deletable resources with image uploads"
    ),
    paths(handlers::media::get_media),
    tags(
        (name = "Resources", description = "List, create, update, trash, restore and purge records of any resource"),
        (name = "Profile", description = "The authenticated user's own account"),
        (name = "Settings", description = "Site-wide key/value settings"),
        (name = "Media", description = "Stored images and thumbnails"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let body_limit = usize::try_from(state.config.storage.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD);
    let cors = cors_layer(&state.config.server.cors);

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes())
        .split_for_parts();

    router
        .route("/media/{*path}", get(handlers::media::get_media))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
}
