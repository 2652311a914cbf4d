use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{profile, resource, settings};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    // Static segments (`profile`, `settings`, `trash`) take precedence over `{resource}` / `{id}`.
    OpenApiRouter::new()
        .merge(profile_routes())
        .merge(settings_routes())
        .merge(resource_routes())
}

fn settings_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(settings::list_settings))
        .routes(routes!(settings::update_setting))
}

fn profile_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(profile::get_profile, profile::update_profile))
        .routes(routes!(profile::change_password))
}

fn resource_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(resource::list_records, resource::create_record))
        .routes(routes!(resource::list_trashed_records))
        .routes(routes!(resource::restore_all_records))
        .routes(routes!(
            resource::get_record,
            resource::update_record,
            resource::trash_record
        ))
        .routes(routes!(resource::restore_record))
        .routes(routes!(resource::purge_record))
}
