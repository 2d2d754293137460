use crate::{AppState, auth::AccessPolicy, handlers, models::Role};
use axum::{
    Router,
    http::Method,
    routing::{get, post},
};

pub const CITIES_ROUTE: &str = "/cities";
/// `{key}` is a slug for GET and an id for PATCH/DELETE.
pub const CITY_KEY_ROUTE: &str = "/cities/{key}";

/// City Router Module
///
/// Reads are public. Every mutation is admin-only; see [`city_policy`].
pub fn city_routes() -> Router<AppState> {
    Router::new()
        // POST /cities (admin), GET /cities
        .route(
            CITIES_ROUTE,
            post(handlers::create_city).get(handlers::list_cities),
        )
        // GET /cities/{slug}, PATCH /cities/{id} (admin), DELETE /cities/{id} (admin)
        .route(
            CITY_KEY_ROUTE,
            get(handlers::get_city)
                .patch(handlers::update_city)
                .delete(handlers::delete_city),
        )
}

/// Role requirements of the city routes.
pub fn city_policy(policy: AccessPolicy) -> AccessPolicy {
    policy
        .require(Method::POST, CITIES_ROUTE, Role::Admin)
        .require(Method::PATCH, CITY_KEY_ROUTE, Role::Admin)
        .require(Method::DELETE, CITY_KEY_ROUTE, Role::Admin)
}
