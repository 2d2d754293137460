use crate::{AppState, auth::AccessPolicy, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Route template shared by the slug lookup and the id-addressed mutations.
/// The router cannot hold two differently named parameters at one position.
pub const CATEGORY_KEY_ROUTE: &str = "/categories/{key}";

/// Category Router Module
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            post(handlers::create_category).get(handlers::list_categories),
        )
        // GET by slug; PATCH/DELETE by id.
        .route(
            CATEGORY_KEY_ROUTE,
            get(handlers::get_category)
                .patch(handlers::update_category)
                .delete(handlers::delete_category),
        )
}

/// Categories declare no requirements: every route stays public.
// TODO: gate category mutations on Role::Admin once product confirms the asymmetry with cities is unintended.
pub fn category_policy(policy: AccessPolicy) -> AccessPolicy {
    policy
}
