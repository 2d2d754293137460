use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ErrorBody},
    models::{CatalogEntity, CreateEntityRequest, LoginRequest, LoginResponse, UpdateEntityRequest},
};

/// Parses the `{id}` segment of mutation routes. Anything but a UUID is a validation error.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::Validation(format!("id must be a UUID, got \"{}\"", raw)))
}

// --- Auth ---

/// login
///
/// [Public Route] Verifies a credential issued elsewhere and returns the session
/// payload for it. Every failure collapses into `invalid_credential`.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credential accepted", body = LoginResponse),
        (status = 401, description = "Credential rejected", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        tracing::debug!("login body rejected: {}", e.body_text());
        ApiError::InvalidCredential
    })?;

    let identity = state
        .verifier
        .verify(&payload.token)
        .map_err(|_| ApiError::InvalidCredential)?;

    let role = state.resolver.resolve_role(&identity).await.map_err(|e| {
        tracing::debug!(subject = %identity.subject(), "login refused: {}", e);
        ApiError::InvalidCredential
    })?;

    tracing::info!(subject = %identity.subject(), %role, "login accepted");
    Ok(Json(LoginResponse {
        id: identity.subject(),
        role,
        token: payload.token,
    }))
}

// --- Cities ---

/// create_city
///
/// [Admin Route] Creates a city; its slug is derived from the name.
#[utoipa::path(
    post,
    path = "/cities",
    request_body = CreateEntityRequest,
    responses(
        (status = 201, description = "Created", body = CatalogEntity),
        (status = 400, description = "Malformed body, invalid name or duplicate slug", body = ErrorBody),
        (status = 401, description = "No valid credential", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_city(
    AuthUser { identity, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateEntityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CatalogEntity>), ApiError> {
    let Json(payload) = payload?;
    tracing::debug!(actor = %identity.subject(), "create city");
    let city = state.cities.create(payload).await?;
    Ok((StatusCode::CREATED, Json(city)))
}

/// list_cities
///
/// [Public Route] Lists every city.
#[utoipa::path(
    get,
    path = "/cities",
    responses(
        (status = 200, description = "All cities", body = [CatalogEntity]),
        (status = 400, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn list_cities(State(state): State<AppState>) -> Result<Json<Vec<CatalogEntity>>, ApiError> {
    Ok(Json(state.cities.find_all().await?))
}

/// get_city
///
/// [Public Route] Looks a city up by slug.
#[utoipa::path(
    get,
    path = "/cities/{slug}",
    params(("slug" = String, Path, description = "City slug")),
    responses(
        (status = 200, description = "Found", body = CatalogEntity),
        (status = 404, description = "No city with this slug", body = ErrorBody)
    )
)]
pub async fn get_city(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogEntity>, ApiError> {
    Ok(Json(state.cities.find_by_slug(&slug).await?))
}

/// update_city
///
/// [Admin Route] Partially updates a city. A new name moves the city to a new slug.
#[utoipa::path(
    patch,
    path = "/cities/{id}",
    params(("id" = Uuid, Path, description = "City ID")),
    request_body = UpdateEntityRequest,
    responses(
        (status = 200, description = "Updated", body = CatalogEntity),
        (status = 400, description = "Malformed id or body, invalid name or duplicate slug", body = ErrorBody),
        (status = 401, description = "No valid credential", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody),
        (status = 404, description = "No city with this id", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_city(
    AuthUser { identity, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateEntityRequest>, JsonRejection>,
) -> Result<Json<CatalogEntity>, ApiError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    tracing::debug!(actor = %identity.subject(), %id, "update city");
    Ok(Json(state.cities.update(id, payload).await?))
}

/// delete_city
///
/// [Admin Route] Permanently removes a city.
#[utoipa::path(
    delete,
    path = "/cities/{id}",
    params(("id" = Uuid, Path, description = "City ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed id or storage failure", body = ErrorBody),
        (status = 401, description = "No valid credential", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody),
        (status = 404, description = "No city with this id", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn delete_city(
    AuthUser { identity, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    tracing::debug!(actor = %identity.subject(), %id, "delete city");
    state.cities.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Categories ---
//
// Same contract as cities, but mutations are not role-gated.

/// create_category
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateEntityRequest,
    responses(
        (status = 201, description = "Created", body = CatalogEntity),
        (status = 400, description = "Malformed body, invalid name or duplicate slug", body = ErrorBody)
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CreateEntityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CatalogEntity>), ApiError> {
    let Json(payload) = payload?;
    let category = state.categories.create(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// list_categories
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "All categories", body = [CatalogEntity]),
        (status = 400, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CatalogEntity>>, ApiError> {
    Ok(Json(state.categories.find_all().await?))
}

/// get_category
#[utoipa::path(
    get,
    path = "/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Found", body = CatalogEntity),
        (status = 404, description = "No category with this slug", body = ErrorBody)
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogEntity>, ApiError> {
    Ok(Json(state.categories.find_by_slug(&slug).await?))
}

/// update_category
#[utoipa::path(
    patch,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateEntityRequest,
    responses(
        (status = 200, description = "Updated", body = CatalogEntity),
        (status = 400, description = "Malformed id or body, invalid name or duplicate slug", body = ErrorBody),
        (status = 404, description = "No category with this id", body = ErrorBody)
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateEntityRequest>, JsonRejection>,
) -> Result<Json<CatalogEntity>, ApiError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    Ok(Json(state.categories.update(id, payload).await?))
}

/// delete_category
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed id or storage failure", body = ErrorBody),
        (status = 404, description = "No category with this id", body = ErrorBody)
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.categories.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
