use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Access Control ---

/// Role
///
/// Closed set of privilege labels. Routes name the exact role they require;
/// there is no ordering between variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored role string is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// User
///
/// Provisioned identity record stored in the `profiles` table. The role is kept
/// as text so that a bad row surfaces as an unknown identity instead of a decode error.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct User {
    // Primary key, equal to the `sub` claim of the user's tokens.
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

// --- Catalog ---

/// CatalogKind
///
/// The entity types served by the catalog. Both share one shape and one contract;
/// the kind only selects the backing table and the wording of error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Category,
    City,
}

impl CatalogKind {
    pub fn table(&self) -> &'static str {
        match self {
            CatalogKind::Category => "categories",
            CatalogKind::City => "cities",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::Category => "Category",
            CatalogKind::City => "City",
        }
    }
}

/// CatalogEntity
///
/// A category or city row. `slug` always equals `slugify(name)` as of the last
/// successful write and is unique per kind.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct CatalogEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Insert payload handed to the repository once the slug has been derived.
#[derive(Debug, Clone)]
pub struct NewCatalogEntity {
    pub name: String,
    pub slug: String,
}

// --- Request Payloads ---

/// CreateEntityRequest
///
/// Body of `POST /cities` and `POST /categories`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateEntityRequest {
    #[schema(example = "New York City")]
    pub name: String,
}

/// UpdateEntityRequest
///
/// Partial update body for `PATCH /cities/{id}` and `PATCH /categories/{id}`.
/// Absent fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateEntityRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// LoginRequest
///
/// Body of `POST /auth/login`: a credential issued elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub token: String,
}

/// LoginResponse
///
/// Session payload returned once the credential has been verified and the caller's role resolved.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct LoginResponse {
    pub id: Uuid,
    pub role: Role,
    pub token: String,
}
