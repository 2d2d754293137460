//! Access-control core.
//!
//! A request to a gated route passes three steps before reaching its handler:
//! the [`CredentialVerifier`] turns the bearer token into an [`Identity`], the
//! [`RoleResolver`] maps that identity to a [`Role`], and the [`AccessGuard`]
//! compares the role with the one the route requires. The admitted caller is
//! then available to handlers through the [`AuthUser`] extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use thiserror::Error;
use uuid::Uuid;

use crate::{error::ApiError, models::Role};

pub mod guard;
pub mod resolver;
pub mod verifier;

pub use guard::{AccessGuard, AccessPolicy, access_guard, bearer_token};
pub use resolver::{RepositoryRoleResolver, ResolverState, RoleResolver};
pub use verifier::{Claims, CredentialVerifier, JwtVerifier, VerifierState};

/// Identity
///
/// The opaque subject carried by a verified credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity(Uuid);

impl Identity {
    pub fn new(subject: Uuid) -> Self {
        Self(subject)
    }

    pub fn subject(&self) -> Uuid {
        self.0
    }
}

/// Failures of the verifier and resolver. Callers only ever see a generic rejection.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Malformed, expired or wrongly signed token.
    #[error("invalid credential")]
    InvalidCredential,
    /// Verified subject with no provisioned role.
    #[error("unknown identity")]
    UnknownIdentity,
}

/// AuthUser
///
/// Request-scoped context inserted by the access guard once a caller has been
/// admitted to a gated route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub identity: Identity,
    pub role: Role,
}

/// Pulls the admitted caller out of the request extensions.
///
/// Only gated routes have one; using this extractor on a public route rejects
/// with 401 because the guard never ran a check there.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}
