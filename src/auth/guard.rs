use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::Response,
};

use super::{AuthError, AuthUser, ResolverState, VerifierState};
use crate::{error::ApiError, models::Role};

/// AccessPolicy
///
/// Route metadata for the guard: which role, if any, a `(method, route template)`
/// pair requires. Templates use the router's own syntax, e.g. `/cities/{key}`.
/// Routes without an entry are public.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    rules: HashMap<(Method, String), Role>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `method route` may only be called by `role`.
    pub fn require(mut self, method: Method, route: &str, role: Role) -> Self {
        self.rules.insert((method, route.to_string()), role);
        self
    }

    pub fn required_role(&self, method: &Method, route: &str) -> Option<Role> {
        self.rules.get(&(method.clone(), route.to_string())).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// AccessGuard
///
/// Stateless admission check run in front of every routed handler.
/// The role comparison is exact: an admin is not implicitly allowed onto a
/// route that requires `Role::User`.
#[derive(Clone)]
pub struct AccessGuard {
    policy: Arc<AccessPolicy>,
    verifier: VerifierState,
    resolver: ResolverState,
}

impl AccessGuard {
    pub fn new(policy: AccessPolicy, verifier: VerifierState, resolver: ResolverState) -> Self {
        Self {
            policy: Arc::new(policy),
            verifier,
            resolver,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Decides whether a call to `method route` carrying `credential` may proceed.
    ///
    /// Returns `Ok(None)` for public routes (the credential is not even looked at),
    /// `Ok(Some(user))` for admitted callers of gated routes.
    ///
    /// # Errors
    /// [`ApiError::Unauthenticated`] when the credential is missing, fails
    /// verification or belongs to an unknown identity; [`ApiError::Forbidden`]
    /// when the resolved role differs from the required one.
    pub async fn authorize(
        &self,
        method: &Method,
        route: &str,
        credential: Option<&str>,
    ) -> Result<Option<AuthUser>, ApiError> {
        let Some(required) = self.policy.required_role(method, route) else {
            return Ok(None);
        };

        let token = credential.ok_or_else(|| {
            tracing::debug!(%method, route, "missing credential on gated route");
            ApiError::Unauthenticated
        })?;

        let identity = self.verifier.verify(token)?;
        let role = self
            .resolver
            .resolve_role(&identity)
            .await
            .inspect_err(|e: &AuthError| {
                tracing::debug!(subject = %identity.subject(), "role resolution failed: {}", e);
            })?;

        if role != required {
            tracing::info!(
                subject = %identity.subject(),
                %role,
                %required,
                %method,
                route,
                "caller lacks the required role"
            );
            return Err(ApiError::Forbidden);
        }

        Ok(Some(AuthUser { identity, role }))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// A header with any other scheme, or none, carries no usable credential.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// access_guard
///
/// Middleware wrapper around [`AccessGuard::authorize`]. Must be installed with
/// `route_layer` so that [`MatchedPath`] is already known. Admitted callers are
/// stored in the request extensions for the [`AuthUser`] extractor.
pub async fn access_guard(
    State(guard): State<AccessGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let credential = bearer_token(request.headers()).map(str::to_owned);

    let admitted = guard
        .authorize(request.method(), &route, credential.as_deref())
        .await?;

    if let Some(user) = admitted {
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}
