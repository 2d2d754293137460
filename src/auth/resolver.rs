use std::sync::Arc;

use async_trait::async_trait;

use super::{AuthError, Identity};
use crate::{models::Role, repository::RepositoryState};

/// RoleResolver
///
/// Maps a verified identity to its role. Fails with [`AuthError::UnknownIdentity`]
/// when the identity was never provisioned or has been removed.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    async fn resolve_role(&self, identity: &Identity) -> Result<Role, AuthError>;
}

pub type ResolverState = Arc<dyn RoleResolver>;

/// RepositoryRoleResolver
///
/// Reads the role from the user's `profiles` row on every call, so a revoked
/// user loses access as soon as the row is gone even if their token is still valid.
#[derive(Clone)]
pub struct RepositoryRoleResolver {
    repo: RepositoryState,
}

impl RepositoryRoleResolver {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl RoleResolver for RepositoryRoleResolver {
    async fn resolve_role(&self, identity: &Identity) -> Result<Role, AuthError> {
        let user = match self.repo.get_user(identity.subject()).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AuthError::UnknownIdentity),
            Err(e) => {
                tracing::error!(subject = %identity.subject(), "role lookup failed: {}", e);
                return Err(AuthError::UnknownIdentity);
            }
        };

        user.role.parse().map_err(|_| {
            tracing::warn!(subject = %user.id, role = %user.role, "profile carries an unknown role");
            AuthError::UnknownIdentity
        })
    }
}
