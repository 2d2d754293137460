//! Resource store for catalog entities.
//!
//! [`CatalogService`] owns the lifecycle of categories and cities: it derives
//! slugs, merges partial updates and translates persistence failures into the
//! two outcomes callers care about. `NotFound` means the key has no live entity;
//! `Validation` means the write (or read) was rejected.

use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        CatalogEntity, CatalogKind, CreateEntityRequest, NewCatalogEntity, UpdateEntityRequest,
    },
    repository::{RepositoryError, RepositoryState},
    slug::slugify,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        StoreError::Validation(err.to_string())
    }
}

/// CatalogService
///
/// One instance per [`CatalogKind`]; both share the same repository handle.
#[derive(Clone)]
pub struct CatalogService {
    kind: CatalogKind,
    repo: RepositoryState,
}

impl CatalogService {
    pub fn new(kind: CatalogKind, repo: RepositoryState) -> Self {
        Self { kind, repo }
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    /// Persists a new entity whose slug is derived from `input.name`.
    ///
    /// A slug already taken by another entity of this kind is rejected by the
    /// repository's unique constraint and surfaces as [`StoreError::Validation`].
    pub async fn create(&self, input: CreateEntityRequest) -> Result<CatalogEntity, StoreError> {
        let slug = derive_slug(&input.name)?;
        let entity = self
            .repo
            .insert(
                self.kind,
                NewCatalogEntity {
                    name: input.name,
                    slug,
                },
            )
            .await
            .map_err(|e| self.storage_failure("create", e))?;

        tracing::info!(kind = self.kind.label(), id = %entity.id, slug = %entity.slug, "entity created");
        Ok(entity)
    }

    pub async fn find_all(&self) -> Result<Vec<CatalogEntity>, StoreError> {
        self.repo
            .find_all(self.kind)
            .await
            .map_err(|e| self.storage_failure("find_all", e))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<CatalogEntity, StoreError> {
        self.repo
            .find_by_id(self.kind, id)
            .await
            .map_err(|e| self.storage_failure("find_by_id", e))?
            .ok_or_else(|| {
                StoreError::NotFound(format!("{} with id {} not found", self.kind.label(), id))
            })
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<CatalogEntity, StoreError> {
        self.repo
            .find_by_slug(self.kind, slug)
            .await
            .map_err(|e| self.storage_failure("find_by_slug", e))?
            .ok_or_else(|| {
                StoreError::NotFound(format!("{} with slug {} not found", self.kind.label(), slug))
            })
    }

    /// Merges the supplied fields into the stored entity.
    ///
    /// The slug is recomputed only when `partial.name` is present, so an empty
    /// patch leaves the entity's address untouched.
    pub async fn update(
        &self,
        id: Uuid,
        partial: UpdateEntityRequest,
    ) -> Result<CatalogEntity, StoreError> {
        let mut entity = self.find_by_id(id).await?;

        if let Some(name) = partial.name {
            entity.slug = derive_slug(&name)?;
            entity.name = name;
        }

        let updated = self
            .repo
            .update(self.kind, &entity)
            .await
            .map_err(|e| self.storage_failure("update", e))?
            // Deleted between the existence check and the write.
            .ok_or_else(|| {
                StoreError::NotFound(format!("{} with id {} not found", self.kind.label(), id))
            })?;

        tracing::info!(kind = self.kind.label(), %id, slug = %updated.slug, "entity updated");
        Ok(updated)
    }

    /// Deletes an entity after confirming it exists.
    pub async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        let entity = self.find_by_id(id).await?;

        let deleted = self
            .repo
            .delete(self.kind, entity.id)
            .await
            .map_err(|e| self.storage_failure("remove", e))?;

        if !deleted {
            tracing::warn!(kind = self.kind.label(), %id, "entity vanished before delete");
            return Err(StoreError::NotFound(format!(
                "{} with id {} not found",
                self.kind.label(),
                id
            )));
        }
        tracing::info!(kind = self.kind.label(), %id, "entity removed");
        Ok(())
    }

    fn storage_failure(&self, operation: &'static str, err: RepositoryError) -> StoreError {
        match &err {
            RepositoryError::UniqueViolation { .. } => {
                tracing::warn!(kind = self.kind.label(), operation, "write rejected: {}", err)
            }
            RepositoryError::Database(_) => {
                tracing::error!(kind = self.kind.label(), operation, "storage failure: {}", err)
            }
        }
        StoreError::from(err)
    }
}

/// Validates a user-supplied name and returns its slug.
fn derive_slug(name: &str) -> Result<String, StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("name must not be empty".to_string()));
    }
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(StoreError::Validation(
            "name must contain at least one ASCII letter or digit".to_string(),
        ));
    }
    Ok(slug)
}
