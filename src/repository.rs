use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{CatalogEntity, CatalogKind, NewCatalogEntity, User};

/// Failures reported by a persistence adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A unique constraint rejected the write (in practice: a duplicate slug).
    #[error("duplicate value violates unique constraint \"{constraint}\"")]
    UniqueViolation { constraint: String },
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::UniqueViolation {
                    constraint: db.constraint().unwrap_or("unique").to_string(),
                }
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

/// Repository Trait
///
/// The persistence collaborator behind the catalog store and the role resolver.
/// Uniqueness of `slug` per kind is enforced here, atomically with the write,
/// so concurrent creates of the same name cannot both succeed.
///
/// `Send + Sync + async_trait` make `Arc<dyn Repository>` shareable across Axum tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Catalog ---
    async fn insert(
        &self,
        kind: CatalogKind,
        entity: NewCatalogEntity,
    ) -> Result<CatalogEntity, RepositoryError>;
    async fn find_all(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, RepositoryError>;
    async fn find_by_id(
        &self,
        kind: CatalogKind,
        id: Uuid,
    ) -> Result<Option<CatalogEntity>, RepositoryError>;
    async fn find_by_slug(
        &self,
        kind: CatalogKind,
        slug: &str,
    ) -> Result<Option<CatalogEntity>, RepositoryError>;
    /// Writes `name` and `slug` of an existing row. `None` if the row vanished.
    async fn update(
        &self,
        kind: CatalogKind,
        entity: &CatalogEntity,
    ) -> Result<Option<CatalogEntity>, RepositoryError>;
    /// Returns whether a row was deleted.
    async fn delete(&self, kind: CatalogKind, id: Uuid) -> Result<bool, RepositoryError>;

    // --- Identity ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
}

/// RepositoryState
///
/// Shared handle to the persistence layer held in the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Table names come from [`CatalogKind::table`],
/// never from request input; every value is bound.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ENTITY_COLUMNS: &str = "id, name, slug, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn insert(
        &self,
        kind: CatalogKind,
        entity: NewCatalogEntity,
    ) -> Result<CatalogEntity, RepositoryError> {
        let query = format!(
            "INSERT INTO {} (id, name, slug, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) RETURNING {}",
            kind.table(),
            ENTITY_COLUMNS
        );
        let row = sqlx::query_as::<_, CatalogEntity>(&query)
            .bind(Uuid::new_v4())
            .bind(&entity.name)
            .bind(&entity.slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_all(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY created_at ASC, id ASC",
            ENTITY_COLUMNS,
            kind.table()
        );
        let rows = sqlx::query_as::<_, CatalogEntity>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(
        &self,
        kind: CatalogKind,
        id: Uuid,
    ) -> Result<Option<CatalogEntity>, RepositoryError> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", ENTITY_COLUMNS, kind.table());
        let row = sqlx::query_as::<_, CatalogEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_slug(
        &self,
        kind: CatalogKind,
        slug: &str,
    ) -> Result<Option<CatalogEntity>, RepositoryError> {
        let query = format!("SELECT {} FROM {} WHERE slug = $1", ENTITY_COLUMNS, kind.table());
        let row = sqlx::query_as::<_, CatalogEntity>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(
        &self,
        kind: CatalogKind,
        entity: &CatalogEntity,
    ) -> Result<Option<CatalogEntity>, RepositoryError> {
        let query = format!(
            "UPDATE {} SET name = $2, slug = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
            kind.table(),
            ENTITY_COLUMNS
        );
        let row = sqlx::query_as::<_, CatalogEntity>(&query)
            .bind(entity.id)
            .bind(&entity.name)
            .bind(&entity.slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete(&self, kind: CatalogKind, id: Uuid) -> Result<bool, RepositoryError> {
        let query = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

/// InMemoryRepository
///
/// `Repository` kept in process memory, used by the test suite and for local
/// experiments without Postgres. Each write holds the table lock across its
/// uniqueness check and mutation, matching the atomicity of a unique index.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<HashMap<CatalogKind, Vec<CatalogEntity>>>,
    users: RwLock<HashMap<Uuid, User>>,
    /// When true, every operation returns a simulated database failure.
    failing: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a provisioned user for role resolution.
    pub fn with_user(mut self, user: User) -> Self {
        self.users.get_mut().insert(user.id, user);
        self
    }

    /// Toggles simulated storage outages.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(
                "simulated storage failure".to_string(),
            ));
        }
        Ok(())
    }

    fn slug_constraint(kind: CatalogKind) -> String {
        format!("{}_slug_key", kind.table())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(
        &self,
        kind: CatalogKind,
        entity: NewCatalogEntity,
    ) -> Result<CatalogEntity, RepositoryError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(kind).or_default();

        if rows.iter().any(|row| row.slug == entity.slug) {
            return Err(RepositoryError::UniqueViolation {
                constraint: Self::slug_constraint(kind),
            });
        }

        let now = Utc::now();
        let row = CatalogEntity {
            id: Uuid::new_v4(),
            name: entity.name,
            slug: entity.slug,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_all(&self, kind: CatalogKind) -> Result<Vec<CatalogEntity>, RepositoryError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.get(&kind).cloned().unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        kind: CatalogKind,
        id: Uuid,
    ) -> Result<Option<CatalogEntity>, RepositoryError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&kind)
            .and_then(|rows| rows.iter().find(|row| row.id == id).cloned()))
    }

    async fn find_by_slug(
        &self,
        kind: CatalogKind,
        slug: &str,
    ) -> Result<Option<CatalogEntity>, RepositoryError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&kind)
            .and_then(|rows| rows.iter().find(|row| row.slug == slug).cloned()))
    }

    async fn update(
        &self,
        kind: CatalogKind,
        entity: &CatalogEntity,
    ) -> Result<Option<CatalogEntity>, RepositoryError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(kind).or_default();

        if rows
            .iter()
            .any(|row| row.id != entity.id && row.slug == entity.slug)
        {
            return Err(RepositoryError::UniqueViolation {
                constraint: Self::slug_constraint(kind),
            });
        }

        Ok(rows.iter_mut().find(|row| row.id == entity.id).map(|row| {
            row.name = entity.name.clone();
            row.slug = entity.slug.clone();
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn delete(&self, kind: CatalogKind, id: Uuid) -> Result<bool, RepositoryError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(kind).or_default();
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() < before)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        self.check_available()?;
        Ok(self.users.read().await.get(&id).cloned())
    }
}
