use std::sync::Arc;

use catalog_api::{
    CatalogService, InMemoryRepository, RepositoryState, StoreError,
    models::{CatalogKind, CreateEntityRequest, UpdateEntityRequest},
};
use tokio::task::JoinSet;
use uuid::Uuid;

fn service(kind: CatalogKind) -> (CatalogService, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::new());
    let state: RepositoryState = repo.clone();
    (CatalogService::new(kind, state), repo)
}

fn create(name: &str) -> CreateEntityRequest {
    CreateEntityRequest {
        name: name.to_string(),
    }
}

fn rename(name: &str) -> UpdateEntityRequest {
    UpdateEntityRequest {
        name: Some(name.to_string()),
    }
}

#[tokio::test]
async fn test_create_derives_slug_from_name() {
    let (cities, _) = service(CatalogKind::City);

    let city = cities.create(create("New York City!")).await.unwrap();
    assert_eq!(city.name, "New York City!");
    assert_eq!(city.slug, "new-york-city");
    assert_eq!(city.created_at, city.updated_at);

    let found = cities.find_by_slug("new-york-city").await.unwrap();
    assert_eq!(found, city);
}

#[tokio::test]
async fn test_create_rejects_colliding_slug() {
    let (cities, _) = service(CatalogKind::City);
    cities.create(create("San Francisco")).await.unwrap();

    let result = cities.create(create("san francisco")).await;
    assert!(matches!(result, Err(StoreError::Validation(_))));
    assert_eq!(cities.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_rejects_names_without_slug() {
    let (categories, _) = service(CatalogKind::Category);

    for name in ["", "   ", "!!!", "ßø"] {
        let result = categories.create(create(name)).await;
        assert!(
            matches!(result, Err(StoreError::Validation(_))),
            "name {name:?} should be rejected"
        );
    }
    assert!(categories.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_all_returns_creation_order() {
    let (cities, _) = service(CatalogKind::City);
    for name in ["Rome", "Madrid", "Athens"] {
        cities.create(create(name)).await.unwrap();
    }

    let slugs: Vec<String> = cities
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.slug)
        .collect();
    assert_eq!(slugs, vec!["rome", "madrid", "athens"]);
}

#[tokio::test]
async fn test_lookups_report_not_found() {
    let (cities, _) = service(CatalogKind::City);
    let id = Uuid::new_v4();

    assert_eq!(
        cities.find_by_id(id).await,
        Err(StoreError::NotFound(format!("City with id {} not found", id)))
    );
    assert_eq!(
        cities.find_by_slug("atlantis").await,
        Err(StoreError::NotFound("City with slug atlantis not found".to_string()))
    );
}

#[tokio::test]
async fn test_rename_recomputes_slug() {
    let (cities, _) = service(CatalogKind::City);
    let lyon = cities.create(create("Lyon")).await.unwrap();

    let paris = cities.update(lyon.id, rename("Paris")).await.unwrap();
    assert_eq!(paris.id, lyon.id);
    assert_eq!(paris.name, "Paris");
    assert_eq!(paris.slug, "paris");
    assert_eq!(paris.created_at, lyon.created_at);
    assert!(paris.updated_at >= lyon.updated_at);

    assert!(matches!(
        cities.find_by_slug("lyon").await,
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(cities.find_by_slug("paris").await.unwrap().id, lyon.id);
}

#[tokio::test]
async fn test_empty_update_keeps_name_and_slug() {
    let (cities, _) = service(CatalogKind::City);
    let berlin = cities.create(create("Berlin")).await.unwrap();

    let unchanged = cities
        .update(berlin.id, UpdateEntityRequest::default())
        .await
        .unwrap();
    assert_eq!(unchanged.name, "Berlin");
    assert_eq!(unchanged.slug, "berlin");
}

#[tokio::test]
async fn test_rename_onto_taken_slug_is_rejected() {
    let (cities, _) = service(CatalogKind::City);
    cities.create(create("Paris")).await.unwrap();
    let lyon = cities.create(create("Lyon")).await.unwrap();

    let result = cities.update(lyon.id, rename("PARIS")).await;
    assert!(matches!(result, Err(StoreError::Validation(_))));

    // The failed write left the entity untouched.
    assert_eq!(cities.find_by_id(lyon.id).await.unwrap().slug, "lyon");
}

#[tokio::test]
async fn test_rename_to_same_slug_is_allowed() {
    let (cities, _) = service(CatalogKind::City);
    let rome = cities.create(create("rome")).await.unwrap();

    let renamed = cities.update(rome.id, rename("Rome")).await.unwrap();
    assert_eq!(renamed.name, "Rome");
    assert_eq!(renamed.slug, "rome");
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let (cities, _) = service(CatalogKind::City);
    let result = cities.update(Uuid::new_v4(), rename("Nowhere")).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_remove_deletes_entity() {
    let (categories, _) = service(CatalogKind::Category);
    let category = categories.create(create("Museums")).await.unwrap();

    categories.remove(category.id).await.unwrap();

    assert!(matches!(
        categories.find_by_id(category.id).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        categories.remove(category.id).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_removed_slug_can_be_reused() {
    let (cities, _) = service(CatalogKind::City);
    let first = cities.create(create("Oslo")).await.unwrap();
    cities.remove(first.id).await.unwrap();

    let second = cities.create(create("Oslo")).await.unwrap();
    assert_eq!(second.slug, "oslo");
    assert_ne!(second.id, first.id);
}

#[tokio::test]
async fn test_kinds_share_repository_but_not_slugs() {
    let repo: RepositoryState = Arc::new(InMemoryRepository::new());
    let cities = CatalogService::new(CatalogKind::City, repo.clone());
    let categories = CatalogService::new(CatalogKind::Category, repo);

    let city = cities.create(create("Paris")).await.unwrap();
    let category = categories.create(create("Paris")).await.unwrap();

    assert_eq!(city.slug, category.slug);
    assert!(matches!(
        categories.find_by_id(city.id).await,
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(cities.kind(), CatalogKind::City);
}

#[tokio::test]
async fn test_storage_failure_is_validation_error() {
    let (cities, repo) = service(CatalogKind::City);
    let rome = cities.create(create("Rome")).await.unwrap();
    repo.set_failing(true);

    assert!(matches!(cities.find_all().await, Err(StoreError::Validation(_))));
    assert!(matches!(
        cities.create(create("Madrid")).await,
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        cities.find_by_slug("rome").await,
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        cities.update(rome.id, rename("Milan")).await,
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        cities.remove(rome.id).await,
        Err(StoreError::Validation(_))
    ));

    repo.set_failing(false);
    assert_eq!(cities.find_by_id(rome.id).await.unwrap(), rome);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_admit_one_slug_owner() {
    const ATTEMPTS: usize = 16;
    let (cities, _) = service(CatalogKind::City);

    let mut tasks = JoinSet::new();
    for _ in 0..ATTEMPTS {
        let cities = cities.clone();
        tasks.spawn(async move { cities.create(create("Paris")).await });
    }
    let results = tasks.join_all().await;

    let created = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::Validation(_))))
        .count();
    assert_eq!(created, 1);
    assert_eq!(rejected, ATTEMPTS - 1);
    assert_eq!(cities.find_all().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_renames_onto_one_slug_admit_one() {
    let (cities, _) = service(CatalogKind::City);
    let lyon = cities.create(create("Lyon")).await.unwrap();
    let nice = cities.create(create("Nice")).await.unwrap();

    let mut tasks = JoinSet::new();
    for id in [lyon.id, nice.id] {
        let cities = cities.clone();
        tasks.spawn(async move { cities.update(id, rename("Paris")).await });
    }
    let outcomes = tasks.join_all().await;

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(StoreError::Validation(_))))
            .count(),
        1
    );

    let slugs: Vec<String> = cities
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.slug)
        .collect();
    assert_eq!(slugs.iter().filter(|s| s.as_str() == "paris").count(), 1);
}
