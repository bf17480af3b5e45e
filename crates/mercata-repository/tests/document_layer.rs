//! Document access-layer and storefront repository scenarios, end to end
//! against the in-memory document store.

use std::sync::Arc;
use std::sync::Once;

use mercata_repository::{
    AccessError, BypassAccessLayer, DocGuard, DocOutcome, DocumentAccessLayer, LegacyDocument,
    RequestContext, StorefrontRepository, codec,
};
use mercata_store::{DatabaseHandles, MemoryDocumentStore};
use mercata_types::{CatalogItem, DocFilter, Entity, Record, Storefront};
use serde_json::json;
use uuid::Uuid;

const STOREFRONTS: Entity = Entity::new("storefronts", "storefront");

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = mercata_observe::init_logging();
    });
}

fn layer() -> DocumentAccessLayer {
    init_logging();
    DocumentAccessLayer::new(Arc::new(MemoryDocumentStore::new()))
}

fn doc(value: serde_json::Value) -> Record {
    mercata_types::record_from_value(value).unwrap()
}

// ============================================================================
// SECTION: Access Layer
// ============================================================================

#[tokio::test]
async fn test_guarded_insert_is_a_noop_on_existing_document() {
    let layer = layer();
    let guard = DocGuard::new("slug", "fresh-farm");

    let first = layer
        .insert(STOREFRONTS, doc(json!({"slug": "fresh-farm"})), Some(guard.clone()))
        .await
        .unwrap();
    assert_eq!(first, DocOutcome::Inserted);

    let second = layer
        .insert(STOREFRONTS, doc(json!({"slug": "fresh-farm"})), Some(guard))
        .await
        .unwrap();
    assert_eq!(second, DocOutcome::SkippedExisting);

    let all = layer.fetch_many(STOREFRONTS, &DocFilter::new()).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_engine_id_is_stripped_from_every_read_path() {
    let layer = layer();
    layer.insert(STOREFRONTS, doc(json!({"slug": "a"})), None).await.unwrap();

    let one = layer.fetch_one(STOREFRONTS, &DocFilter::new()).await.unwrap().unwrap();
    assert!(!one.contains_key("_id"));

    let many = layer.fetch_many(STOREFRONTS, &DocFilter::new()).await.unwrap();
    assert!(many.iter().all(|record| !record.contains_key("_id")));

    let raw = layer.raw_find("storefronts", &DocFilter::new()).await.unwrap();
    assert!(raw.iter().all(|record| !record.contains_key("_id")));
}

#[tokio::test]
async fn test_update_guard_miss_reports_false() {
    let layer = layer();
    let filter = DocFilter::new().field("slug", "ghost");
    let mut changes = Record::new();
    changes.insert("published".to_string(), json!(true));

    let updated = layer
        .update(STOREFRONTS, &filter, changes, Some(DocGuard::new("slug", "ghost")))
        .await
        .unwrap();
    assert!(!updated);
}

#[tokio::test]
async fn test_update_with_empty_changes_short_circuits() {
    let layer = layer();
    // No document exists, yet the empty change set still reports success
    // because no driver call is made.
    let filter = DocFilter::new().field("slug", "ghost");
    let updated = layer.update(STOREFRONTS, &filter, Record::new(), None).await.unwrap();
    assert!(updated);
}

#[tokio::test]
async fn test_upsert_list_element_prepends_then_updates_in_place() {
    let layer = layer();
    layer
        .insert(STOREFRONTS, doc(json!({"slug": "fresh-farm", "catalog": []})), None)
        .await
        .unwrap();

    let mut data = Record::new();
    data.insert("price_cents".to_string(), json!(250));
    let matched = layer
        .upsert_list_element(
            STOREFRONTS,
            "slug",
            json!("fresh-farm"),
            "sku",
            json!("TOM-1"),
            "catalog",
            data,
        )
        .await
        .unwrap();
    assert!(matched);

    // Second upsert with the same SKU updates in place; the array stays at
    // length 1.
    let mut data = Record::new();
    data.insert("price_cents".to_string(), json!(300));
    layer
        .upsert_list_element(
            STOREFRONTS,
            "slug",
            json!("fresh-farm"),
            "sku",
            json!("TOM-1"),
            "catalog",
            data,
        )
        .await
        .unwrap();

    let found = layer.fetch_one(STOREFRONTS, &DocFilter::new()).await.unwrap().unwrap();
    let catalog = found.get("catalog").unwrap().as_array().unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].get("sku"), Some(&json!("TOM-1")));
    assert_eq!(catalog[0].get("price_cents"), Some(&json!(300)));
}

#[tokio::test]
async fn test_upsert_list_element_without_parent_matches_nothing() {
    let layer = layer();
    let matched = layer
        .upsert_list_element(
            STOREFRONTS,
            "slug",
            json!("ghost"),
            "sku",
            json!("TOM-1"),
            "catalog",
            Record::new(),
        )
        .await
        .unwrap();
    assert!(!matched);
}

#[tokio::test]
async fn test_exists_flips_after_delete() {
    let layer = layer();
    let filter = DocFilter::new().field("slug", "a");
    layer.insert(STOREFRONTS, doc(json!({"slug": "a"})), None).await.unwrap();
    assert!(layer.exists(STOREFRONTS, &filter).await.unwrap());

    assert!(layer.delete(STOREFRONTS, &filter).await.unwrap());
    assert!(!layer.exists(STOREFRONTS, &filter).await.unwrap());
    assert!(!layer.delete(STOREFRONTS, &filter).await.unwrap());
}

#[tokio::test]
async fn test_delete_many_reports_count() {
    let layer = layer();
    for slug in ["a", "b", "c"] {
        layer
            .insert(STOREFRONTS, doc(json!({"slug": slug, "published": true})), None)
            .await
            .unwrap();
    }
    let deleted = layer
        .delete_many(STOREFRONTS, &DocFilter::new().field("published", true))
        .await
        .unwrap();
    assert_eq!(deleted, 3);
}

#[tokio::test]
async fn test_raw_find_on_empty_collection_returns_empty() {
    let layer = layer();
    let found = layer.raw_find("nonexistent", &DocFilter::new()).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_bypass_layer_shares_the_operation_set() {
    init_logging();
    let store: Arc<MemoryDocumentStore> = Arc::new(MemoryDocumentStore::new());
    let bypass = BypassAccessLayer::new(store);

    bypass.insert(STOREFRONTS, doc(json!({"slug": "a"})), None).await.unwrap();
    assert!(bypass.exists(STOREFRONTS, &DocFilter::new().field("slug", "a")).await.unwrap());
}

// ============================================================================
// SECTION: Legacy Raising Adapters
// ============================================================================

#[tokio::test]
async fn test_legacy_document_adapters_raise_on_sentinels() {
    let layer = layer();
    let legacy = LegacyDocument::new(&layer);

    let miss = DocFilter::new().field("slug", "ghost");
    let result = legacy.get_one(STOREFRONTS, &miss).await;
    assert!(matches!(result, Err(AccessError::NotFound { .. })));

    layer.insert(STOREFRONTS, doc(json!({"slug": "a"})), None).await.unwrap();
    let result = legacy
        .create(STOREFRONTS, doc(json!({"slug": "a"})), Some(DocGuard::new("slug", "a")))
        .await;
    assert!(matches!(result, Err(AccessError::DuplicateFound { .. })));

    let mut changes = Record::new();
    changes.insert("published".to_string(), json!(true));
    let result = legacy
        .update(STOREFRONTS, &miss, changes, Some(DocGuard::new("slug", "ghost")))
        .await;
    assert!(matches!(result, Err(AccessError::UpdateFailed { .. })));
}

// ============================================================================
// SECTION: Storefront Repository
// ============================================================================

fn repository() -> StorefrontRepository {
    init_logging();
    let handles = DatabaseHandles::none().with_document(Arc::new(MemoryDocumentStore::new()));
    StorefrontRepository::new(&RequestContext::new(handles)).unwrap()
}

fn storefront(business_id: Uuid) -> Storefront {
    Storefront::builder()
        .business_id(business_id)
        .slug("fresh-farm")
        .display_name("Fresh Farm")
        .published(false)
        .build()
}

#[tokio::test]
async fn test_storefront_repository_requires_document_handle() {
    let context = RequestContext::new(DatabaseHandles::none());
    assert!(matches!(
        StorefrontRepository::new(&context),
        Err(AccessError::ConnectionFailed(_))
    ));
}

#[tokio::test]
async fn test_storefront_round_trip_decodes_business_id() {
    let repository = repository();
    let business_id = Uuid::new_v4();

    let outcome = repository.create(&storefront(business_id)).await.unwrap();
    assert_eq!(outcome, DocOutcome::Inserted);

    let found = repository.get_by_business(business_id).await.unwrap().unwrap();
    assert_eq!(found.business_id, business_id);
    assert_eq!(found.slug, "fresh-farm");
    assert!(found.catalog.is_empty());
}

#[tokio::test]
async fn test_storefront_create_is_guarded_per_business() {
    let repository = repository();
    let business_id = Uuid::new_v4();

    repository.create(&storefront(business_id)).await.unwrap();
    let second = repository.create(&storefront(business_id)).await.unwrap();
    assert_eq!(second, DocOutcome::SkippedExisting);
}

#[tokio::test]
async fn test_storefront_stores_encoded_identifier() {
    let repository = repository();
    let business_id = Uuid::new_v4();
    repository.create(&storefront(business_id)).await.unwrap();

    // The raw record carries the codec form, not the UUID text.
    let raw = repository.raw(&DocFilter::new()).await.unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].get("business_id"), Some(&codec::encode_uuid(business_id)));
}

#[tokio::test]
async fn test_storefront_publish_requires_existing_document() {
    let repository = repository();
    let business_id = Uuid::new_v4();

    assert!(!repository.publish(business_id, true).await.unwrap());

    repository.create(&storefront(business_id)).await.unwrap();
    assert!(repository.publish(business_id, true).await.unwrap());
    let found = repository.get_by_business(business_id).await.unwrap().unwrap();
    assert!(found.published);
}

#[tokio::test]
async fn test_storefront_catalog_upsert_keyed_on_sku() {
    let repository = repository();
    let business_id = Uuid::new_v4();
    repository.create(&storefront(business_id)).await.unwrap();

    let item = CatalogItem::builder()
        .sku("TOM-1")
        .title("Tomatoes")
        .unit("kg")
        .price_cents(250)
        .in_stock(true)
        .build();
    assert!(repository.upsert_catalog_item(business_id, &item).await.unwrap());

    let repriced = CatalogItem { price_cents: 300, ..item };
    assert!(repository.upsert_catalog_item(business_id, &repriced).await.unwrap());

    let found = repository.get_by_business(business_id).await.unwrap().unwrap();
    assert_eq!(found.catalog.len(), 1);
    assert_eq!(found.catalog[0].price_cents, 300);
    assert_eq!(found.catalog[0].sku, "TOM-1");
}

#[tokio::test]
async fn test_storefront_remove_flips_exists() {
    let repository = repository();
    let business_id = Uuid::new_v4();
    repository.create(&storefront(business_id)).await.unwrap();
    assert!(repository.exists(business_id).await.unwrap());

    assert!(repository.remove(business_id).await.unwrap());
    assert!(!repository.exists(business_id).await.unwrap());
    assert!(repository.get_by_business(business_id).await.unwrap().is_none());
}
