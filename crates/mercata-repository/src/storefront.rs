//! Repository for ecommerce storefront documents.
//!
//! Document-backed: one storefront document per supplier business, keyed on
//! the codec-encoded business id, with the product catalog embedded as an
//! array of items keyed on SKU.

use mercata_types::{CatalogItem, DocFilter, Entity, Record, Storefront};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    codec,
    context::RequestContext,
    document::{DocGuard, DocOutcome, DocumentAccessLayer},
    error::{AccessError, AccessResult},
    projection::{self, SpecialCasts},
};

const STOREFRONTS: Entity = Entity::new("storefronts", "storefront");

/// Repository for storefront document operations.
///
/// Created per request/operation; holds no state beyond the borrowed layer.
pub struct StorefrontRepository {
    layer: DocumentAccessLayer,
}

impl StorefrontRepository {
    /// Construct from a request context.
    ///
    /// # Errors
    ///
    /// Fails fast with [`AccessError::ConnectionFailed`] when the context has
    /// no document handle.
    pub fn new(context: &RequestContext) -> AccessResult<Self> {
        Ok(Self { layer: context.documents()? })
    }

    /// Create a storefront, guarded so at most one exists per business.
    pub async fn create(&self, storefront: &Storefront) -> AccessResult<DocOutcome> {
        let encoded = codec::encode_uuid(storefront.business_id);
        let mut document = projection::domain_to_record(storefront, &["business_id"])
            .map_err(|e| AccessError::projection(STOREFRONTS, &e))?;
        document.insert("business_id".to_string(), encoded.clone());
        let guard = DocGuard::new("business_id", encoded);
        self.layer.insert(STOREFRONTS, document, Some(guard)).await
    }

    /// Fetch the storefront of a business, decoding the stored identifier.
    /// Absence is `Ok(None)`.
    pub async fn get_by_business(&self, business_id: Uuid) -> AccessResult<Option<Storefront>> {
        let filter = Self::by_business(business_id);
        let Some(record) = self.layer.fetch_one(STOREFRONTS, &filter).await? else {
            return Ok(None);
        };
        let storefront = projection::record_to_domain(&record, &Self::casts())
            .map_err(|e| AccessError::projection(STOREFRONTS, &e))?;
        Ok(Some(storefront))
    }

    /// Set the published flag, guarded on the storefront existing.
    pub async fn publish(&self, business_id: Uuid, published: bool) -> AccessResult<bool> {
        let encoded = codec::encode_uuid(business_id);
        let filter = DocFilter::new().field("business_id", encoded.clone());
        let mut changes = Record::new();
        changes.insert("published".to_string(), json!(published));
        let guard = DocGuard::new("business_id", encoded);
        self.layer.update(STOREFRONTS, &filter, changes, Some(guard)).await
    }

    /// Insert or update one catalog item, keyed on SKU.
    ///
    /// An existing item with the same SKU is updated in place; otherwise the
    /// item is prepended to the catalog.
    pub async fn upsert_catalog_item(
        &self,
        business_id: Uuid,
        item: &CatalogItem,
    ) -> AccessResult<bool> {
        let data = projection::domain_to_record(item, &["sku"])
            .map_err(|e| AccessError::projection(STOREFRONTS, &e))?;
        self.layer
            .upsert_list_element(
                STOREFRONTS,
                "business_id",
                codec::encode_uuid(business_id),
                "sku",
                json!(item.sku),
                "catalog",
                data,
            )
            .await
    }

    /// Whether a business has a storefront.
    pub async fn exists(&self, business_id: Uuid) -> AccessResult<bool> {
        self.layer.exists(STOREFRONTS, &Self::by_business(business_id)).await
    }

    /// Delete the storefront of a business. Returns whether one was deleted.
    pub async fn remove(&self, business_id: Uuid) -> AccessResult<bool> {
        self.layer.delete(STOREFRONTS, &Self::by_business(business_id)).await
    }

    /// Passthrough find for administrative tooling, `_id`-stripped.
    pub async fn raw(&self, filter: &DocFilter) -> AccessResult<Vec<Record>> {
        self.layer.raw_find(STOREFRONTS.table, filter).await
    }

    fn by_business(business_id: Uuid) -> DocFilter {
        DocFilter::new().field("business_id", codec::encode_uuid(business_id))
    }

    fn casts() -> SpecialCasts {
        SpecialCasts::new().map("business_id", "business_id", |value| {
            match codec::decode_uuid(value) {
                Ok(id) => Value::String(id.to_string()),
                Err(_) => value.clone(),
            }
        })
    }
}
