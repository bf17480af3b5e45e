//! Sample marketplace domain types.
//!
//! These are the entities exercised by the concrete repositories: a supplier
//! business with its price quotes on the relational side, and an ecommerce
//! storefront with an embedded product catalog on the document side. The wider
//! marketplace domain model lives with the handlers that own it; only the
//! types the access layer ships repositories for are defined here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StorageMapped;

/// A supplier business account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
#[builder(on(String, into))]
pub struct SupplierBusiness {
    pub id: Uuid,
    /// The owning account. At most one business exists per account.
    pub account_id: Uuid,
    pub name: String,
    /// Delivery region, stored in the `region_code` column.
    pub region: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl StorageMapped for SupplierBusiness {
    const FIELDS: &'static [&'static str] =
        &["id", "account_id", "name", "region", "contact_email", "phone", "active", "created_at"];
}

/// A price quote issued by a supplier for one product.
///
/// Quotes are append-only; the current price of a product is the most recent
/// quote. `quoted_at` carries microsecond resolution so the ranked fetch has
/// a deterministic ordering key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
#[builder(on(String, into))]
pub struct PriceQuote {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub product_code: String,
    pub unit: String,
    pub unit_price_cents: i64,
    pub currency: String,
    pub quoted_at: DateTime<Utc>,
}

impl StorageMapped for PriceQuote {
    const FIELDS: &'static [&'static str] =
        &["id", "supplier_id", "product_code", "unit", "unit_price_cents", "currency", "quoted_at"];
}

/// One product entry embedded in a storefront's catalog array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
#[builder(on(String, into))]
pub struct CatalogItem {
    pub sku: String,
    pub title: String,
    pub unit: String,
    pub price_cents: i64,
    pub in_stock: bool,
}

impl StorageMapped for CatalogItem {
    const FIELDS: &'static [&'static str] = &["sku", "title", "unit", "price_cents", "in_stock"];
}

/// An ecommerce storefront document.
///
/// Stored in the document backend keyed by the binary-encoded business id,
/// with the product catalog embedded as an array of [`CatalogItem`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bon::Builder)]
#[builder(on(String, into))]
pub struct Storefront {
    pub business_id: Uuid,
    pub slug: String,
    pub display_name: String,
    pub published: bool,
    #[builder(default)]
    pub catalog: Vec<CatalogItem>,
}

impl StorageMapped for Storefront {
    const FIELDS: &'static [&'static str] =
        &["business_id", "slug", "display_name", "published", "catalog"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplier_business_builder() {
        let business = SupplierBusiness::builder()
            .id(Uuid::new_v4())
            .account_id(Uuid::new_v4())
            .name("Fresh Farm Produce")
            .region("EU-WEST")
            .contact_email("orders@freshfarm.example")
            .active(true)
            .created_at(Utc::now())
            .build();
        assert_eq!(business.name, "Fresh Farm Produce");
        assert!(business.phone.is_none());
    }

    #[test]
    fn test_storefront_builder_defaults_empty_catalog() {
        let storefront = Storefront::builder()
            .business_id(Uuid::new_v4())
            .slug("fresh-farm")
            .display_name("Fresh Farm")
            .published(false)
            .build();
        assert!(storefront.catalog.is_empty());
    }

    #[test]
    fn test_declared_fields_match_serde_names() {
        let quote = PriceQuote::builder()
            .id(Uuid::new_v4())
            .supplier_id(Uuid::new_v4())
            .product_code("TOM-1")
            .unit("kg")
            .unit_price_cents(250)
            .currency("EUR")
            .quoted_at(Utc::now())
            .build();
        let value = serde_json::to_value(&quote).unwrap();
        let object = value.as_object().unwrap();
        for field in PriceQuote::FIELDS {
            assert!(object.contains_key(*field), "missing serde field {field}");
        }
        assert_eq!(object.len(), PriceQuote::FIELDS.len());
    }
}
