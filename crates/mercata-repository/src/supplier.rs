//! Repository for supplier businesses and their price quotes.
//!
//! Relational-backed: supplier accounts live in `supplier_business` (with the
//! delivery region stored in the `region_code` column) and quotes in the
//! append-only `price_quote` table. The current price of a product is its
//! most recent quote, served through the ranked fetch.

use mercata_types::{Entity, PriceQuote, SqlParams, StorageMapped, SupplierBusiness};
use uuid::Uuid;

use crate::{
    context::RequestContext,
    error::{AccessError, AccessResult},
    projection::{self, SpecialCasts},
    relational::{Guard, InsertOutcome, RelationalAccessLayer},
    sql::{Direction, Filter},
};

const SUPPLIERS: Entity = Entity::new("supplier_business", "supplier business");
const QUOTES: Entity = Entity::new("price_quote", "price quote");

const SUPPLIER_COLUMNS: &[&str] =
    &["id", "account_id", "name", "region_code", "contact_email", "phone", "active", "created_at"];

/// Repository for supplier business operations.
///
/// Created per request/operation; holds no state beyond the borrowed layer.
pub struct SupplierBusinessRepository {
    layer: RelationalAccessLayer,
}

impl SupplierBusinessRepository {
    /// Construct from a request context.
    ///
    /// # Errors
    ///
    /// Fails fast with [`AccessError::ConnectionFailed`] when the context has
    /// no SQL handle.
    pub fn new(context: &RequestContext) -> AccessResult<Self> {
        Ok(Self { layer: context.sql()? })
    }

    /// Create a supplier business, guarded so at most one business exists
    /// per account.
    pub async fn create(&self, business: &SupplierBusiness) -> AccessResult<InsertOutcome> {
        let values = SqlParams::new()
            .with("id", business.id)
            .with("account_id", business.account_id)
            .with("name", business.name.clone())
            .with("region_code", business.region.clone())
            .with("contact_email", business.contact_email.clone())
            .with("phone", business.phone.clone())
            .with("active", business.active)
            .with("created_at", business.created_at);
        let guard = Guard::new("account_id", business.account_id);
        self.layer.insert(SUPPLIERS, values, Some(guard)).await
    }

    /// Fetch a supplier business by id. Absence is `Ok(None)`.
    pub async fn get(&self, id: Uuid) -> AccessResult<Option<SupplierBusiness>> {
        let Some(record) = self.layer.fetch_one(SUPPLIERS, "id", id, SUPPLIER_COLUMNS).await?
        else {
            return Ok(None);
        };
        let business = projection::record_to_domain(&record, &Self::casts())
            .map_err(|e| AccessError::projection(SUPPLIERS, &e))?;
        Ok(Some(business))
    }

    /// Update contact details, guarded on the business existing.
    pub async fn update_contact(
        &self,
        id: Uuid,
        contact_email: &str,
        phone: Option<&str>,
    ) -> AccessResult<bool> {
        let changes = SqlParams::new()
            .with("contact_email", contact_email)
            .with("phone", phone.map(str::to_string));
        let filter = Filter::new().eq("id", id);
        self.layer.update(SUPPLIERS, changes, &filter, Some(Guard::new("id", id))).await
    }

    /// Active supplier businesses delivering to a region.
    pub async fn search_by_region(&self, region: &str) -> AccessResult<Vec<SupplierBusiness>> {
        let filter = Filter::new().eq("region_code", region).eq("active", true);
        let records = self.layer.find(SUPPLIERS, SUPPLIER_COLUMNS, &filter, None).await?;
        records
            .iter()
            .map(|record| {
                projection::record_to_domain(record, &Self::casts())
                    .map_err(|e| AccessError::projection(SUPPLIERS, &e))
            })
            .collect()
    }

    /// Whether a supplier business exists.
    pub async fn exists(&self, id: Uuid) -> AccessResult<bool> {
        self.layer.exists(SUPPLIERS, "id", id).await
    }

    /// Record a batch of quotes in one multi-row insert.
    pub async fn record_quotes(&self, quotes: &[PriceQuote]) -> AccessResult<()> {
        let rows = quotes
            .iter()
            .map(|quote| {
                SqlParams::new()
                    .with("id", quote.id)
                    .with("supplier_id", quote.supplier_id)
                    .with("product_code", quote.product_code.clone())
                    .with("unit", quote.unit.clone())
                    .with("unit_price_cents", quote.unit_price_cents)
                    .with("currency", quote.currency.clone())
                    .with("quoted_at", quote.quoted_at)
            })
            .collect();
        self.layer.bulk_insert(QUOTES, PriceQuote::FIELDS, rows).await
    }

    /// The most recent quote per product for one supplier.
    ///
    /// `quoted_at` carries microsecond resolution, which keeps the ranking
    /// deterministic.
    pub async fn latest_quotes(&self, supplier_id: Uuid) -> AccessResult<Vec<PriceQuote>> {
        let filter = Filter::new().eq("supplier_id", supplier_id);
        let records = self
            .layer
            .fetch_ranked(
                QUOTES,
                PriceQuote::FIELDS,
                "product_code",
                "quoted_at",
                Direction::Descending,
                &filter,
            )
            .await?;
        records
            .iter()
            .map(|record| {
                projection::record_to_domain(record, &SpecialCasts::new())
                    .map_err(|e| AccessError::projection(QUOTES, &e))
            })
            .collect()
    }

    fn casts() -> SpecialCasts {
        SpecialCasts::new().rename("region_code", "region")
    }
}
