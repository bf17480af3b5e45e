//! Projection round-trip properties.

use chrono::{DateTime, TimeZone, Utc};
use mercata_repository::{SpecialCasts, domain_to_record, record_to_domain};
use mercata_types::{PriceQuote, SupplierBusiness};
use proptest::prelude::*;
use serde_json::json;
use uuid::Uuid;

fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    // 2000-01-01 through ~2200, whole seconds.
    (946_684_800i64..7_258_118_400i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

prop_compose! {
    fn arb_business()(
        id in arb_uuid(),
        account_id in arb_uuid(),
        name in "[A-Za-z ]{1,40}",
        region in "[A-Z]{2}-[A-Z]{3,8}",
        contact_email in "[a-z]{1,12}@[a-z]{1,12}\\.example",
        phone in proptest::option::of("[0-9 +]{6,16}"),
        active in any::<bool>(),
        created_at in arb_timestamp(),
    ) -> SupplierBusiness {
        SupplierBusiness {
            id,
            account_id,
            name,
            region,
            contact_email,
            phone,
            active,
            created_at,
        }
    }
}

prop_compose! {
    fn arb_quote()(
        id in arb_uuid(),
        supplier_id in arb_uuid(),
        product_code in "[A-Z]{3}-[0-9]{1,3}",
        unit in "(kg|crate|litre)",
        unit_price_cents in 1i64..1_000_000,
        currency in "(EUR|GBP|USD)",
        quoted_at in arb_timestamp(),
    ) -> PriceQuote {
        PriceQuote { id, supplier_id, product_code, unit, unit_price_cents, currency, quoted_at }
    }
}

proptest! {
    #[test]
    fn prop_business_round_trip(original in arb_business()) {
        let record = domain_to_record(&original, &[]).unwrap();
        let restored: SupplierBusiness =
            record_to_domain(&record, &SpecialCasts::new()).unwrap();
        prop_assert_eq!(restored, original);
    }

    #[test]
    fn prop_quote_round_trip(original in arb_quote()) {
        let record = domain_to_record(&original, &[]).unwrap();
        let restored: PriceQuote = record_to_domain(&record, &SpecialCasts::new()).unwrap();
        prop_assert_eq!(restored, original);
    }

    #[test]
    fn prop_undeclared_keys_are_omitted(
        original in arb_quote(),
        extra in "[a-z_]{1,20}",
        noise in any::<i64>(),
    ) {
        prop_assume!(
            !<PriceQuote as mercata_types::StorageMapped>::FIELDS.contains(&extra.as_str())
        );
        let mut record = domain_to_record(&original, &[]).unwrap();
        record.insert(extra, json!(noise));
        let restored: PriceQuote = record_to_domain(&record, &SpecialCasts::new()).unwrap();
        prop_assert_eq!(restored, original);
    }
}
