//! Property-based tests for cache serialization.
//!
//! These tests use proptest to verify that serialization properties hold
//! for randomly generated inputs, catching edge cases that example-based
//! tests might miss.
//!
//! # Properties Tested
//!
//! 1. **Roundtrip Property**: deserialize(serialize(x)) == x for ANY x
//! 2. **Determinism Property**: serialize(x) == serialize(x) always
//! 3. **Envelope Property**: serialized bytes parse back into a valid
//!    envelope with the current magic and version
//! 4. **Key Property**: identical resource+params always build identical
//!    cache keys

use frontdesk_kit::key::ResourceKeyBuilder;
use frontdesk_kit::serialization::{
    deserialize_from_cache, serialize_for_cache, CacheEnvelope, CACHE_MAGIC,
    CURRENT_SCHEMA_VERSION,
};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Patient {
    id: u64,
    name: String,
    phone: String,
    active: bool,
}

fn arb_patient() -> impl Strategy<Value = Patient> {
    (
        any::<u64>(),
        any::<String>(),
        any::<String>(),
        any::<bool>(),
    )
        .prop_map(|(id, name, phone, active)| Patient {
            id,
            name,
            phone,
            active,
        })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct RecordPage {
    page: u32,
    total: i64,
    entries: Vec<String>,
    score: f64,
}

fn arb_record_page() -> impl Strategy<Value = RecordPage> {
    (
        any::<u32>(),
        any::<i64>(),
        prop::collection::vec(any::<String>(), 0..8),
        any::<f64>().prop_filter("finite", |f| f.is_finite()),
    )
        .prop_map(|(page, total, entries, score)| RecordPage {
            page,
            total,
            entries,
            score,
        })
}

proptest! {
    #[test]
    fn prop_patient_roundtrip(patient in arb_patient()) {
        let bytes = serialize_for_cache(&patient).expect("serialize failed");
        let back: Patient = deserialize_from_cache(&bytes).expect("deserialize failed");
        prop_assert_eq!(patient, back);
    }

    #[test]
    fn prop_record_page_roundtrip(page in arb_record_page()) {
        let bytes = serialize_for_cache(&page).expect("serialize failed");
        let back: RecordPage = deserialize_from_cache(&bytes).expect("deserialize failed");
        prop_assert_eq!(page, back);
    }

    #[test]
    fn prop_serialization_deterministic(patient in arb_patient()) {
        let a = serialize_for_cache(&patient).expect("serialize failed");
        let b = serialize_for_cache(&patient).expect("serialize failed");
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_envelope_carries_magic_and_version(patient in arb_patient()) {
        let bytes = serialize_for_cache(&patient).expect("serialize failed");
        let envelope: CacheEnvelope<Patient> =
            postcard::from_bytes(&bytes).expect("envelope parse failed");
        prop_assert_eq!(envelope.magic, CACHE_MAGIC);
        prop_assert_eq!(envelope.version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn prop_keys_deterministic(resource in "[a-z-]{1,16}", page in any::<u32>()) {
        let a = ResourceKeyBuilder::build(&resource, &page).expect("key build failed");
        let b = ResourceKeyBuilder::build(&resource, &page).expect("key build failed");
        prop_assert_eq!(&a, &b);
        prop_assert!(a.starts_with(&format!("{}:", resource)), "key should start with resource prefix");
    }

    #[test]
    fn prop_distinct_params_distinct_keys(resource in "[a-z-]{1,16}", a in any::<u32>(), b in any::<u32>()) {
        prop_assume!(a != b);
        let key_a = ResourceKeyBuilder::build(&resource, &a).expect("key build failed");
        let key_b = ResourceKeyBuilder::build(&resource, &b).expect("key build failed");
        prop_assert_ne!(key_a, key_b);
    }
}
