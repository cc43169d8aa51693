//! Content-addressed combination ids for materials.
//!
//! A recipe's input is keyed by the keccak-256 digest of raw material id
//! bytes: one 14-byte id for a single-material input, two concatenated ids
//! for a pair. Pairs are hashed in byte-lexicographic order of the two ids,
//! so a pair's id never depends on argument order. The scheme has to match
//! the on-chain recipe registration exactly; a mismatch does not fail
//! loudly, it just leaves recipe inputs unresolved in the output.

use alloy_primitives::keccak256;
use storeview_common_types::{CombinationId, HexString, MaterialId};

/// Combination id of a single material.
pub fn single_id(material: &MaterialId) -> CombinationId {
    HexString(keccak256(material.as_bytes()).0)
}

/// Orders two material ids byte-lexicographically. Pair hashing and pair
/// rendering both go through this, so a recipe's displayed ingredients
/// appear in the order that was hashed.
pub fn canonical_pair<'a>(
    a: &'a MaterialId,
    b: &'a MaterialId,
) -> (&'a MaterialId, &'a MaterialId) {
    if a.as_bytes() <= b.as_bytes() {
        (a, b)
    } else {
        (b, a)
    }
}

/// Combination id of an unordered pair of materials.
pub fn pair_id(a: &MaterialId, b: &MaterialId) -> CombinationId {
    let (first, second) = canonical_pair(a, b);
    let mut packed = [0u8; 28];
    packed[..14].copy_from_slice(first.as_bytes());
    packed[14..].copy_from_slice(second.as_bytes());
    HexString(keccak256(packed).0)
}

#[cfg(test)]
mod tests {
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    use super::*;

    /// Folds arbitrary bytes into a material id so properties do not depend
    /// on quickcheck supporting fixed-size arrays.
    fn material_id(seed: &[u8]) -> MaterialId {
        let mut id = [0u8; 14];
        for (i, byte) in seed.iter().enumerate() {
            id[i % 14] ^= byte;
        }
        HexString(id)
    }

    #[quickcheck]
    fn pair_id_is_order_invariant(a: Vec<u8>, b: Vec<u8>) -> bool {
        let (a, b) = (material_id(&a), material_id(&b));
        pair_id(&a, &b) == pair_id(&b, &a)
    }

    #[quickcheck]
    fn single_and_pair_ids_differ(a: Vec<u8>, b: Vec<u8>) -> TestResult {
        let (a, b) = (material_id(&a), material_id(&b));
        if a == b {
            return TestResult::discard();
        }
        TestResult::from_bool(single_id(&a) != pair_id(&a, &b))
    }

    #[quickcheck]
    fn ids_are_deterministic(a: Vec<u8>, b: Vec<u8>) -> bool {
        let (a, b) = (material_id(&a), material_id(&b));
        single_id(&a) == single_id(&a) && pair_id(&a, &b) == pair_id(&a, &b)
    }

    #[test]
    fn canonical_pair_orders_by_raw_bytes() {
        let low = HexString([0x01; 14]);
        let high = HexString([0x02; 14]);

        assert_eq!(canonical_pair(&high, &low), (&low, &high));
        assert_eq!(canonical_pair(&low, &high), (&low, &high));
    }

    #[quickcheck]
    fn distinct_materials_get_distinct_single_ids(a: Vec<u8>, b: Vec<u8>) -> TestResult {
        let (a, b) = (material_id(&a), material_id(&b));
        if a == b {
            return TestResult::discard();
        }
        TestResult::from_bool(single_id(&a) != single_id(&b))
    }
}
