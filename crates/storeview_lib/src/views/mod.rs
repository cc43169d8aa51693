//! Denormalized, display-ready views over a fetched record set.
//!
//! View builders are pure: they consume a [`crate::records::RecordSet`]
//! (and each other's outputs) and never fetch on their own, except for the
//! pod topology view which owns its three-hop traversal. Unresolved joins
//! degrade to raw identifiers or absent fields; only protocol-level
//! mismatches are errors.

mod materials;
mod orders;
mod pod;
mod recipes;

pub use materials::{build_materials, Material};
pub use orders::{build_orders, Order, OrderMaterial};
pub use pod::{build_pod_topology, PodTopology};
pub use recipes::{build_recipes, Recipe};

/// Serializes 256-bit integers as decimal strings; they do not fit a JSON
/// number.
pub(crate) mod u256_string {
    use alloy_primitives::U256;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }
}
