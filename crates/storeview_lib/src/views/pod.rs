use serde::Serialize;
use storeview_common_types::{address_to_entity_id, Address, Bytes32, HexString};
use storeview_indexer_client::LogSource;
use tracing::*;

use crate::decode::Value;
use crate::records::{fetch_records, FetchError, RecordSet};
use crate::schema::{resolve_enum_label, world, MACHINE_TYPE_ENUM};

/// The machines a pod carries, resolved to machine-kind labels. A broken
/// link leaves the rest of the traversal unset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTopology {
    pub address: Address,
    pub pod_id: Option<Bytes32>,
    pub machines_in_pod: Option<Vec<Option<&'static str>>>,
}

/// Resolves the pod an address is carried by and the kinds of the machines
/// inside it: address → pod → machine list → machine kind labels. Each hop
/// is a linear scan over a full fetch of one table.
pub async fn build_pod_topology(
    source: &dyn LogSource,
    address: Address,
) -> Result<PodTopology, FetchError> {
    // Pods are keyed by the carrying account's address, widened to the
    // store's 32-byte key.
    let entity_id = address_to_entity_id(&address);

    let carried_by = fetch_records(source, &[&world().carried_by]).await?;
    let pod_id = carried_by
        .find(&world().carried_by, |r| {
            r.field("id").and_then(Value::as_bytes) == Some(entity_id.as_bytes())
        })
        .and_then(|r| r.field("value"))
        .and_then(Value::as_bytes)
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok().map(HexString));

    let Some(pod_id) = pod_id else {
        debug!(%address, "address is not carried by any pod");
        return Ok(PodTopology {
            address,
            pod_id: None,
            machines_in_pod: None,
        });
    };

    let machines = fetch_records(source, &[&world().machines_in_pod]).await?;
    let machine_ids = machines
        .find(&world().machines_in_pod, |r| {
            r.field("id").and_then(Value::as_bytes) == Some(pod_id.as_bytes())
        })
        .and_then(|r| r.field("value"))
        .and_then(Value::as_array)
        .map(|elements| {
            elements
                .iter()
                .filter_map(Value::as_bytes)
                .map(<[u8]>::to_vec)
                .collect::<Vec<_>>()
        });

    let Some(machine_ids) = machine_ids else {
        return Ok(PodTopology {
            address,
            pod_id: Some(pod_id),
            machines_in_pod: None,
        });
    };

    let machine_types = fetch_records(source, &[&world().machine_type]).await?;
    let labels = machine_ids
        .iter()
        .map(|machine_id| machine_kind_label(&machine_types, machine_id))
        .collect();

    Ok(PodTopology {
        address,
        pod_id: Some(pod_id),
        machines_in_pod: Some(labels),
    })
}

/// A machine with no machine-type record, or one outside the enum, leaves
/// its slot unset rather than failing the request.
fn machine_kind_label(machine_types: &RecordSet, machine_id: &[u8]) -> Option<&'static str> {
    let record = machine_types.find(&world().machine_type, |r| {
        r.field("id").and_then(Value::as_bytes) == Some(machine_id)
    })?;
    let index = record.field("machine").and_then(Value::as_enum_index)?;
    resolve_enum_label(MACHINE_TYPE_ENUM, index).ok()
}
