use std::collections::HashMap;

use alloy_primitives::U256;
use serde::Serialize;
use storeview_common_types::{Address, Bytes32, MaterialId};

use crate::decode::{DecodeError, Value};
use crate::records::RecordSet;
use crate::schema::{resolve_enum_label, world, MATERIAL_DIFFICULTY_ENUM};
use crate::views::u256_string;

/// An order joined with its material and completion count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: Bytes32,
    /// Sequential order number: the order id's bytes read as one big-endian
    /// integer. Distinct from the content-addressed id.
    #[serde(with = "u256_string")]
    pub order_number: U256,
    pub creator: Address,
    #[serde(with = "u256_string")]
    pub creation_block: U256,
    #[serde(with = "u256_string")]
    pub expiration_block: U256,
    #[serde(with = "u256_string")]
    pub amount: U256,
    #[serde(with = "u256_string")]
    pub reward: U256,
    pub max_players: u32,
    pub material: Option<OrderMaterial>,
    pub completed: Option<u32>,
    pub remaining: Option<u32>,
}

/// The material an order asks for, with an optional configured display
/// label.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMaterial {
    pub material_id: MaterialId,
    pub name: String,
    pub difficulty: &'static str,
    pub token_address: Address,
    pub label: Option<String>,
}

/// Builds the open-orders view: orders joined with material metadata and
/// completion counts, filtered to those still open and unexpired as of the
/// block this record set was fetched at.
pub fn build_orders(
    records: &RecordSet,
    labels: &HashMap<String, String>,
) -> Result<Vec<Order>, DecodeError> {
    let latest_block = U256::from(records.latest_block);

    let mut orders = Vec::new();
    for record in records.by_table(&world().order) {
        let order_id = record.bytes32_field("orderId")?;
        let material_id = record.bytes14_field("materialId")?;

        let material = records
            .find(&world().material_metadata, |r| {
                r.field("materialId").and_then(Value::as_bytes) == Some(material_id.as_bytes())
            })
            .map(|r| {
                let name = r.str_field("name")?.to_owned();
                Ok(OrderMaterial {
                    material_id,
                    label: labels.get(&name).cloned(),
                    name,
                    difficulty: resolve_enum_label(
                        MATERIAL_DIFFICULTY_ENUM,
                        r.enum_field("difficulty")?,
                    )?,
                    token_address: r.address_field("tokenAddress")?,
                })
            })
            .transpose()?;

        let completed = records
            .find(&world().completed_players, |r| {
                r.field("orderId").and_then(Value::as_bytes) == Some(order_id.as_bytes())
            })
            .map(|r| r.u32_field("count"))
            .transpose()?;

        let max_players = record.u32_field("maxPlayers")?;
        let remaining = completed.map(|count| max_players.saturating_sub(count));
        let expiration_block = record.u256_field("expirationBlock")?;

        // Open means somebody can still take the order and it has not
        // expired as of the observed block. An order with no completion
        // record yet has unknown remaining capacity and is treated as not
        // open.
        if !remaining.map_or(false, |left| left > 0) || expiration_block <= latest_block {
            continue;
        }

        orders.push(Order {
            order_number: U256::from_be_slice(order_id.as_bytes()),
            order_id,
            creator: record.address_field("creator")?,
            creation_block: record.u256_field("creationBlock")?,
            expiration_block,
            amount: record.u256_field("amount")?,
            reward: record.u256_field("reward")?,
            max_players,
            material,
            completed,
            remaining,
        });
    }

    Ok(orders)
}
