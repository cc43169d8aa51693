use serde::Serialize;
use storeview_common_types::{Address, CombinationId, MaterialId};

use crate::combine::single_id;
use crate::decode::DecodeError;
use crate::records::RecordSet;
use crate::schema::{resolve_enum_label, world, MATERIAL_DIFFICULTY_ENUM};

/// A material and its derived single-material combination id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub material_id: MaterialId,
    pub name: String,
    pub difficulty: &'static str,
    pub token_address: Address,
    pub combination_id: CombinationId,
}

/// Projects the material-metadata table, resolving the difficulty label
/// and attaching each material's combination id.
pub fn build_materials(records: &RecordSet) -> Result<Vec<Material>, DecodeError> {
    records
        .by_table(&world().material_metadata)
        .map(|record| {
            let material_id = record.bytes14_field("materialId")?;
            Ok(Material {
                material_id,
                name: record.str_field("name")?.to_owned(),
                difficulty: resolve_enum_label(
                    MATERIAL_DIFFICULTY_ENUM,
                    record.enum_field("difficulty")?,
                )?,
                token_address: record.address_field("tokenAddress")?,
                combination_id: single_id(&material_id),
            })
        })
        .collect()
}
