use itertools::Itertools;
use serde::Serialize;
use storeview_common_types::{CombinationId, HexString};

use crate::combine::pair_id;
use crate::decode::DecodeError;
use crate::records::RecordSet;
use crate::schema::{resolve_enum_label, world, MACHINE_TYPE_ENUM};
use crate::views::Material;

/// A recipe with its machine, input and outputs resolved to names where
/// possible.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub machine_type: &'static str,
    /// A material name, `"{a} + {b}"` for a two-material input, or the raw
    /// combination id if unresolved.
    pub input: String,
    /// Output material names, raw ids where unresolved.
    pub outputs: Vec<String>,
}

/// Builds the recipes view. Inputs are matched first against each
/// material's own combination id, then against every unordered pair;
/// should distinct pairs ever collide on an id, the first enumerated pair
/// wins.
pub fn build_recipes(
    records: &RecordSet,
    materials: &[Material],
) -> Result<Vec<Recipe>, DecodeError> {
    // One id per unordered pair, computed once per request.
    let pairs: Vec<(CombinationId, String)> = materials
        .iter()
        .tuple_combinations()
        .map(|(a, b)| {
            let (first, second) = if a.material_id.as_bytes() <= b.material_id.as_bytes() {
                (a, b)
            } else {
                (b, a)
            };
            (
                pair_id(&first.material_id, &second.material_id),
                format!("{} + {}", first.name, second.name),
            )
        })
        .collect();

    records
        .by_table(&world().recipe)
        .map(|record| {
            let input = record.bytes32_field("input")?;
            let input = materials
                .iter()
                .find(|material| material.combination_id == input)
                .map(|material| material.name.clone())
                .or_else(|| {
                    pairs
                        .iter()
                        .find(|(id, _)| *id == input)
                        .map(|(_, names)| names.clone())
                })
                .unwrap_or_else(|| input.to_string());

            let outputs = record
                .array_field("outputs")?
                .iter()
                .map(|element| {
                    let id = element.as_bytes().ok_or_else(|| DecodeError::FieldType {
                        table: record.table.name,
                        field: "outputs".to_owned(),
                    })?;
                    Ok(materials
                        .iter()
                        .find(|material| material.material_id.as_bytes() == id)
                        .map(|material| material.name.clone())
                        .unwrap_or_else(|| HexString(id.to_vec()).to_string()))
                })
                .collect::<Result<Vec<_>, DecodeError>>()?;

            Ok(Recipe {
                machine_type: resolve_enum_label(MACHINE_TYPE_ENUM, record.enum_field("machine")?)?,
                input,
                outputs,
            })
        })
        .collect()
}
