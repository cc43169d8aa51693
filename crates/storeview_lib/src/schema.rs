//! Static declaration of the world's tables and enums.
//!
//! This mirrors the schema the world registers on-chain. It is configuration,
//! not data: declared once, flattened and validated on first use, immutable
//! afterwards.

use once_cell::sync::Lazy;
use storeview_common_types::{HexString, TableId};
use strum::VariantNames;
use thiserror::Error;

use crate::decode::DecodeError;

/// Schema validation failures. All of these are fatal at load time; the
/// process must not serve requests against an invalid schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown type reference `{0}`")]
    UnknownType(String),
    #[error("table `{table}`: key field `{field}` must be statically sized")]
    DynamicKeyField { table: String, field: String },
    #[error("table `{table}`: static field `{field}` declared after a dynamic field")]
    StaticAfterDynamic { table: String, field: String },
}

/// Difficulty tiers of a material. Variant order matches the on-chain enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum MaterialDifficulty {
    Novice,
    Intermediate,
    Advanced,
    Nightmare,
}

/// Every kind of machine a pod can carry. Variant order matches the
/// on-chain enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::VariantNames)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineKind {
    None,
    Inlet,
    Outlet,
    Player,
    Splitter,
    Mixer,
    Dryer,
    Boiler,
    Centrifuge,
    Grinder,
    RatCage,
    MealwormVat,
}

pub const MATERIAL_DIFFICULTY_ENUM: &str = "materialDifficulty";
pub const MACHINE_TYPE_ENUM: &str = "machineType";

/// Ordered label list of a named enum, if one exists.
pub fn enum_labels(enum_name: &str) -> Option<&'static [&'static str]> {
    match enum_name {
        MATERIAL_DIFFICULTY_ENUM => Some(MaterialDifficulty::VARIANTS),
        MACHINE_TYPE_ENUM => Some(MachineKind::VARIANTS),
        _ => None,
    }
}

/// Resolves an enum index to its label. This is the single bounds check
/// that both decoding and view building go through; an out-of-range index
/// means the schema compiled in here no longer matches the world.
pub fn resolve_enum_label(enum_name: &str, index: u8) -> Result<&'static str, DecodeError> {
    let labels =
        enum_labels(enum_name).ok_or_else(|| DecodeError::UnknownEnum(enum_name.to_owned()))?;
    labels
        .get(index as usize)
        .copied()
        .ok_or_else(|| DecodeError::EnumIndexOutOfRange {
            enum_name: enum_name.to_owned(),
            index,
            len: labels.len(),
        })
}

/// Statically sized primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticKind {
    /// `bytesN`, taken verbatim.
    Bytes(usize),
    /// `uintN`, big-endian. `N` is the width in bits.
    Uint(usize),
    /// A 20-byte account address.
    Address,
    /// A one-byte index into the named enum's label list.
    Enum(&'static str),
}

impl StaticKind {
    /// Encoded size in bytes.
    pub fn size(self) -> usize {
        match self {
            StaticKind::Bytes(n) => n,
            StaticKind::Uint(bits) => bits / 8,
            StaticKind::Address => 20,
            StaticKind::Enum(_) => 1,
        }
    }
}

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Static(StaticKind),
    /// Fixed-size array of a static element; lives in the static block.
    FixedArray(StaticKind, usize),
    /// UTF-8 string; dynamically sized.
    String,
    /// Variable-length array of a static element; dynamically sized.
    Array(StaticKind),
    /// Reference to a named user type, resolved by [`flatten_schema`].
    Named(&'static str),
}

impl FieldType {
    /// Size within the static block, or `None` for dynamically sized fields.
    pub fn static_size(self) -> Option<usize> {
        match self {
            FieldType::Static(kind) => Some(kind.size()),
            FieldType::FixedArray(kind, len) => Some(kind.size() * len),
            FieldType::String | FieldType::Array(_) | FieldType::Named(_) => None,
        }
    }
}

/// A named, typed value field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

fn field(name: &'static str, ty: FieldType) -> Field {
    Field { name, ty }
}

/// A named key field. Key schemas admit only statically sized types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticField {
    pub name: &'static str,
    pub kind: StaticKind,
}

/// Resolves named type references to their underlying primitive and leaves
/// everything else untouched, so flattening twice is a no-op. Field order is
/// preserved and array fields stay single fields. An unknown reference
/// rejects the schema.
pub fn flatten_schema(fields: Vec<Field>) -> Result<Vec<Field>, SchemaError> {
    fields
        .into_iter()
        .map(|field| {
            let ty = match field.ty {
                FieldType::Named(name) if enum_labels(name).is_some() => {
                    FieldType::Static(StaticKind::Enum(name))
                }
                FieldType::Named(name) => return Err(SchemaError::UnknownType(name.to_owned())),
                other => other,
            };
            Ok(Field {
                name: field.name,
                ty,
            })
        })
        .collect()
}

/// One table of the world store: its resource id plus flattened key and
/// value schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub table_id: TableId,
    pub key: Vec<StaticField>,
    pub value: Vec<Field>,
}

impl TableSchema {
    fn new(name: &'static str, key: Vec<Field>, value: Vec<Field>) -> Result<Self, SchemaError> {
        let key = flatten_schema(key)?
            .into_iter()
            .map(|field| match field.ty {
                FieldType::Static(kind) => Ok(StaticField {
                    name: field.name,
                    kind,
                }),
                _ => Err(SchemaError::DynamicKeyField {
                    table: name.to_owned(),
                    field: field.name.to_owned(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let value = flatten_schema(value)?;
        // The store encodes all static fields before all dynamic ones.
        let mut seen_dynamic = false;
        for field in &value {
            match field.ty.static_size() {
                Some(_) if seen_dynamic => {
                    return Err(SchemaError::StaticAfterDynamic {
                        table: name.to_owned(),
                        field: field.name.to_owned(),
                    })
                }
                Some(_) => {}
                None => seen_dynamic = true,
            }
        }

        Ok(Self {
            name,
            table_id: resource_id(RESOURCE_TABLE, ROOT_NAMESPACE, name),
            key,
            value,
        })
    }

    /// A single-value table: a 32-byte `id` key and one value field named
    /// `value` by convention.
    fn bare(name: &'static str, value_ty: FieldType) -> Result<Self, SchemaError> {
        Self::new(
            name,
            vec![field("id", FieldType::Static(StaticKind::Bytes(32)))],
            vec![field("value", value_ty)],
        )
    }

    /// Total size of the value schema's static block.
    pub fn static_data_len(&self) -> usize {
        self.value
            .iter()
            .filter_map(|field| field.ty.static_size())
            .sum()
    }

    /// The value schema's dynamically sized fields, in encoding order.
    pub fn dynamic_fields(&self) -> impl Iterator<Item = &Field> {
        self.value
            .iter()
            .filter(|field| field.ty.static_size().is_none())
    }
}

/// Resource kind tag for on-chain tables.
const RESOURCE_TABLE: &[u8; 2] = b"tb";
/// The root namespace is all zero bytes.
const ROOT_NAMESPACE: &str = "";

/// Derives a table's 32-byte resource id: a two-byte kind tag, a 14-byte
/// namespace and a 16-byte name, ASCII and right-padded with zeros. Names
/// longer than their slot are truncated, matching the on-chain resource
/// encoding.
fn resource_id(kind: &[u8; 2], namespace: &str, name: &str) -> TableId {
    let mut id = [0u8; 32];
    id[..2].copy_from_slice(kind);
    write_truncated(&mut id[2..16], namespace);
    write_truncated(&mut id[16..], name);
    HexString(id)
}

fn write_truncated(slot: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(slot.len());
    slot[..len].copy_from_slice(&bytes[..len]);
}

/// Every table the world registers.
#[derive(Debug)]
pub struct WorldSchema {
    pub material_metadata: TableSchema,
    pub order: TableSchema,
    pub completed_players: TableSchema,
    pub recipe: TableSchema,
    pub name: TableSchema,
    pub carried_by: TableSchema,
    pub machines_in_pod: TableSchema,
    pub machine_type: TableSchema,
    pub incoming_connections: TableSchema,
    pub outgoing_connections: TableSchema,
}

impl WorldSchema {
    pub fn build() -> Result<Self, SchemaError> {
        use FieldType::{Array, FixedArray, Named, Static};
        use StaticKind::{Address, Bytes, Uint};

        Ok(Self {
            material_metadata: TableSchema::new(
                "MaterialMetadata",
                vec![field("materialId", Static(Bytes(14)))],
                vec![
                    field("difficulty", Named(MATERIAL_DIFFICULTY_ENUM)),
                    field("tokenAddress", Static(Address)),
                    field("name", FieldType::String),
                ],
            )?,
            order: TableSchema::new(
                "Order",
                vec![field("orderId", Static(Bytes(32)))],
                vec![
                    field("creationBlock", Static(Uint(256))),
                    field("creator", Static(Address)),
                    field("materialId", Static(Bytes(14))),
                    field("amount", Static(Uint(256))),
                    field("expirationBlock", Static(Uint(256))),
                    field("reward", Static(Uint(256))),
                    field("maxPlayers", Static(Uint(32))),
                ],
            )?,
            // Number of players who have completed an order.
            completed_players: TableSchema::new(
                "CompletedPlayers",
                vec![field("orderId", Static(Bytes(32)))],
                vec![field("count", Static(Uint(32)))],
            )?,
            recipe: TableSchema::new(
                "Recipe",
                vec![
                    field("machine", Named(MACHINE_TYPE_ENUM)),
                    // Material combination id.
                    field("input", Static(Bytes(32))),
                ],
                vec![field("outputs", FixedArray(Bytes(14), 2))],
            )?,
            name: TableSchema::new(
                "Name",
                vec![field("id", Static(Bytes(32)))],
                vec![field("value", FieldType::String)],
            )?,
            carried_by: TableSchema::bare("CarriedBy", Static(Bytes(32)))?,
            // Ids of the machines in a pod.
            machines_in_pod: TableSchema::bare("MachinesInPod", Array(Bytes(32)))?,
            machine_type: TableSchema::new(
                "MachineType",
                vec![field("id", Static(Bytes(32)))],
                vec![field("machine", Named(MACHINE_TYPE_ENUM))],
            )?,
            incoming_connections: TableSchema::new(
                "IncomingConnections",
                vec![field("id", Static(Bytes(32)))],
                vec![field("connections", Array(Bytes(32)))],
            )?,
            outgoing_connections: TableSchema::bare("OutgoingConnections", Array(Bytes(32)))?,
        })
    }

    /// All tables, in declaration order.
    pub fn all(&self) -> Vec<&TableSchema> {
        vec![
            &self.material_metadata,
            &self.order,
            &self.completed_players,
            &self.recipe,
            &self.name,
            &self.carried_by,
            &self.machines_in_pod,
            &self.machine_type,
            &self.incoming_connections,
            &self.outgoing_connections,
        ]
    }

    /// The table a logged event belongs to, if it is one of ours.
    pub fn by_id(&self, table_id: &TableId) -> Option<&TableSchema> {
        self.all().into_iter().find(|t| &t.table_id == table_id)
    }
}

/// The world schema, built once for the lifetime of the process.
pub fn world() -> &'static WorldSchema {
    static WORLD: Lazy<WorldSchema> =
        Lazy::new(|| WorldSchema::build().expect("world schema is valid"));
    &WORLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_resource_ids() {
        // "MaterialMetadata" is exactly 16 bytes: kind tag, zero namespace,
        // name.
        assert_eq!(
            world().material_metadata.table_id.to_string(),
            "0x746200000000000000000000000000004d6174657269616c4d65746164617461"
        );
        // Shorter names are right-padded with zeros.
        assert_eq!(
            world().order.table_id.to_string(),
            "0x746200000000000000000000000000004f726465720000000000000000000000"
        );
        // Longer names are truncated to the 16-byte slot.
        assert_eq!(
            world().incoming_connections.table_id.to_string(),
            "0x74620000000000000000000000000000496e636f6d696e67436f6e6e65637469"
        );
    }

    #[test]
    fn by_id_finds_declared_tables_only() {
        let world = world();
        assert_eq!(
            world.by_id(&world.recipe.table_id).map(|t| t.name),
            Some("Recipe")
        );
        assert!(world.by_id(&HexString([0xff; 32])).is_none());
    }

    #[test]
    fn flatten_resolves_enum_references() {
        let fields = vec![field("difficulty", FieldType::Named(MATERIAL_DIFFICULTY_ENUM))];
        let flat = flatten_schema(fields).unwrap();
        assert_eq!(
            flat[0].ty,
            FieldType::Static(StaticKind::Enum(MATERIAL_DIFFICULTY_ENUM))
        );

        // Flattening is idempotent.
        assert_eq!(flatten_schema(flat.clone()).unwrap(), flat);
    }

    #[test]
    fn flatten_rejects_unknown_type_references() {
        let err = flatten_schema(vec![field("x", FieldType::Named("noSuchType"))]).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType(name) if name == "noSuchType"));
    }

    #[test]
    fn key_schemas_must_be_static() {
        let err = TableSchema::new(
            "Broken",
            vec![field("id", FieldType::String)],
            vec![field("value", FieldType::Static(StaticKind::Uint(32)))],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DynamicKeyField { .. }));
    }

    #[test]
    fn value_schemas_put_static_fields_first() {
        let err = TableSchema::new(
            "Broken",
            vec![field("id", FieldType::Static(StaticKind::Bytes(32)))],
            vec![
                field("name", FieldType::String),
                field("count", FieldType::Static(StaticKind::Uint(32))),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::StaticAfterDynamic { .. }));
    }

    #[test]
    fn enum_labels_resolve_in_declaration_order() {
        assert_eq!(resolve_enum_label(MACHINE_TYPE_ENUM, 0).unwrap(), "NONE");
        assert_eq!(resolve_enum_label(MACHINE_TYPE_ENUM, 5).unwrap(), "MIXER");
        assert_eq!(
            resolve_enum_label(MACHINE_TYPE_ENUM, 11).unwrap(),
            "MEALWORM_VAT"
        );
        assert_eq!(
            resolve_enum_label(MATERIAL_DIFFICULTY_ENUM, 3).unwrap(),
            "nightmare"
        );
    }

    #[test]
    fn enum_index_at_length_is_rejected() {
        let err = resolve_enum_label(MACHINE_TYPE_ENUM, 12).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::EnumIndexOutOfRange { index: 12, len: 12, .. }
        ));
    }
}
