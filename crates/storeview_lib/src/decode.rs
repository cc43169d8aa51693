//! Decoding of raw logged events into typed field values.
//!
//! The store encodes a record's value in three parts: a static block with
//! every fixed-width field at a cumulative offset, a 32-byte packed counter
//! holding the byte length of each dynamically sized field, and the
//! concatenated dynamic payloads. Keys travel separately, one 32-byte word
//! per key field.

use std::collections::BTreeMap;

use alloy_primitives::U256;
use storeview_common_types::{Bytes32, HexString};
use thiserror::Error;

use crate::schema::{resolve_enum_label, FieldType, StaticKind, TableSchema};

/// Fatal decoding failures. Any of these means the schema compiled into
/// this service no longer matches what the world store logs, so the whole
/// fetch is failed rather than served from bad data.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected event kind from indexer: {0}")]
    UnexpectedEventKind(String),
    #[error("table `{table}`: expected {expected} key words, got {got}")]
    KeyLength {
        table: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("table `{table}`: expected {expected} bytes of static data, got {got}")]
    StaticDataLength {
        table: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("table `{table}`: dynamic data is {got} bytes, encoded lengths say {expected}")]
    DynamicDataLength {
        table: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("table `{table}`: dynamic field `{field}` overruns the dynamic data")]
    DynamicOverrun {
        table: &'static str,
        field: &'static str,
    },
    #[error("table `{table}`: dynamic field `{field}` is not a whole number of elements")]
    ElementSize {
        table: &'static str,
        field: &'static str,
    },
    #[error("table `{table}`: field `{field}` is not valid UTF-8")]
    Utf8 {
        table: &'static str,
        field: &'static str,
    },
    #[error("unknown enum `{0}`")]
    UnknownEnum(String),
    #[error("enum `{enum_name}` index {index} out of range ({len} labels)")]
    EnumIndexOutOfRange {
        enum_name: String,
        index: u8,
        len: usize,
    },
    #[error("table `{table}`: record has no field `{field}` of the requested type")]
    FieldType { table: &'static str, field: String },
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Fixed-width byte string, verbatim.
    Bytes(Vec<u8>),
    U32(u32),
    U256(U256),
    Address(storeview_common_types::Address),
    String(String),
    /// Raw index into a named enum. Labels are resolved at the view layer.
    EnumIndex(u8),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u256(&self) -> Option<U256> {
        match self {
            Value::U256(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<storeview_common_types::Address> {
        match self {
            Value::Address(address) => Some(*address),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum_index(&self) -> Option<u8> {
        match self {
            Value::EnumIndex(index) => Some(*index),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(elements) => Some(elements),
            _ => None,
        }
    }
}

/// Decodes one statically sized scalar. `bytes` is exactly `kind.size()`
/// bytes, already sliced out of its word or block by the caller.
fn decode_static(kind: StaticKind, bytes: &[u8]) -> Result<Value, DecodeError> {
    debug_assert_eq!(bytes.len(), kind.size());

    Ok(match kind {
        StaticKind::Bytes(_) => Value::Bytes(bytes.to_vec()),
        StaticKind::Uint(bits) if bits <= 32 => {
            let mut buf = [0u8; 4];
            buf[4 - bytes.len()..].copy_from_slice(bytes);
            Value::U32(u32::from_be_bytes(buf))
        }
        StaticKind::Uint(_) => Value::U256(U256::from_be_slice(bytes)),
        StaticKind::Address => {
            let mut buf = [0u8; 20];
            buf.copy_from_slice(bytes);
            Value::Address(HexString(buf))
        }
        StaticKind::Enum(enum_name) => {
            let index = bytes[0];
            // Bounds-checked here so a drifted enum fails the fetch instead
            // of surfacing as a bogus label later.
            resolve_enum_label(enum_name, index)?;
            Value::EnumIndex(index)
        }
    })
}

/// Decodes a key tuple positionally against the table's key schema. Each
/// key field occupies one 32-byte word: value types (integers, addresses,
/// enum indices) are right-aligned within the word, fixed-width byte
/// strings are left-aligned.
pub fn decode_key(
    table: &TableSchema,
    key_tuple: &[Bytes32],
) -> Result<BTreeMap<String, Value>, DecodeError> {
    if key_tuple.len() != table.key.len() {
        return Err(DecodeError::KeyLength {
            table: table.name,
            expected: table.key.len(),
            got: key_tuple.len(),
        });
    }

    table
        .key
        .iter()
        .zip(key_tuple)
        .map(|(field, word)| {
            let word = word.as_bytes();
            let size = field.kind.size();
            let slice = match field.kind {
                StaticKind::Bytes(_) => &word[..size],
                _ => &word[32 - size..],
            };
            Ok((field.name.to_owned(), decode_static(field.kind, slice)?))
        })
        .collect()
}

/// Decodes an event's value payload against the table's value schema.
pub fn decode_value_args(
    table: &TableSchema,
    static_data: &[u8],
    encoded_lengths: &Bytes32,
    dynamic_data: &[u8],
) -> Result<BTreeMap<String, Value>, DecodeError> {
    let mut fields = BTreeMap::new();

    let expected = table.static_data_len();
    if static_data.len() != expected {
        return Err(DecodeError::StaticDataLength {
            table: table.name,
            expected,
            got: static_data.len(),
        });
    }

    let mut offset = 0;
    for field in &table.value {
        let Some(size) = field.ty.static_size() else {
            continue;
        };
        let bytes = &static_data[offset..offset + size];
        let value = match field.ty {
            FieldType::Static(kind) => decode_static(kind, bytes)?,
            FieldType::FixedArray(kind, len) => {
                let element = kind.size();
                Value::Array(
                    (0..len)
                        .map(|i| decode_static(kind, &bytes[i * element..(i + 1) * element]))
                        .collect::<Result<_, _>>()?,
                )
            }
            _ => unreachable!("static_size returned Some"),
        };
        fields.insert(field.name.to_owned(), value);
        offset += size;
    }

    let lengths = DynamicLengths::parse(encoded_lengths);
    if dynamic_data.len() != lengths.total {
        return Err(DecodeError::DynamicDataLength {
            table: table.name,
            expected: lengths.total,
            got: dynamic_data.len(),
        });
    }

    let mut cursor = 0;
    for (i, field) in table.dynamic_fields().enumerate() {
        let len = lengths.field(i);
        let end = cursor + len;
        if end > dynamic_data.len() {
            return Err(DecodeError::DynamicOverrun {
                table: table.name,
                field: field.name,
            });
        }
        let bytes = &dynamic_data[cursor..end];
        let value = match field.ty {
            FieldType::String => Value::String(
                std::str::from_utf8(bytes)
                    .map_err(|_| DecodeError::Utf8 {
                        table: table.name,
                        field: field.name,
                    })?
                    .to_owned(),
            ),
            FieldType::Array(kind) => {
                let element = kind.size();
                if bytes.len() % element != 0 {
                    return Err(DecodeError::ElementSize {
                        table: table.name,
                        field: field.name,
                    });
                }
                Value::Array(
                    bytes
                        .chunks(element)
                        .map(|chunk| decode_static(kind, chunk))
                        .collect::<Result<_, _>>()?,
                )
            }
            _ => unreachable!("dynamic_fields yields only dynamic fields"),
        };
        fields.insert(field.name.to_owned(), value);
        cursor = end;
    }

    // Per-field lengths must cover the dynamic data exactly.
    if cursor != dynamic_data.len() {
        return Err(DecodeError::DynamicDataLength {
            table: table.name,
            expected: cursor,
            got: dynamic_data.len(),
        });
    }

    Ok(fields)
}

/// The store's packed dynamic-length counter: the low 7 bytes hold the
/// total dynamic length, and each dynamic field's byte length occupies the
/// next 5 bytes, field 0 lowest.
struct DynamicLengths {
    total: usize,
    acc: U256,
}

impl DynamicLengths {
    const TOTAL_BITS: usize = 56;
    const FIELD_BITS: usize = 40;

    fn parse(encoded: &Bytes32) -> Self {
        let acc = U256::from_be_slice(encoded.as_bytes());
        let total = (acc & U256::from((1u64 << Self::TOTAL_BITS) - 1)).to::<usize>();
        Self { total, acc }
    }

    fn field(&self, index: usize) -> usize {
        ((self.acc >> (Self::TOTAL_BITS + Self::FIELD_BITS * index))
            & U256::from((1u64 << Self::FIELD_BITS) - 1))
        .to::<usize>()
    }
}
