//! Helpers for exercising the engine without a live indexer: a canned log
//! source plus encoders that mirror the store's wire encoding.

use alloy_primitives::U256;
use async_trait::async_trait;
use storeview_common_types::{Bytes32, HexString, TableId};
use storeview_indexer_client::{
    FetchedLogs, LogSource, RecordArgs, SourceError, StoreLog, SET_RECORD_EVENT,
};

use crate::decode::Value;
use crate::schema::{FieldType, StaticKind, TableSchema};

/// A [`LogSource`] serving canned logs, filtered by table id the way the
/// real indexer filters.
#[derive(Debug, Default)]
pub struct MockLogSource {
    pub block_number: u64,
    pub logs: Vec<StoreLog>,
}

impl MockLogSource {
    pub fn new(block_number: u64) -> Self {
        Self {
            block_number,
            logs: Vec::new(),
        }
    }

    /// Adds a record-set event for `table`, with key and value fields given
    /// in schema order.
    pub fn push_record(&mut self, table: &TableSchema, key: &[Value], value: &[Value]) {
        let (static_data, encoded_lengths, dynamic_data) = encode_value_args(table, value);
        self.logs.push(StoreLog {
            event_name: SET_RECORD_EVENT.to_owned(),
            args: RecordArgs {
                table_id: table.table_id,
                key_tuple: encode_key(table, key),
                static_data: HexString(static_data),
                encoded_lengths,
                dynamic_data: HexString(dynamic_data),
            },
        });
    }
}

#[async_trait]
impl LogSource for MockLogSource {
    async fn fetch_record_set_events(
        &self,
        table_ids: &[TableId],
    ) -> Result<FetchedLogs, SourceError> {
        Ok(FetchedLogs {
            block_number: self.block_number,
            logs: self
                .logs
                .iter()
                .filter(|log| table_ids.contains(&log.args.table_id))
                .cloned()
                .collect(),
        })
    }
}

/// Encodes key values into 32-byte words, the inverse of key decoding.
pub fn encode_key(table: &TableSchema, values: &[Value]) -> Vec<Bytes32> {
    assert_eq!(values.len(), table.key.len(), "key arity mismatch");
    table
        .key
        .iter()
        .zip(values)
        .map(|(field, value)| {
            let mut word = [0u8; 32];
            let bytes = encode_static(field.kind, value);
            match field.kind {
                StaticKind::Bytes(_) => word[..bytes.len()].copy_from_slice(&bytes),
                _ => word[32 - bytes.len()..].copy_from_slice(&bytes),
            }
            HexString(word)
        })
        .collect()
}

/// Encodes value fields into the store's wire triplet (static block,
/// packed lengths, dynamic payload), the inverse of value decoding.
pub fn encode_value_args(table: &TableSchema, values: &[Value]) -> (Vec<u8>, Bytes32, Vec<u8>) {
    assert_eq!(values.len(), table.value.len(), "value arity mismatch");

    let mut static_data = Vec::new();
    let mut dynamic_data = Vec::new();
    let mut lengths = Vec::new();

    for (field, value) in table.value.iter().zip(values) {
        match field.ty {
            FieldType::Static(kind) => static_data.extend(encode_static(kind, value)),
            FieldType::FixedArray(kind, len) => {
                let elements = value.as_array().expect("fixed array value");
                assert_eq!(elements.len(), len, "fixed array arity mismatch");
                for element in elements {
                    static_data.extend(encode_static(kind, element));
                }
            }
            FieldType::String => {
                let s = value.as_str().expect("string value");
                lengths.push(s.len());
                dynamic_data.extend(s.as_bytes());
            }
            FieldType::Array(kind) => {
                let elements = value.as_array().expect("array value");
                let start = dynamic_data.len();
                for element in elements {
                    dynamic_data.extend(encode_static(kind, element));
                }
                lengths.push(dynamic_data.len() - start);
            }
            FieldType::Named(_) => panic!("schemas are flattened at load"),
        }
    }

    (static_data, encode_lengths(&lengths), dynamic_data)
}

/// Packs dynamic field lengths into the store's 32-byte counter: total in
/// the low 7 bytes, then 5 bytes per field.
pub fn encode_lengths(lengths: &[usize]) -> Bytes32 {
    let mut acc = U256::from(lengths.iter().sum::<usize>());
    for (i, len) in lengths.iter().enumerate() {
        acc |= U256::from(*len) << (56 + 40 * i);
    }
    HexString(acc.to_be_bytes::<32>())
}

fn encode_static(kind: StaticKind, value: &Value) -> Vec<u8> {
    match (kind, value) {
        (StaticKind::Bytes(n), Value::Bytes(bytes)) => {
            assert_eq!(bytes.len(), n, "byte width mismatch");
            bytes.clone()
        }
        (StaticKind::Uint(bits), Value::U32(v)) if bits <= 32 => {
            v.to_be_bytes()[4 - bits / 8..].to_vec()
        }
        (StaticKind::Uint(256), Value::U256(v)) => v.to_be_bytes::<32>().to_vec(),
        (StaticKind::Address, Value::Address(address)) => address.as_bytes().to_vec(),
        (StaticKind::Enum(_), Value::EnumIndex(index)) => vec![*index],
        (kind, value) => panic!("cannot encode {value:?} as {kind:?}"),
    }
}
