//! The relation store: every decoded record of one fetch in a flat,
//! read-only list.
//!
//! There is deliberately no index structure here; at this scale every join
//! in the view layer is a linear scan, and keeping the store a plain list
//! keeps the joins declarative and easy to test.

use std::collections::BTreeMap;

use storeview_common_types::{Bytes32, HexString, MaterialId};
use storeview_indexer_client::{LogSource, SourceError, StoreLog, SET_RECORD_EVENT};
use thiserror::Error;
use tracing::*;

use crate::decode::{decode_key, decode_value_args, DecodeError, Value};
use crate::schema::TableSchema;

/// Errors that fail a whole fetch. Events for tables outside our schema are
/// not among them; those are silently skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// One decoded record-set event.
#[derive(Debug, Clone)]
pub struct Record {
    /// The table this record was logged for.
    pub table: &'static TableSchema,
    /// Decoded key fields, by name.
    pub key: BTreeMap<String, Value>,
    /// Decoded value fields, by name.
    pub value: BTreeMap<String, Value>,
    /// Key and value fields merged; key fields win on (by design,
    /// nonexistent) name collisions.
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Looks up a merged field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        get: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T, DecodeError> {
        self.field(name)
            .and_then(get)
            .ok_or_else(|| DecodeError::FieldType {
                table: self.table.name,
                field: name.to_owned(),
            })
    }

    pub fn bytes_field(&self, name: &str) -> Result<&[u8], DecodeError> {
        self.typed(name, Value::as_bytes)
    }

    pub fn bytes14_field(&self, name: &str) -> Result<MaterialId, DecodeError> {
        let bytes = self.bytes_field(name)?;
        <[u8; 14]>::try_from(bytes)
            .map(HexString)
            .map_err(|_| DecodeError::FieldType {
                table: self.table.name,
                field: name.to_owned(),
            })
    }

    pub fn bytes32_field(&self, name: &str) -> Result<Bytes32, DecodeError> {
        let bytes = self.bytes_field(name)?;
        <[u8; 32]>::try_from(bytes)
            .map(HexString)
            .map_err(|_| DecodeError::FieldType {
                table: self.table.name,
                field: name.to_owned(),
            })
    }

    pub fn u32_field(&self, name: &str) -> Result<u32, DecodeError> {
        self.typed(name, Value::as_u32)
    }

    pub fn u256_field(&self, name: &str) -> Result<alloy_primitives::U256, DecodeError> {
        self.typed(name, Value::as_u256)
    }

    pub fn address_field(
        &self,
        name: &str,
    ) -> Result<storeview_common_types::Address, DecodeError> {
        self.typed(name, Value::as_address)
    }

    pub fn str_field(&self, name: &str) -> Result<&str, DecodeError> {
        self.typed(name, Value::as_str)
    }

    pub fn enum_field(&self, name: &str) -> Result<u8, DecodeError> {
        self.typed(name, Value::as_enum_index)
    }

    pub fn array_field(&self, name: &str) -> Result<&[Value], DecodeError> {
        self.typed(name, Value::as_array)
    }
}

/// The in-memory result of one fetch: every decoded record plus the block
/// at which the indexer answered. Owned by a single request and discarded
/// with the response; nothing is cached across calls.
#[derive(Debug)]
pub struct RecordSet {
    pub latest_block: u64,
    pub records: Vec<Record>,
}

impl RecordSet {
    /// All records of one table, in logged order.
    pub fn by_table<'a>(&'a self, table: &TableSchema) -> impl Iterator<Item = &'a Record> {
        let table_id = table.table_id;
        self.records
            .iter()
            .filter(move |record| record.table.table_id == table_id)
    }

    /// First record of `table` matching `predicate`.
    pub fn find(
        &self,
        table: &TableSchema,
        predicate: impl Fn(&Record) -> bool,
    ) -> Option<&Record> {
        self.by_table(table).find(|record| predicate(record))
    }
}

/// Fetches and decodes every record-set event for the given tables in one
/// shot. Events for tables outside the given set are skipped; any other
/// event kind, and any structural decode failure, fails the fetch.
pub async fn fetch_records(
    source: &dyn LogSource,
    tables: &[&'static TableSchema],
) -> Result<RecordSet, FetchError> {
    let table_ids: Vec<_> = tables.iter().map(|table| table.table_id).collect();
    let fetched = source.fetch_record_set_events(&table_ids).await?;

    let mut records = Vec::with_capacity(fetched.logs.len());
    for log in &fetched.logs {
        if let Some(record) = decode_log(tables, log)? {
            records.push(record);
        }
    }

    debug!(
        latest_block = fetched.block_number,
        records = records.len(),
        "decoded record set"
    );

    Ok(RecordSet {
        latest_block: fetched.block_number,
        records,
    })
}

fn decode_log(
    tables: &[&'static TableSchema],
    log: &StoreLog,
) -> Result<Option<Record>, DecodeError> {
    if log.event_name != SET_RECORD_EVENT {
        return Err(DecodeError::UnexpectedEventKind(log.event_name.clone()));
    }

    let Some(table) = tables
        .iter()
        .find(|table| table.table_id == log.args.table_id)
    else {
        // The indexer may hold events for tables we have no schema for.
        debug!(table_id = %log.args.table_id, "skipping event for unknown table");
        return Ok(None);
    };

    let key = decode_key(table, &log.args.key_tuple)?;
    let value = decode_value_args(
        table,
        log.args.static_data.as_bytes(),
        &log.args.encoded_lengths,
        log.args.dynamic_data.as_bytes(),
    )?;

    let mut fields = value.clone();
    fields.extend(key.iter().map(|(name, v)| (name.clone(), v.clone())));

    Ok(Some(Record {
        table,
        key,
        value,
        fields,
    }))
}
