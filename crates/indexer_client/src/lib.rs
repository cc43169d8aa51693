//! Client for the indexer service that archives the world store's event log.
//!
//! The indexer is the only upstream this system talks to. Its contract is
//! deliberately narrow: given a set of table ids, return every record-set
//! event logged for those tables, together with the latest block the indexer
//! has observed. Events arrive in no particular order and are treated as a
//! set, not a stream.

mod real_source;

use std::fmt::Debug;

use async_trait::async_trait;
pub use real_source::RealLogSource;
use serde::Deserialize;
use storeview_common_types::{Bytes32, HexString, TableId};
use thiserror::Error;

/// The only event kind the store emits for the tables we watch. Anything
/// else in the log stream means the indexer and this service have drifted
/// out of sync.
pub const SET_RECORD_EVENT: &str = "Store_SetRecord";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("indexer request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("indexer returned status {status}: {body}")]
    BadStatus { status: u16, body: String },
}

/// One logged record-set occurrence, exactly as the indexer reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreLog {
    pub event_name: String,
    pub args: RecordArgs,
}

/// The raw payload of a record-set event: which table, which key, and the
/// encoded value split into its static block, packed dynamic lengths, and
/// dynamic payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordArgs {
    pub table_id: TableId,
    pub key_tuple: Vec<Bytes32>,
    pub static_data: HexString<Vec<u8>>,
    pub encoded_lengths: Bytes32,
    pub dynamic_data: HexString<Vec<u8>>,
}

/// A one-shot fetch result: the latest block the indexer had seen when it
/// answered, plus every matching event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedLogs {
    pub block_number: u64,
    pub logs: Vec<StoreLog>,
}

/// A source of record-set events. The real implementation talks to a remote
/// indexer; tests substitute canned logs.
#[async_trait]
pub trait LogSource: Send + Sync + Debug {
    /// Fetches every record-set event for the given tables in one shot.
    async fn fetch_record_set_events(
        &self,
        table_ids: &[TableId],
    ) -> Result<FetchedLogs, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_indexer_log_payload() {
        let json = r#"{
            "blockNumber": 4242,
            "logs": [
                {
                    "eventName": "Store_SetRecord",
                    "args": {
                        "tableId": "0x74620000000000000000000000000000436f6d706c65746564506c6179657273",
                        "keyTuple": ["0x0000000000000000000000000000000000000000000000000000000000000001"],
                        "staticData": "0x00000003",
                        "encodedLengths": "0x0000000000000000000000000000000000000000000000000000000000000000",
                        "dynamicData": "0x"
                    }
                }
            ]
        }"#;

        let fetched: FetchedLogs = serde_json::from_str(json).unwrap();
        assert_eq!(fetched.block_number, 4242);
        assert_eq!(fetched.logs.len(), 1);

        let log = &fetched.logs[0];
        assert_eq!(log.event_name, SET_RECORD_EVENT);
        assert_eq!(log.args.key_tuple.len(), 1);
        assert_eq!(log.args.static_data.as_bytes(), &[0, 0, 0, 3]);
        assert!(log.args.dynamic_data.as_bytes().is_empty());
    }
}
