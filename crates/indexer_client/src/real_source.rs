use async_trait::async_trait;
use serde::Serialize;
use storeview_common_types::{Address, TableId};
use tracing::*;
use url::Url;

use crate::{FetchedLogs, LogSource, SourceError};

/// A [`LogSource`] backed by a remote indexer's get-logs API.
///
/// The query is a single GET whose `input` parameter carries the chain id,
/// the world address and one filter per table id, JSON-encoded.
#[derive(Debug, Clone)]
pub struct RealLogSource {
    client: reqwest::Client,
    endpoint: Url,
    chain_id: u64,
    world_address: Address,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetLogsInput<'a> {
    chain_id: u64,
    address: &'a Address,
    filters: Vec<TableFilter<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TableFilter<'a> {
    table_id: &'a TableId,
}

impl RealLogSource {
    pub fn new(
        indexer_url: &Url,
        chain_id: u64,
        world_address: Address,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: indexer_url.join("api/logs")?,
            chain_id,
            world_address,
        })
    }
}

#[async_trait]
impl LogSource for RealLogSource {
    async fn fetch_record_set_events(
        &self,
        table_ids: &[TableId],
    ) -> Result<FetchedLogs, SourceError> {
        let input = GetLogsInput {
            chain_id: self.chain_id,
            address: &self.world_address,
            filters: table_ids
                .iter()
                .map(|table_id| TableFilter { table_id })
                .collect(),
        };

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("input", serde_json::to_string(&input).unwrap())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::BadStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let fetched: FetchedLogs = response.json().await?;
        debug!(
            block_number = fetched.block_number,
            logs = fetched.logs.len(),
            "fetched record-set events"
        );

        Ok(fetched)
    }
}
