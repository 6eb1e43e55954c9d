//! Query results and lazy pagination.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::RestClient;
use crate::error::{Error, Result};
use crate::operations::DataOperations;

/// One page of query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub done: bool,
    #[serde(rename = "totalSize")]
    pub total_size: u64,
    #[serde(default)]
    pub records: Vec<Value>,
    /// Opaque continuation locator; present when `done` is false.
    #[serde(rename = "nextRecordsUrl", skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
}

/// Pull-based iterator over every record of a query, fetching continuation
/// pages on demand.
///
/// The first [`next`](Self::next) issues the initial query; subsequent
/// pulls yield from the current page without I/O and only touch the network
/// again once the page is exhausted and the server reported more. The
/// sequence is finite and one-pass: re-running the query requires a new
/// iterator. No page is prefetched ahead of consumption.
pub struct QueryIterator<'a> {
    client: &'a RestClient,
    soql: String,
    page: Option<QueryResponse>,
    index: usize,
    finished: bool,
}

impl<'a> QueryIterator<'a> {
    pub fn new(client: &'a RestClient, soql: impl Into<String>) -> Self {
        Self {
            client,
            soql: soql.into(),
            page: None,
            index: 0,
            finished: false,
        }
    }

    /// Yield the next record, or `None` once the sequence is exhausted.
    pub async fn next(&mut self) -> Result<Option<Value>> {
        loop {
            if self.finished {
                return Ok(None);
            }

            let Some(page) = &self.page else {
                let raw = self.client.query(&self.soql).await?;
                self.page = Some(serde_json::from_value(raw)?);
                self.index = 0;
                continue;
            };

            if self.index < page.records.len() {
                let record = page.records[self.index].clone();
                self.index += 1;
                return Ok(Some(record));
            }

            if page.done {
                self.finished = true;
                self.page = None;
                return Ok(None);
            }

            let locator = page.next_records_url.clone().ok_or_else(|| {
                Error::Configuration(
                    "query response reported more pages but carried no continuation locator"
                        .to_string(),
                )
            })?;
            self.page = Some(self.client.query_next(&locator).await?);
            self.index = 0;
        }
    }

    /// Drain the remainder of the sequence into a vector.
    pub async fn try_collect(mut self) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_response_parses_platform_field_names() {
        let response: QueryResponse = serde_json::from_value(json!({
            "done": false,
            "totalSize": 5,
            "records": [{"Id": "001"}, {"Id": "002"}],
            "nextRecordsUrl": "/services/data/v45.0/query/01g-2000"
        }))
        .unwrap();

        assert!(!response.done);
        assert_eq!(response.total_size, 5);
        assert_eq!(response.records.len(), 2);
        assert_eq!(
            response.next_records_url.as_deref(),
            Some("/services/data/v45.0/query/01g-2000")
        );
    }

    #[test]
    fn final_page_omits_locator() {
        let response: QueryResponse = serde_json::from_value(json!({
            "done": true,
            "totalSize": 1,
            "records": [{"Id": "001"}]
        }))
        .unwrap();
        assert!(response.done);
        assert!(response.next_records_url.is_none());
    }
}
