//! Composite batch wire types, chunking, and result merging.
//!
//! The platform caps one composite batch call at
//! [`DEFAULT_CHUNK_LIMIT`](crate::constants::DEFAULT_CHUNK_LIMIT)
//! sub-requests. A recorded sequence of any length is partitioned into
//! contiguous groups under that ceiling, the groups are dispatched
//! concurrently, and the per-group responses are concatenated back in group
//! order — which reproduces the original call order exactly, because the
//! groups are contiguous ordered slices.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One sub-request inside a composite batch call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSubRequest {
    pub method: String,
    /// Version-relative url, e.g. `v45.0/query/?q=...`.
    pub url: String,
    #[serde(rename = "richInput", skip_serializing_if = "Option::is_none")]
    pub rich_input: Option<Value>,
}

/// The request body of one composite batch call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(rename = "batchRequests")]
    pub batch_requests: Vec<BatchSubRequest>,
}

/// One sub-result, positionally aligned with the sub-request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSubResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// The response body of one composite batch call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(rename = "hasErrors")]
    pub has_errors: bool,
    #[serde(default)]
    pub results: Vec<BatchSubResult>,
}

/// The merged outcome of a chunked batch execution.
///
/// `results.len()` equals the recorded sub-request count and its order
/// equals recording order; `has_errors` is the OR over every group's
/// `hasErrors` flag.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// All recorded sub-requests, in original order.
    pub request: BatchRequest,
    pub has_errors: bool,
    pub results: Vec<BatchSubResult>,
}

/// Partition sub-requests into contiguous groups of at most `chunk_limit`.
///
/// Group boundaries never reorder sub-requests; the final group may be
/// shorter. A zero limit is treated as one.
pub fn chunk_request(request: &BatchRequest, chunk_limit: usize) -> Vec<BatchRequest> {
    let limit = chunk_limit.max(1);
    request
        .batch_requests
        .chunks(limit)
        .map(|group| BatchRequest {
            batch_requests: group.to_vec(),
        })
        .collect()
}

/// Concatenate group responses in group order into one outcome.
pub fn merge_responses(request: BatchRequest, responses: Vec<BatchResponse>) -> BatchOutcome {
    let mut has_errors = false;
    let mut results = Vec::with_capacity(request.batch_requests.len());
    for response in responses {
        has_errors = has_errors || response.has_errors;
        results.extend(response.results);
    }
    BatchOutcome {
        request,
        has_errors,
        results,
    }
}
