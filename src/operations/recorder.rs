//! Recording implementation of the operation surface.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{DataOperations, RequestSpec};
use crate::batch::{BatchRequest, BatchSubRequest};
use crate::error::Result;

/// Captures every operation as a relative batch sub-request instead of
/// performing I/O.
///
/// Each call appends `{method, url: "v{version}{path}?{query}", richInput}`
/// to an ordered list and resolves immediately with a `Null` placeholder —
/// callers must not depend on the returned value. Recording is meant to be
/// driven sequentially by a single logical caller: the order of the list is
/// global to the recorder instance, and interleaved recording from
/// independent tasks cannot be told apart.
pub struct BatchRecorder {
    version: String,
    recorded: Mutex<Vec<BatchSubRequest>>,
}

impl BatchRecorder {
    /// A recorder targeting the given API version (numeric string, e.g.
    /// `"45.0"`); recorded urls are version-relative.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.recorded.lock().expect("recorder mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the recorder and produce the full batch request, sub-requests
    /// in call order.
    pub fn into_request(self) -> BatchRequest {
        BatchRequest {
            batch_requests: self
                .recorded
                .into_inner()
                .expect("recorder mutex poisoned"),
        }
    }
}

#[async_trait]
impl DataOperations for BatchRecorder {
    async fn fetch(&self, spec: RequestSpec) -> Result<Value> {
        let mut url = format!("v{}{}", self.version, spec.path);
        let query = spec.query_string();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        self.recorded
            .lock()
            .expect("recorder mutex poisoned")
            .push(BatchSubRequest {
                method: spec.method.to_string(),
                url,
                rich_input: spec.body,
            });
        Ok(Value::Null)
    }
}
