//! The CRUD/query/search operation surface.
//!
//! [`DataOperations`] maps every operation to a relative path and verb and
//! funnels it through a single `fetch` seam. Two implementations conform:
//! [`RestClient`](crate::client::RestClient) performs the I/O, and
//! [`BatchRecorder`](recorder::BatchRecorder) captures the call as a batch
//! sub-request instead. The default `fetch` has no transport and rejects.

pub mod recorder;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::constants::methods;
use crate::error::{Error, Result};

pub use recorder::BatchRecorder;

/// A single intended request, relative to the versioned data path.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: methods::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: methods::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: methods::PATCH,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: methods::DELETE,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Render the query pairs as a url-encoded query string (no leading `?`).
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Record retrieval request, by id or by external id.
#[derive(Debug, Clone)]
pub struct RetrieveRequest {
    pub sobject: String,
    pub id: String,
    pub external_id_field: Option<String>,
    pub fields: Vec<String>,
}

/// Read the sobject type from a record's `attributes.type`.
pub fn sobject_type(record: &Value) -> Result<&str> {
    record
        .get("attributes")
        .and_then(|a| a.get("type"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::Configuration("unable to resolve record sobject type".to_string())
        })
}

fn record_id(record: &Value) -> Result<&str> {
    record
        .get("Id")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Configuration("record is missing an Id".to_string()))
}

/// Clone a record with the given top-level fields removed; the platform
/// rejects bodies carrying `attributes` or `Id`.
fn strip_fields(record: &Value, fields: &[&str]) -> Value {
    match record {
        Value::Object(map) => {
            let mut out = map.clone();
            for field in fields {
                out.remove(*field);
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn request_date(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The full operation surface, mapped to path/verb over a single `fetch`
/// seam. All operations return the raw response `Value`; a recording
/// implementation returns an unusable placeholder instead, and callers of a
/// recorder must not depend on the returned value.
#[async_trait]
pub trait DataOperations: Send + Sync {
    /// Perform (or capture) one request. The default surface has no
    /// transport and rejects every call.
    async fn fetch(&self, spec: RequestSpec) -> Result<Value> {
        let _ = spec;
        Err(Error::NotImplemented("fetch"))
    }

    async fn limits(&self) -> Result<Value> {
        self.fetch(RequestSpec::get("/limits/")).await
    }

    async fn describe_global(&self) -> Result<Value> {
        self.fetch(RequestSpec::get("/sobjects/")).await
    }

    async fn describe_basic(&self, sobject: &str) -> Result<Value> {
        self.fetch(RequestSpec::get(format!("/sobjects/{sobject}/"))).await
    }

    async fn describe(&self, sobject: &str) -> Result<Value> {
        self.fetch(RequestSpec::get(format!("/sobjects/{sobject}/describe/")))
            .await
    }

    async fn query(&self, soql: &str) -> Result<Value> {
        self.fetch(RequestSpec::get("/query/").with_param("q", soql))
            .await
    }

    /// Ask the query planner for an execution plan instead of running it.
    async fn explain(&self, soql: &str) -> Result<Value> {
        self.fetch(RequestSpec::get("/query/").with_param("explain", soql))
            .await
    }

    /// Like [`query`](Self::query) but includes deleted and archived records.
    async fn query_all(&self, soql: &str) -> Result<Value> {
        self.fetch(RequestSpec::get("/queryAll/").with_param("q", soql))
            .await
    }

    async fn search(&self, sosl: &str) -> Result<Value> {
        self.fetch(RequestSpec::get("/search/").with_param("q", sosl))
            .await
    }

    async fn parameterized_search(&self, request: Value) -> Result<Value> {
        self.fetch(RequestSpec::post("/parameterizedSearch/", request))
            .await
    }

    async fn create(&self, record: &Value) -> Result<Value> {
        let sobject = sobject_type(record)?;
        let body = strip_fields(record, &["attributes"]);
        self.fetch(RequestSpec::post(format!("/sobjects/{sobject}/"), body))
            .await
    }

    async fn update(&self, record: &Value) -> Result<Value> {
        let sobject = sobject_type(record)?;
        let id = record_id(record)?;
        let body = strip_fields(record, &["attributes", "Id"]);
        self.fetch(RequestSpec::patch(format!("/sobjects/{sobject}/{id}"), body))
            .await
    }

    async fn delete(&self, record: &Value) -> Result<Value> {
        let sobject = sobject_type(record)?;
        let id = record_id(record)?;
        self.fetch(RequestSpec::delete(format!("/sobjects/{sobject}/{id}")))
            .await
    }

    async fn retrieve(&self, request: &RetrieveRequest) -> Result<Value> {
        let path = match &request.external_id_field {
            Some(field) => format!("/sobjects/{}/{}/{}", request.sobject, field, request.id),
            None => format!("/sobjects/{}/{}", request.sobject, request.id),
        };
        self.fetch(RequestSpec::get(path).with_param("fields", request.fields.join(",")))
            .await
    }

    /// Create or update depending on key material: an external id field
    /// patches the external-id path with the key stripped from the body;
    /// otherwise a record with an `Id` updates and one without creates.
    async fn upsert(&self, record: &Value, external_id_field: Option<&str>) -> Result<Value> {
        let Some(field) = external_id_field else {
            if record.get("Id").and_then(Value::as_str).is_some() {
                return self.update(record).await;
            }
            return self.create(record).await;
        };

        let sobject = sobject_type(record)?;
        let key = record
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::Configuration(format!("record is missing external id field '{field}'"))
            })?
            .to_string();
        let body = strip_fields(record, &["attributes", "Id", field]);
        self.fetch(RequestSpec::patch(
            format!("/sobjects/{sobject}/{field}/{key}"),
            body,
        ))
        .await
    }

    /// Records deleted within the window, for replication.
    async fn get_deleted(
        &self,
        sobject: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> Result<Value> {
        self.fetch(
            RequestSpec::get(format!("/sobjects/{sobject}/deleted/"))
                .with_param("start", request_date(start))
                .with_param("end", request_date(end)),
        )
        .await
    }

    /// Ids of records updated within the window, for replication.
    async fn get_updated(
        &self,
        sobject: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> Result<Value> {
        self.fetch(
            RequestSpec::get(format!("/sobjects/{sobject}/updated/"))
                .with_param("start", request_date(start))
                .with_param("end", request_date(end)),
        )
        .await
    }

    async fn recently_viewed(&self, limit: Option<u32>) -> Result<Value> {
        let mut spec = RequestSpec::get("/recent/");
        if let Some(limit) = limit {
            spec = spec.with_param("limit", limit.to_string());
        }
        self.fetch(spec).await
    }
}
