//! Salesforce REST API client.
//!
//! This crate covers the client-side access layer for a Salesforce org:
//! bearer credential acquisition (JWT bearer, password, and refresh token
//! grants), API version discovery, the CRUD/query/search operation surface,
//! a record-then-execute composite batching engine, and lazy pagination
//! over query results.
//!
//! # Example
//!
//! ```rust,no_run
//! use sfdc_rest::{CredentialProvider, DataOperations, Grant, RestClient};
//!
//! # async fn run() -> sfdc_rest::Result<()> {
//! let session = CredentialProvider::new(Grant::JwtBearer {
//!     client_id: "connected-app-id".into(),
//!     username: "user@example.com".into(),
//!     private_key: None,
//!     private_key_path: Some("server.key".into()),
//!     expiry_interval: None,
//! });
//! let client = RestClient::new(session);
//!
//! // Lazy pagination over a query.
//! let mut pages = client.query_pages("select Id, Name from Account");
//! while let Some(record) = pages.next().await? {
//!     println!("{record}");
//! }
//!
//! // Record a sequence of operations, then execute it as chunked,
//! // concurrently dispatched composite batch calls.
//! let recorder = client.batch_recorder().await?;
//! recorder.create(&serde_json::json!({
//!     "attributes": {"type": "Account"},
//!     "Name": "Acme",
//! })).await?;
//! recorder.delete(&serde_json::json!({
//!     "attributes": {"type": "Contact"},
//!     "Id": "003000000000001",
//! })).await?;
//! let outcome = client.execute_batch(recorder.into_request()).await?;
//! assert!(!outcome.has_errors);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod batch;
pub mod client;
pub mod constants;
pub mod error;
pub mod models;
pub mod operations;
pub mod query;

pub use auth::{CredentialProvider, Grant, KeySource, sign_assertion};
pub use batch::{BatchOutcome, BatchRequest, BatchResponse, BatchSubRequest, BatchSubResult};
pub use client::RestClient;
pub use error::{Error, Result};
pub use models::{ApiVersion, Credential, RecordError, SaveResult, UserInfo};
pub use operations::{BatchRecorder, DataOperations, RequestSpec, RetrieveRequest};
pub use query::{QueryIterator, QueryResponse};
