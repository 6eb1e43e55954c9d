//! Live REST client: the executing implementation of the operation surface.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::auth::{CredentialProvider, Grant};
use crate::batch::{BatchOutcome, BatchRequest, BatchResponse, chunk_request, merge_responses};
use crate::constants::{BATCH_PATH, DATA_ROOT_PATH, DEFAULT_CHUNK_LIMIT, versioned_data_path};
use crate::error::{Error, Result};
use crate::models::{ApiVersion, UserInfo, newest_version};
use crate::operations::{BatchRecorder, DataOperations, RequestSpec};
use crate::query::{QueryIterator, QueryResponse};

/// Client for the versioned data API of one org.
///
/// Holds a pooled HTTP client, the credential provider, and the memoized
/// API version. Cheap to share by reference; all operations take `&self`.
pub struct RestClient {
    http: reqwest::Client,
    session: CredentialProvider,
    pinned_version: Option<String>,
    version_cell: OnceCell<ApiVersion>,
    chunk_limit: usize,
}

impl RestClient {
    pub fn new(session: CredentialProvider) -> Self {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("sfdc-rest/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            session,
            pinned_version: None,
            version_cell: OnceCell::new(),
            chunk_limit: DEFAULT_CHUNK_LIMIT,
        }
    }

    /// Pin the API version, skipping discovery entirely.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.pinned_version = Some(version.into());
        self
    }

    /// Override the per-call batch ceiling (the platform default is 25).
    pub fn with_chunk_limit(mut self, chunk_limit: usize) -> Self {
        self.chunk_limit = chunk_limit;
        self
    }

    pub fn session(&self) -> &CredentialProvider {
        &self.session
    }

    pub fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }

    /// Swap the credential source; invalidates the memoized version too,
    /// since discovery ran against the old credential's instance.
    pub fn replace_grant(&mut self, grant: Grant) {
        self.session.replace_grant(grant);
        self.version_cell = OnceCell::new();
    }

    /// Re-pin (or un-pin) the API version, discarding the memoized one.
    pub fn pin_version(&mut self, version: Option<String>) {
        self.pinned_version = version;
        self.version_cell = OnceCell::new();
    }

    /// Resolve the active API version.
    ///
    /// A pinned version is returned without I/O. Otherwise the discovery
    /// list is fetched once and the numerically greatest version wins; an
    /// empty list falls back to
    /// [`DEFAULT_API_VERSION`](crate::constants::DEFAULT_API_VERSION).
    /// The result is memoized; a failed discovery is not cached and the
    /// next caller retries.
    pub async fn api_version(&self) -> Result<&ApiVersion> {
        self.version_cell
            .get_or_try_init(|| async {
                if let Some(version) = &self.pinned_version {
                    return Ok(ApiVersion::from_version(version.clone()));
                }
                self.discover_version().await
            })
            .await
    }

    async fn discover_version(&self) -> Result<ApiVersion> {
        let credential = self.session.credential().await?;
        let url = format!("{}{}", credential.instance_url, DATA_ROOT_PATH);
        log::info!("discovering api versions at {url}");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&credential.access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::from_response(response, false).await);
        }

        let versions: Vec<ApiVersion> = response.json().await?;
        let selected = match newest_version(&versions) {
            Some(version) => version.clone(),
            None => {
                log::warn!("version discovery returned an empty list, using default");
                ApiVersion::from_version(crate::constants::DEFAULT_API_VERSION)
            }
        };
        log::debug!("selected api version {}", selected.version);
        Ok(selected)
    }

    /// A recorder targeting this client's resolved API version.
    pub async fn batch_recorder(&self) -> Result<BatchRecorder> {
        let version = self.api_version().await?;
        Ok(BatchRecorder::new(version.version.clone()))
    }

    /// Issue one composite batch call (at most the platform ceiling of
    /// sub-requests; callers wanting automatic splitting use
    /// [`execute_batch`](Self::execute_batch)).
    pub async fn composite_batch(&self, request: &BatchRequest) -> Result<BatchResponse> {
        let raw = self
            .fetch(RequestSpec::post(BATCH_PATH, serde_json::to_value(request)?))
            .await?;
        Ok(serde_json::from_value(raw)?)
    }

    /// Execute a recorded request sequence of any length.
    ///
    /// The sequence is split into contiguous groups of at most the chunk
    /// limit, every group is dispatched concurrently (fan-out width equals
    /// the group count and is not bounded), and the responses are merged
    /// back in submission order. If any group's call itself fails, the
    /// whole execution fails; there is no partial-success recovery.
    pub async fn execute_batch(&self, request: BatchRequest) -> Result<BatchOutcome> {
        let groups = chunk_request(&request, self.chunk_limit);
        log::info!(
            "dispatching {} sub-requests in {} batch group(s)",
            request.batch_requests.len(),
            groups.len()
        );
        let responses = try_join_all(groups.iter().map(|group| self.composite_batch(group))).await?;
        Ok(merge_responses(request, responses))
    }

    /// Fetch a continuation page using the opaque locator from a previous
    /// query response.
    pub async fn query_next(&self, locator: &str) -> Result<QueryResponse> {
        let credential = self.session.credential().await?;
        let url = format!("{}{}", credential.instance_url, locator);
        log::debug!("fetching continuation page {locator}");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&credential.access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::from_response(response, false).await);
        }
        Ok(response.json().await?)
    }

    /// A lazy, one-pass iterator over all records of a query.
    pub fn query_pages(&self, soql: impl Into<String>) -> QueryIterator<'_> {
        QueryIterator::new(self, soql)
    }

    /// The OpenID userinfo profile of the authenticated user.
    pub async fn user_info(&self) -> Result<UserInfo> {
        self.session.user_info().await
    }
}

#[async_trait]
impl DataOperations for RestClient {
    async fn fetch(&self, spec: RequestSpec) -> Result<Value> {
        let credential = self.session.credential().await?;
        let version = self.api_version().await?;

        let mut url = format!(
            "{}{}{}",
            credential.instance_url,
            versioned_data_path(&version.version),
            spec.path
        );
        let query = spec.query_string();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        log::debug!("{} {}", spec.method, url);

        let method = reqwest::Method::from_bytes(spec.method.as_bytes())
            .expect("operation surface uses valid http methods");
        let mut builder = self
            .http
            .request(method, &url)
            .bearer_auth(&credential.access_token);
        if let Some(body) = &spec.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(Error::from_response(response, false).await);
        }

        // Deletes and updates answer 204 with an empty body.
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
