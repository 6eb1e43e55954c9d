//! Constants and path helpers for the Salesforce REST API.

/// Default login host for production orgs.
pub const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";

/// API version used when discovery returns an empty list.
pub const DEFAULT_API_VERSION: &str = "45.0";

/// Lifetime of a signed bearer assertion, in milliseconds.
pub const DEFAULT_ASSERTION_EXPIRY_MS: u64 = 60_000;

/// Maximum number of sub-requests the platform accepts in one composite
/// batch call. Larger recordings are split into groups of this size.
pub const DEFAULT_CHUNK_LIMIT: usize = 25;

/// Grant type identifier for the JWT bearer token exchange.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// OAuth endpoints relative to the login host.
pub mod oauth {
    pub const TOKEN_PATH: &str = "/services/oauth2/token";
    pub const USERINFO_PATH: &str = "/services/oauth2/userinfo";
}

/// HTTP methods used by the operation surface.
pub mod methods {
    pub const GET: &str = "GET";
    pub const POST: &str = "POST";
    pub const PATCH: &str = "PATCH";
    pub const DELETE: &str = "DELETE";
}

/// Version discovery endpoint relative to the instance host.
pub const DATA_ROOT_PATH: &str = "/services/data";

/// Composite batch endpoint relative to the versioned data path.
pub const BATCH_PATH: &str = "/composite/batch";

/// Build the versioned data path prefix, e.g. `/services/data/v45.0`.
pub fn versioned_data_path(version: &str) -> String {
    format!("{}/v{}", DATA_ROOT_PATH, version)
}

/// Build the token endpoint URL for a login host.
pub fn token_endpoint(login_url: &str) -> String {
    format!("{}{}", login_url, oauth::TOKEN_PATH)
}

/// Build the userinfo endpoint URL for a login host.
pub fn userinfo_endpoint(login_url: &str) -> String {
    format!("{}{}", login_url, oauth::USERINFO_PATH)
}
