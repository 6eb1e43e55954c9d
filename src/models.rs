//! Wire models shared across the client.

use serde::{Deserialize, Serialize};

/// Access credential obtained from a token exchange.
///
/// Immutable once obtained; the owning provider caches it for its lifetime
/// and only ever replaces it wholesale when the grant source changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub instance_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl Credential {
    /// Build a credential from a pre-acquired token, for use with
    /// [`Grant::Static`](crate::auth::Grant::Static).
    pub fn new(access_token: impl Into<String>, instance_url: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            instance_url: instance_url.into(),
            scope: None,
            id: None,
            token_type: None,
        }
    }
}

/// One entry of the version discovery list returned by `/services/data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiVersion {
    /// Numeric version string, e.g. `"45.0"`.
    pub version: String,
    pub label: String,
    /// Base path for this version, e.g. `/services/data/v45.0`.
    pub url: String,
}

impl ApiVersion {
    pub fn from_version(version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            url: crate::constants::versioned_data_path(&version),
            label: String::new(),
            version,
        }
    }
}

/// Pick the numerically greatest version from a discovery list.
///
/// Versions are compared as floating point numbers, not as strings, so
/// `"45.0"` beats `"9.0"`. The first entry wins an exact tie; entries that
/// fail to parse are skipped.
pub fn newest_version(versions: &[ApiVersion]) -> Option<&ApiVersion> {
    let mut best: Option<(&ApiVersion, f64)> = None;
    for candidate in versions {
        let Ok(parsed) = candidate.version.parse::<f64>() else {
            continue;
        };
        match best {
            Some((_, current)) if parsed <= current => {}
            _ => best = Some((candidate, parsed)),
        }
    }
    best.map(|(v, _)| v)
}

/// Result of a create call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RecordError>,
}

/// Per-record error detail embedded in save results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

/// Subset of the OpenID userinfo response the client exposes.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub zoneinfo: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn version(v: &str) -> ApiVersion {
        ApiVersion {
            version: v.to_string(),
            label: format!("Version {v}"),
            url: format!("/services/data/v{v}"),
        }
    }

    #[test]
    fn newest_version_compares_numerically() {
        let versions = vec![version("44.0"), version("45.0"), version("43.0")];
        assert_eq!(newest_version(&versions).unwrap().version, "45.0");

        // Lexicographic comparison would pick "9.0" here.
        let versions = vec![version("9.0"), version("45.0")];
        assert_eq!(newest_version(&versions).unwrap().version, "45.0");
    }

    #[test]
    fn newest_version_first_wins_on_tie() {
        let mut a = version("45.0");
        a.label = "first".to_string();
        let mut b = version("45.0");
        b.label = "second".to_string();
        assert_eq!(newest_version(&[a, b]).unwrap().label, "first");
    }

    #[test]
    fn newest_version_empty_list() {
        assert!(newest_version(&[]).is_none());
    }

    #[test]
    fn newest_version_skips_unparsable_entries() {
        let versions = vec![version("not-a-number"), version("44.0")];
        assert_eq!(newest_version(&versions).unwrap().version, "44.0");
    }

    #[test]
    fn save_result_parses_record_errors() {
        let result: SaveResult = serde_json::from_value(json!({
            "success": false,
            "errors": [{
                "message": "Required fields are missing: [Name]",
                "statusCode": "REQUIRED_FIELD_MISSING",
                "fields": ["Name"]
            }]
        }))
        .unwrap();

        assert!(!result.success);
        assert!(result.id.is_none());
        let error = &result.errors[0];
        assert_eq!(error.status_code.as_deref(), Some("REQUIRED_FIELD_MISSING"));
        assert_eq!(error.fields, vec!["Name"]);
    }
}
