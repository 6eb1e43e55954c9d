//! Signed bearer assertion construction for the JWT bearer grant.
//!
//! The platform verifies the exact byte sequence it receives, so the
//! encoding here is load-bearing: header and claims are canonical JSON,
//! each encoded as unpadded url-safe base64, joined with dots, and the
//! RSA-SHA256 signature covers that exact joined string.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use serde::Serialize;
use sha2::Sha256;

use crate::error::{Error, Result};

/// Where the RSA private key comes from.
///
/// A file-backed key is read on each signing call and dropped as soon as the
/// signature is produced; it is never cached.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// PEM text held in memory (PKCS#8 or PKCS#1).
    Pem(String),
    /// Path to a PEM file.
    Path(PathBuf),
}

impl KeySource {
    /// Resolve optional key material the way grant configuration supplies it:
    /// inline PEM wins over a path; neither present is a configuration error.
    pub fn from_options(pem: Option<&str>, path: Option<&PathBuf>) -> Result<Self> {
        match (pem, path) {
            (Some(pem), _) => Ok(Self::Pem(pem.to_string())),
            (None, Some(path)) => Ok(Self::Path(path.clone())),
            (None, None) => Err(Error::Configuration(
                "jwt bearer grant requires a private key or a private key path".to_string(),
            )),
        }
    }

    fn read(&self) -> Result<String> {
        match self {
            Self::Pem(pem) => Ok(pem.clone()),
            Self::Path(path) => Ok(std::fs::read_to_string(path)?),
        }
    }
}

#[derive(Serialize)]
struct Header<'a> {
    alg: &'a str,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    exp: u64,
}

/// Build and sign a bearer assertion for the JWT bearer token exchange.
///
/// `issuer` is the connected app client id, `subject` the username, and
/// `audience` the login host. The assertion expires `expiry_interval` after
/// the current time (epoch milliseconds, matching what the verifier was
/// provisioned against).
pub fn sign_assertion(
    issuer: &str,
    subject: &str,
    audience: &str,
    expiry_interval: Duration,
    key: &KeySource,
) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch");
    let exp = now.as_millis() as u64 + expiry_interval.as_millis() as u64;

    let header = Header { alg: "RS256" };
    let claims = Claims {
        iss: issuer,
        sub: subject,
        aud: audience,
        exp,
    };

    let unsigned = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?),
    );

    let pem = key.read()?;
    let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
        .map_err(|e| Error::Signing(format!("unable to parse private key: {e}")))?;

    let signing_key = SigningKey::<Sha256>::new(private_key);
    let signature = signing_key
        .try_sign(unsigned.as_bytes())
        .map_err(|e| Error::Signing(format!("signature operation failed: {e}")))?;

    Ok(format!(
        "{}.{}",
        unsigned,
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1v15::{Signature, VerifyingKey};
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};
    use rsa::signature::Verifier;
    use serde_json::Value;

    fn test_key() -> (RsaPrivateKey, String) {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("key generation");
        let pem = key.to_pkcs8_pem(LineEnding::LF).expect("pem encode").to_string();
        (key, pem)
    }

    #[test]
    fn assertion_has_three_canonical_segments() {
        let (_, pem) = test_key();
        let assertion = sign_assertion(
            "client-id",
            "user@example.com",
            "https://login.salesforce.com",
            Duration::from_millis(60_000),
            &KeySource::Pem(pem),
        )
        .unwrap();

        let segments: Vec<&str> = assertion.split('.').collect();
        assert_eq!(segments.len(), 3);

        // Segments are unpadded url-safe base64 of the canonical JSON.
        let header = URL_SAFE_NO_PAD.decode(segments[0]).unwrap();
        assert_eq!(header, br#"{"alg":"RS256"}"#);

        let claims: Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[1]).unwrap()).unwrap();
        assert_eq!(claims["iss"], "client-id");
        assert_eq!(claims["sub"], "user@example.com");
        assert_eq!(claims["aud"], "https://login.salesforce.com");
        assert!(claims["exp"].is_u64());
    }

    #[test]
    fn expiry_is_epoch_millis_plus_interval() {
        let (_, pem) = test_key();
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let assertion = sign_assertion(
            "iss",
            "sub",
            "aud",
            Duration::from_millis(60_000),
            &KeySource::Pem(pem),
        )
        .unwrap();
        let after = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        let claims_segment = assertion.split('.').nth(1).unwrap();
        let claims: Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(claims_segment).unwrap()).unwrap();
        let exp = claims["exp"].as_u64().unwrap();
        assert!(exp >= before + 60_000);
        assert!(exp <= after + 60_000);
    }

    #[test]
    fn signature_verifies_against_public_key() {
        let (key, pem) = test_key();
        let assertion = sign_assertion(
            "iss",
            "sub",
            "aud",
            Duration::from_millis(1_000),
            &KeySource::Pem(pem),
        )
        .unwrap();

        let dot = assertion.rfind('.').unwrap();
        let (unsigned, signature_segment) = (&assertion[..dot], &assertion[dot + 1..]);
        let signature_bytes = URL_SAFE_NO_PAD.decode(signature_segment).unwrap();
        let signature = Signature::try_from(signature_bytes.as_slice()).unwrap();

        let verifying_key = VerifyingKey::<Sha256>::new(key.to_public_key());
        verifying_key
            .verify(unsigned.as_bytes(), &signature)
            .expect("signature must verify over the unsigned assertion");
    }

    #[test]
    fn missing_key_material_is_a_configuration_error() {
        let err = KeySource::from_options(None, None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn garbage_key_is_a_signing_error() {
        let err = sign_assertion(
            "iss",
            "sub",
            "aud",
            Duration::from_millis(1_000),
            &KeySource::Pem("not a pem".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }
}
