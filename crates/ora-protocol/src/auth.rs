use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::RequestBuilder;
use sha2::Sha256;

use crate::error::{ProtocolError, ProtocolResult};

/// Static credentials presented to a vendor API.
#[derive(Clone)]
pub enum Credentials {
    Bearer(String),
    /// Secret plus authorization token, sent as two headers on every call.
    AuthSecret { secret: String, authorization: String },
}

impl Credentials {
    /// Attach the credentials to a request.
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Bearer(token) => req.bearer_auth(token),
            Self::AuthSecret {
                secret,
                authorization,
            } => req
                .header("X-Auth-Secret", secret)
                .header(reqwest::header::AUTHORIZATION, authorization),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(..)"),
            Self::AuthSecret { .. } => f.write_str("AuthSecret(..)"),
        }
    }
}

/// HMAC-SHA256 request signer for access-key credentials.
///
/// The signed string is `METHOD\nPATH\nQUERY`; the digest is sent url-safe
/// base64 encoded.
#[derive(Clone)]
pub struct RequestSigner {
    key: String,
    secret: Vec<u8>,
}

impl RequestSigner {
    pub fn new(key: impl Into<String>, encoded_secret: &str) -> ProtocolResult<Self> {
        let secret = URL_SAFE
            .decode(encoded_secret)
            .map_err(|e| ProtocolError::InvalidConfig(format!("access secret is not base64: {e}")))?;
        Ok(Self {
            key: key.into(),
            secret,
        })
    }

    pub fn access_key(&self) -> &str {
        &self.key
    }

    pub fn sign(&self, method: &str, path: &str, query: &str) -> ProtocolResult<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|e| ProtocolError::Signing(e.to_string()))?;
        mac.update(format!("{method}\n{path}\n{query}").as_bytes());
        Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_secrets() {
        let debug = format!("{:?}", Credentials::Bearer("jwt-token".into()));
        assert!(!debug.contains("jwt-token"));
        let debug = format!(
            "{:?}",
            Credentials::AuthSecret {
                secret: "hidden".into(),
                authorization: "ucan".into(),
            }
        );
        assert!(!debug.contains("hidden"));
        assert!(!debug.contains("ucan"));
    }

    #[test]
    fn bearer_sets_header() {
        let req = Credentials::Bearer("jwt".into())
            .apply(reqwest::Client::new().get("http://localhost/"))
            .build()
            .unwrap();
        assert_eq!(req.headers()["authorization"], "Bearer jwt");
    }

    #[test]
    fn auth_secret_sets_both_headers() {
        let req = Credentials::AuthSecret {
            secret: "s3cret".into(),
            authorization: "ucan-token".into(),
        }
        .apply(reqwest::Client::new().post("http://localhost/"))
        .build()
        .unwrap();
        assert_eq!(req.headers()["x-auth-secret"], "s3cret");
        assert_eq!(req.headers()["authorization"], "ucan-token");
    }

    #[test]
    fn signature_is_deterministic() {
        // "secret" in url-safe base64
        let signer = RequestSigner::new("key", "c2VjcmV0").unwrap();
        let a = signer.sign("GET", "/ipfs/Qm", "ts=1").unwrap();
        let b = signer.sign("GET", "/ipfs/Qm", "ts=1").unwrap();
        let c = signer.sign("GET", "/ipfs/Qm", "ts=2").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(URL_SAFE.decode(&a).unwrap().len(), 32);
    }

    #[test]
    fn bad_secret_rejected() {
        let err = RequestSigner::new("key", "not base64!").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidConfig(_)));
    }
}
