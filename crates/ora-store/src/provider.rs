use bytes::Bytes;
use ora_crypto::ContentAddresser;
use ora_types::Cid;
use serde::{Deserialize, Serialize};

use crate::error::{Operation, ProviderError, ProviderResult};
use crate::traits::{Capabilities, StorageBackend};

/// Whether a [`Provider`] re-hashes content it moves.
///
/// Production keeps verification enabled; disabling it is meant for
/// controlled test and development setups only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationMode {
    #[default]
    Enabled,
    Disabled,
}

impl VerificationMode {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

/// A storage backend wrapped with capability checks and content
/// self-verification.
///
/// - `fetch` hashes the returned bytes and rejects them unless they address
///   to the requested CID (v1 identifiers are normalized to v0 first).
/// - `upload` hashes the *input* and rejects the vendor's answer unless it
///   names that content.
/// - `pin` is passed through unverified.
///
/// Calls the backend cannot serve fail with [`ProviderError::Unsupported`]
/// without reaching the vendor.
pub struct Provider {
    backend: Box<dyn StorageBackend>,
    verification: VerificationMode,
}

impl Provider {
    pub fn new(backend: impl StorageBackend + 'static, verification: VerificationMode) -> Self {
        Self::from_boxed(Box::new(backend), verification)
    }

    pub fn from_boxed(backend: Box<dyn StorageBackend>, verification: VerificationMode) -> Self {
        Self {
            backend,
            verification,
        }
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    pub fn verification(&self) -> VerificationMode {
        self.verification
    }

    /// Fetch and verify the content behind `cid`.
    pub async fn fetch(&self, cid: &Cid) -> ProviderResult<Bytes> {
        self.require(Operation::Fetch)?;
        // Resolve the expected identifier first: a CID that cannot be
        // verified is rejected without a network round-trip.
        let expected = match self.verification {
            VerificationMode::Enabled => Some(cid.to_v0()?),
            VerificationMode::Disabled => None,
        };
        let content = self.backend.fetch(cid).await?;

        if let Some(expected) = expected {
            let actual = ContentAddresser.compute_cid(&content)?;
            if actual != expected {
                tracing::warn!(
                    provider = %self.name(),
                    cid = %cid,
                    computed = %actual,
                    "fetched content does not match its identifier"
                );
                return Err(ProviderError::ContentValidation {
                    expected: *cid,
                    actual,
                });
            }
        }

        Ok(content)
    }

    /// Upload `content` and verify the identifier the vendor reports.
    ///
    /// Returns the CIDv0 form whenever one exists, so identical content
    /// reported as v0 by one vendor and v1 by another compares equal.
    pub async fn upload(&self, content: &[u8], name: Option<&str>) -> ProviderResult<Cid> {
        self.require(Operation::Upload)?;
        let reported = self.backend.upload(content, name).await?;

        if self.verification.is_enabled() {
            let expected = ContentAddresser.compute_cid(content)?;
            if reported.to_v0()? != expected {
                tracing::warn!(
                    provider = %self.name(),
                    reported = %reported,
                    computed = %expected,
                    "vendor reported a CID that does not match the uploaded content"
                );
                return Err(ProviderError::ContentValidation {
                    expected,
                    actual: reported,
                });
            }
            return Ok(expected);
        }

        Ok(reported.to_v0().unwrap_or(reported))
    }

    /// Pin `cid` on the backend. Best-effort: nothing is verified.
    pub async fn pin(&self, cid: &Cid) -> ProviderResult<()> {
        self.require(Operation::Pin)?;
        self.backend.pin(cid).await
    }

    /// Upload, then pin unless the backend already pins on upload or cannot
    /// pin at all. Pin failures are logged, not returned.
    pub async fn publish(&self, content: &[u8], name: Option<&str>) -> ProviderResult<Cid> {
        let cid = self.upload(content, name).await?;

        let caps = self.capabilities();
        if caps.pin && !caps.pins_on_upload {
            if let Err(e) = self.backend.pin(&cid).await {
                tracing::warn!(provider = %self.name(), cid = %cid, error = %e, "pin after upload failed");
            }
        }

        Ok(cid)
    }

    fn require(&self, operation: Operation) -> ProviderResult<()> {
        if self.capabilities().supports(operation) {
            Ok(())
        } else {
            Err(ProviderError::Unsupported {
                provider: self.name().to_string(),
                operation,
            })
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name())
            .field("verification", &self.verification)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ora_crypto::compute_cid;
    use ora_types::codec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Backend that serves fixed bytes and reports a fixed CID.
    struct Rigged {
        serves: Bytes,
        reports: Cid,
        caps: Capabilities,
        pins: Arc<AtomicUsize>,
        fetches: Arc<AtomicUsize>,
        pin_fails: bool,
    }

    impl Rigged {
        fn honest(content: &'static [u8]) -> Self {
            Self {
                serves: Bytes::from_static(content),
                reports: compute_cid(content).unwrap(),
                caps: Capabilities::FULL,
                pins: Arc::new(AtomicUsize::new(0)),
                fetches: Arc::new(AtomicUsize::new(0)),
                pin_fails: false,
            }
        }
    }

    #[async_trait]
    impl StorageBackend for Rigged {
        fn name(&self) -> &str {
            "rigged"
        }

        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        async fn fetch(&self, _cid: &Cid) -> ProviderResult<Bytes> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.serves.clone())
        }

        async fn upload(&self, _content: &[u8], _name: Option<&str>) -> ProviderResult<Cid> {
            Ok(self.reports)
        }

        async fn pin(&self, cid: &Cid) -> ProviderResult<()> {
            self.pins.fetch_add(1, Ordering::SeqCst);
            if self.pin_fails {
                return Err(ProviderError::Pin {
                    cid: *cid,
                    reason: "quota".into(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn fetch_accepts_matching_bytes() {
        let provider = Provider::new(Rigged::honest(b"tree"), VerificationMode::Enabled);
        let cid = compute_cid(b"tree").unwrap();
        assert_eq!(&provider.fetch(&cid).await.unwrap()[..], b"tree");
    }

    #[tokio::test]
    async fn fetch_accepts_v1_request() {
        let provider = Provider::new(Rigged::honest(b"tree"), VerificationMode::Enabled);
        let cid = compute_cid(b"tree").unwrap().to_v1();
        assert!(provider.fetch(&cid).await.is_ok());
    }

    #[tokio::test]
    async fn fetch_rejects_foreign_bytes() {
        let provider = Provider::new(Rigged::honest(b"forged"), VerificationMode::Enabled);
        let cid = compute_cid(b"tree").unwrap();
        let err = provider.fetch(&cid).await.unwrap_err();
        match err {
            ProviderError::ContentValidation { expected, actual } => {
                assert_eq!(expected, cid);
                assert_eq!(actual, compute_cid(b"forged").unwrap());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unverifiable_cid_never_reaches_backend() {
        let backend = Rigged::honest(b"tree");
        let fetches = backend.fetches.clone();
        let provider = Provider::new(backend, VerificationMode::Enabled);

        let raw = Cid::v1(codec::RAW, [7; 32]).unwrap();
        let err = provider.fetch(&raw).await.unwrap_err();
        assert!(matches!(err, ProviderError::Identifier(_)));
        assert!(!err.is_retryable());
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unverified_fetch_accepts_any_codec() {
        let provider = Provider::new(Rigged::honest(b"tree"), VerificationMode::Disabled);
        let raw = Cid::v1(codec::RAW, [7; 32]).unwrap();
        assert_eq!(&provider.fetch(&raw).await.unwrap()[..], b"tree");
    }

    #[tokio::test]
    async fn fetch_unverified_passes_anything() {
        let provider = Provider::new(Rigged::honest(b"forged"), VerificationMode::Disabled);
        let cid = compute_cid(b"tree").unwrap();
        assert_eq!(&provider.fetch(&cid).await.unwrap()[..], b"forged");
    }

    #[tokio::test]
    async fn upload_rejects_lying_vendor() {
        let mut backend = Rigged::honest(b"x");
        backend.reports = compute_cid(b"something else").unwrap();
        let provider = Provider::new(backend, VerificationMode::Enabled);
        let err = provider.upload(b"report", None).await.unwrap_err();
        assert!(err.is_content_mismatch());
    }

    #[tokio::test]
    async fn upload_normalizes_v1_answer() {
        let mut backend = Rigged::honest(b"x");
        backend.reports = compute_cid(b"report").unwrap().to_v1();
        let provider = Provider::new(backend, VerificationMode::Enabled);
        let cid = provider.upload(b"report", None).await.unwrap();
        assert_eq!(cid, compute_cid(b"report").unwrap());
    }

    #[tokio::test]
    async fn unsupported_never_reaches_backend() {
        let mut backend = Rigged::honest(b"x");
        backend.caps = Capabilities::FETCH_ONLY;
        let pins = backend.pins.clone();
        let provider = Provider::new(backend, VerificationMode::Enabled);

        let err = provider.upload(b"x", None).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Unsupported {
                operation: Operation::Upload,
                ..
            }
        ));
        let err = provider.pin(&Cid::v0([0; 32])).await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(pins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn publish_pins_after_upload() {
        let backend = Rigged::honest(b"report");
        let pins = backend.pins.clone();
        let provider = Provider::new(backend, VerificationMode::Enabled);
        provider.publish(b"report", Some("report.json")).await.unwrap();
        assert_eq!(pins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publish_skips_pin_when_upload_pins() {
        let mut backend = Rigged::honest(b"report");
        backend.caps.pins_on_upload = true;
        let pins = backend.pins.clone();
        let provider = Provider::new(backend, VerificationMode::Enabled);
        provider.publish(b"report", None).await.unwrap();
        assert_eq!(pins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn publish_tolerates_pin_failure() {
        let mut backend = Rigged::honest(b"report");
        backend.pin_fails = true;
        let provider = Provider::new(backend, VerificationMode::Enabled);
        let cid = provider.publish(b"report", None).await.unwrap();
        assert_eq!(cid, compute_cid(b"report").unwrap());
    }

    #[test]
    fn verification_from_flag() {
        assert_eq!(VerificationMode::from_flag(true), VerificationMode::Enabled);
        assert!(!VerificationMode::from_flag(false).is_enabled());
        assert_eq!(VerificationMode::default(), VerificationMode::Enabled);
    }
}
