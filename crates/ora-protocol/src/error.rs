use ora_store::ProviderError;
use ora_types::Cid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("signing error: {0}")]
    Signing(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl From<ProtocolError> for ProviderError {
    fn from(err: ProtocolError) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

impl ProtocolError {
    pub(crate) fn into_fetch(self, cid: &Cid) -> ProviderError {
        ProviderError::Fetch {
            cid: *cid,
            reason: self.to_string(),
        }
    }

    pub(crate) fn into_upload(self) -> ProviderError {
        ProviderError::Upload(self.to_string())
    }

    pub(crate) fn into_pin(self, cid: &Cid) -> ProviderError {
        ProviderError::Pin {
            cid: *cid,
            reason: self.to_string(),
        }
    }
}
