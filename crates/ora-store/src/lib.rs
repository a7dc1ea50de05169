//! Storage provider capability for ORA.
//!
//! A storage provider is anything that can fetch, upload or pin
//! content-addressed payloads. Vendor adapters implement the narrow
//! [`StorageBackend`] trait; callers only ever see [`Provider`], which wraps a
//! backend and checks every byte it moves against the identifier.
//!
//! # Rules
//!
//! 1. Fetched bytes must hash to the requested CID, or the fetch fails.
//! 2. An upload fails unless the vendor's CID names the uploaded bytes.
//! 3. Operations a backend lacks fail as `Unsupported` before any I/O.
//! 4. Pinning is best-effort after a successful upload.

pub mod error;
pub mod memory;
pub mod provider;
pub mod traits;

pub use error::{Operation, ProviderError, ProviderResult};
pub use memory::InMemoryBackend;
pub use provider::{Provider, VerificationMode};
pub use traits::{Capabilities, FetchScope, StorageBackend};
