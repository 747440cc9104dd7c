//! Credential storage and inspection.
//!
//! The [`CredentialStore`] owns the single stored access credential; the
//! [`CredentialInspector`] reads advisory claims out of it.

mod claims;
mod credentials;
mod store;
mod tokens;

pub use claims::{Claims, CredentialInspector, SubjectId, UserInfo, decode_payload};
pub use credentials::Credentials;
pub use store::{CredentialStore, FileStorage, MemoryStorage, StorageBackend};
pub use tokens::AccessToken;
