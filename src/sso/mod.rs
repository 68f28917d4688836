//! keeper-sso: credential storage, token issuance and its RPC surface.
pub mod server;
pub mod service;
pub mod storage;

pub use server::router;
pub use service::{AuthError, AuthService};
pub use storage::{CredentialStore, CredentialStoreError, MemoryCredentialStore, PgCredentialStore};
