// itemvault_shared: domain types and the credential hashing seam shared by the store and the API

pub mod credentials;
pub mod models;

pub use credentials::{BcryptHasher, CredentialHasher, HashError};
pub use models::{Item, Role, RoleParseError, User};
