//! Token issuance and the request authorization gate.

pub mod gate;
pub mod token;

pub use gate::{AuthError, AuthGate, Identity};
pub use token::{Claims, TokenError, TokenService};
