//! Credential model and the store that owns it.

pub mod credentials;
pub mod secret;
pub mod store;

pub use credentials::*;
pub use secret::*;
pub use store::*;
