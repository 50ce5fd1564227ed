pub mod authenticator;
pub mod basic;
pub(crate) mod extractors;
pub mod ownership;
pub mod password;

pub use authenticator::{AuthFailure, Authenticator, Identity};
pub use extractors::AuthUser;
