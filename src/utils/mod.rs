pub mod auth;

pub use auth::{create_token, verify_token, Claims, Role};
