//! Authentication

pub mod api_key;

pub use api_key::{auth_middleware, require_admin};
