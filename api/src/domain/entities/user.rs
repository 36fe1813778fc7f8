//! User domain entity
//!
//! Customers book services; admins run the back-office.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

entity_id!(
    /// Unique identifier for a user
    UserId
);

/// Access level of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

text_enum!(Role {
    Customer => "customer",
    Admin => "admin",
});

/// A registered user of the platform
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Data needed to create a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub api_key_hash: String,
}
