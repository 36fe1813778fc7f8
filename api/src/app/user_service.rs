//! User service
//!
//! Handles customer registration, admin bootstrap and API key lookup.

use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::adapters::normalize_phone;
use crate::domain::entities::{NewUser, Role, User, UserId};
use crate::domain::ports::UserRepository;
use crate::error::{AppError, DomainError};

/// Registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Service for managing users
pub struct UserService<UR>
where
    UR: UserRepository,
{
    users: Arc<UR>,
    default_country_code: String,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    pub fn new(users: Arc<UR>, default_country_code: String) -> Self {
        Self {
            users,
            default_country_code,
        }
    }

    /// Register a customer.
    ///
    /// Returns (user, api_key); the key is only shown once.
    pub async fn register(&self, registration: &Registration) -> Result<(User, String), AppError> {
        self.create_user(registration, Role::Customer).await
    }

    /// Create the admin account if it does not exist yet.
    ///
    /// Returns the new API key when an account was created.
    pub async fn bootstrap_admin(&self, email: &str) -> Result<Option<String>, AppError> {
        if let Some(existing) = self.users.find_by_email(email).await? {
            if !existing.is_admin() {
                tracing::warn!(email = %email, "ADMIN_EMAIL belongs to a customer account");
            }
            return Ok(None);
        }

        let registration = Registration {
            email: email.to_string(),
            full_name: "Administrator".to_string(),
            phone: None,
        };
        let (_, api_key) = self.create_user(&registration, Role::Admin).await?;
        Ok(Some(api_key))
    }

    async fn create_user(
        &self,
        registration: &Registration,
        role: Role,
    ) -> Result<(User, String), AppError> {
        let email = registration.email.trim().to_lowercase();
        if !is_plausible_email(&email) {
            return Err(AppError::BadRequest("A valid email is required".to_string()));
        }

        let full_name = registration.full_name.trim();
        if full_name.is_empty() || full_name.len() > 100 {
            return Err(AppError::BadRequest(
                "Name must be between 1 and 100 characters".to_string(),
            ));
        }

        let phone = match registration.phone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                normalize_phone(raw, &self.default_country_code)
                    .map(|digits| format!("+{}", digits))
                    .ok_or_else(|| AppError::BadRequest(format!("Invalid phone number: {}", raw)))?,
            ),
        };

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                email
            ))));
        }

        let api_key = generate_api_key();
        let user = self
            .users
            .create(&NewUser {
                email,
                full_name: full_name.to_string(),
                phone,
                role,
                api_key_hash: hash_api_key(&api_key),
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok((user, api_key))
    }

    /// Find a user by their API key hash
    pub async fn find_by_api_key(&self, api_key_hash: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_api_key_hash(api_key_hash).await?)
    }

    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_id(id).await?)
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Generate a random API key
fn generate_api_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!("dh-{}", hex::encode(bytes))
}

/// Hash an API key for storage
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}
