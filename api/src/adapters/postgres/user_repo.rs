//! PostgreSQL adapter for UserRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{NewUser, Role, User, UserId};
use crate::domain::ports::UserRepository;
use crate::entity::users;
use crate::error::DomainError;

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError> {
        let result = users::Entity::find()
            .filter(users::Column::ApiKeyHash.eq(hash))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn create(&self, user: &NewUser) -> Result<User, DomainError> {
        let model = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(user.email.to_lowercase()),
            full_name: Set(user.full_name.clone()),
            phone: Set(user.phone.clone()),
            role: Set(user.role.to_string()),
            api_key_hash: Set(user.api_key_hash.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, DomainError> {
        let mut query = users::Entity::find();
        if let Some(role) = role {
            query = query.filter(users::Column::Role.eq(role.to_string()));
        }

        let results = query
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }
}

/// Convert SeaORM model to domain entity
impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        User {
            id: UserId(model.id),
            email: model.email,
            full_name: model.full_name,
            phone: model.phone,
            role: model.role.parse().unwrap_or(Role::Customer),
            api_key_hash: model.api_key_hash,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
