//! PostgreSQL adapter for AdRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{Ad, AdId, AdPlacement, AdUpdate, NewAd};
use crate::domain::ports::AdRepository;
use crate::entity::ads;
use crate::error::DomainError;
use crate::realtime::{tables, ChangeFeed};

/// PostgreSQL implementation of AdRepository
pub struct PostgresAdRepository {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

impl PostgresAdRepository {
    pub fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    async fn find_live(&self, id: &AdId) -> Result<ads::Model, DomainError> {
        ads::Entity::find_by_id(id.0)
            .filter(ads::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Ad {}", id)))
    }
}

#[async_trait]
impl AdRepository for PostgresAdRepository {
    async fn create(&self, ad: &NewAd) -> Result<Ad, DomainError> {
        let model = ads::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(ad.title.clone()),
            image_url: Set(ad.image_url.clone()),
            link_url: Set(ad.link_url.clone()),
            placement: Set(ad.placement.to_string()),
            active: Set(ad.active),
            starts_at: Set(ad.starts_at.map(|dt| dt.fixed_offset())),
            ends_at: Set(ad.ends_at.map(|dt| dt.fixed_offset())),
            created_at: Set(Utc::now().fixed_offset()),
            deleted_at: Set(None),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let created: Ad = result.into();
        self.feed.publish_insert(tables::ADS, &created);
        Ok(created)
    }

    async fn find_by_id(&self, id: &AdId) -> Result<Option<Ad>, DomainError> {
        let result = ads::Entity::find_by_id(id.0)
            .filter(ads::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn list(&self, placement: Option<AdPlacement>) -> Result<Vec<Ad>, DomainError> {
        let mut query = ads::Entity::find().filter(ads::Column::DeletedAt.is_null());
        if let Some(placement) = placement {
            query = query.filter(ads::Column::Placement.eq(placement.as_str()));
        }

        let results = query
            .order_by_desc(ads::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn update(&self, id: &AdId, update: &AdUpdate) -> Result<Ad, DomainError> {
        let model = self.find_live(id).await?;
        let old: Ad = model.clone().into();

        let mut active = model.into_active_model();
        if let Some(title) = &update.title {
            active.title = Set(title.clone());
        }
        if let Some(image_url) = &update.image_url {
            active.image_url = Set(image_url.clone());
        }
        if let Some(link_url) = &update.link_url {
            active.link_url = Set(Some(link_url.clone()));
        }
        if let Some(placement) = update.placement {
            active.placement = Set(placement.to_string());
        }
        if let Some(is_active) = update.active {
            active.active = Set(is_active);
        }
        if let Some(starts_at) = update.starts_at {
            active.starts_at = Set(Some(starts_at.fixed_offset()));
        }
        if let Some(ends_at) = update.ends_at {
            active.ends_at = Set(Some(ends_at.fixed_offset()));
        }

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let new: Ad = updated.into();
        self.feed.publish_update(tables::ADS, &old, &new);
        Ok(new)
    }

    async fn soft_delete(&self, id: &AdId) -> Result<(), DomainError> {
        let model = self.find_live(id).await?;
        let old: Ad = model.clone().into();

        let mut active = model.into_active_model();
        active.deleted_at = Set(Some(Utc::now().fixed_offset()));
        active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.feed.publish_delete(tables::ADS, &old);
        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<ads::Model> for Ad {
    fn from(model: ads::Model) -> Self {
        Ad {
            id: AdId(model.id),
            title: model.title,
            image_url: model.image_url,
            link_url: model.link_url,
            placement: model.placement.parse().unwrap_or(AdPlacement::HomeHero),
            active: model.active,
            starts_at: model.starts_at.map(|dt| dt.with_timezone(&Utc)),
            ends_at: model.ends_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
