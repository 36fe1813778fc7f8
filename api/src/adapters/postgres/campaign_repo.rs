//! PostgreSQL adapter for CampaignRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    Campaign, CampaignAudience, CampaignId, CampaignStatus, CampaignUpdate, NewCampaign,
};
use crate::domain::ports::CampaignRepository;
use crate::entity::campaigns;
use crate::error::DomainError;
use crate::realtime::{tables, ChangeFeed};

/// PostgreSQL implementation of CampaignRepository
pub struct PostgresCampaignRepository {
    db: DatabaseConnection,
    feed: ChangeFeed,
}

impl PostgresCampaignRepository {
    pub fn new(db: DatabaseConnection, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    async fn find_live(&self, id: &CampaignId) -> Result<campaigns::Model, DomainError> {
        campaigns::Entity::find_by_id(id.0)
            .filter(campaigns::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Campaign {}", id)))
    }

    async fn save(
        &self,
        old: campaigns::Model,
        active: campaigns::ActiveModel,
    ) -> Result<Campaign, DomainError> {
        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let old = Campaign::try_from(old)?;
        let new = Campaign::try_from(updated)?;
        self.feed.publish_update(tables::CAMPAIGNS, &old, &new);
        Ok(new)
    }
}

fn audience_json(audience: &CampaignAudience) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(audience).map_err(|e| DomainError::Internal(e.to_string()))
}

#[async_trait]
impl CampaignRepository for PostgresCampaignRepository {
    async fn create(&self, campaign: &NewCampaign) -> Result<Campaign, DomainError> {
        let status = if campaign.scheduled_for.is_some() {
            CampaignStatus::Scheduled
        } else {
            CampaignStatus::Draft
        };

        let model = campaigns::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(campaign.name.clone()),
            title: Set(campaign.title.clone()),
            message: Set(campaign.message.clone()),
            audience: Set(audience_json(&campaign.audience)?),
            status: Set(status.to_string()),
            scheduled_for: Set(campaign.scheduled_for.map(|dt| dt.fixed_offset())),
            sent_at: Set(None),
            recipients_count: Set(0),
            created_at: Set(Utc::now().fixed_offset()),
            deleted_at: Set(None),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let created = Campaign::try_from(result)?;
        self.feed.publish_insert(tables::CAMPAIGNS, &created);
        Ok(created)
    }

    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, DomainError> {
        let result = campaigns::Entity::find_by_id(id.0)
            .filter(campaigns::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(Campaign::try_from).transpose()
    }

    async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Campaign>, DomainError> {
        let results = campaigns::Entity::find()
            .filter(campaigns::Column::DeletedAt.is_null())
            .order_by_desc(campaigns::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        results.into_iter().map(Campaign::try_from).collect()
    }

    async fn update(
        &self,
        id: &CampaignId,
        update: &CampaignUpdate,
    ) -> Result<Campaign, DomainError> {
        let model = self.find_live(id).await?;

        let mut active = model.clone().into_active_model();
        if let Some(name) = &update.name {
            active.name = Set(name.clone());
        }
        if let Some(title) = &update.title {
            active.title = Set(title.clone());
        }
        if let Some(message) = &update.message {
            active.message = Set(message.clone());
        }
        if let Some(audience) = &update.audience {
            active.audience = Set(audience_json(audience)?);
        }
        if let Some(scheduled_for) = update.scheduled_for {
            active.scheduled_for = Set(Some(scheduled_for.fixed_offset()));
        }
        if let Some(status) = update.status {
            active.status = Set(status.to_string());
        }

        self.save(model, active).await
    }

    async fn claim_for_send(
        &self,
        id: &CampaignId,
        at: DateTime<Utc>,
    ) -> Result<Campaign, DomainError> {
        let before = self.find_live(id).await?;

        let result = campaigns::Entity::update_many()
            .col_expr(
                campaigns::Column::Status,
                Expr::value(CampaignStatus::Sent.to_string()),
            )
            .col_expr(campaigns::Column::SentAt, Expr::value(at.fixed_offset()))
            .col_expr(campaigns::Column::RecipientsCount, Expr::value(0))
            .filter(campaigns::Column::Id.eq(id.0))
            .filter(campaigns::Column::DeletedAt.is_null())
            .filter(campaigns::Column::Status.is_in([
                CampaignStatus::Draft.to_string(),
                CampaignStatus::Scheduled.to_string(),
            ]))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            let current = self.find_live(id).await?;
            return Err(DomainError::Conflict(format!(
                "Campaign {} is already {}",
                id, current.status
            )));
        }

        let old = Campaign::try_from(before)?;
        let new = Campaign::try_from(self.find_live(id).await?)?;
        self.feed.publish_update(tables::CAMPAIGNS, &old, &new);
        Ok(new)
    }

    async fn record_recipients(
        &self,
        id: &CampaignId,
        recipients_count: i32,
    ) -> Result<Campaign, DomainError> {
        let model = self.find_live(id).await?;

        let mut active = model.clone().into_active_model();
        active.recipients_count = Set(recipients_count);

        self.save(model, active).await
    }

    async fn soft_delete(&self, id: &CampaignId) -> Result<(), DomainError> {
        let model = self.find_live(id).await?;
        let old = Campaign::try_from(model.clone())?;

        let mut active = model.into_active_model();
        active.deleted_at = Set(Some(Utc::now().fixed_offset()));
        active
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.feed.publish_delete(tables::CAMPAIGNS, &old);
        Ok(())
    }
}

/// Convert SeaORM model to domain entity.
///
/// Fallible: a campaign with an unreadable audience must never be sent.
impl TryFrom<campaigns::Model> for Campaign {
    type Error = DomainError;

    fn try_from(model: campaigns::Model) -> Result<Self, Self::Error> {
        let audience = serde_json::from_value(model.audience).map_err(|e| {
            DomainError::Internal(format!("Campaign {} has invalid audience: {}", model.id, e))
        })?;

        Ok(Campaign {
            id: CampaignId(model.id),
            name: model.name,
            title: model.title,
            message: model.message,
            audience,
            status: model.status.parse().unwrap_or(CampaignStatus::Draft),
            scheduled_for: model.scheduled_for.map(|dt| dt.with_timezone(&Utc)),
            sent_at: model.sent_at.map(|dt| dt.with_timezone(&Utc)),
            recipients_count: model.recipients_count,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}
