//! Campaign service
//!
//! Marketing campaigns are drafted by admins and sent once to a resolved
//! audience as `promotion` notifications.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::notification_service::{NotificationRequest, Notifier};
use crate::domain::entities::{
    Campaign, CampaignAudience, CampaignId, CampaignStatus, CampaignUpdate, NewCampaign,
    NotificationType, Role, UserId,
};
use crate::domain::ports::{BookingRepository, CampaignRepository, UserRepository};
use crate::error::{AppError, DomainError};

/// Result of sending a campaign
#[derive(Debug, Clone, Serialize)]
pub struct CampaignSendResult {
    pub campaign: Campaign,
    pub recipients: usize,
    pub failed: usize,
}

pub struct CampaignService<CR, UR, BR, N>
where
    CR: CampaignRepository,
    UR: UserRepository,
    BR: BookingRepository,
    N: Notifier,
{
    campaigns: Arc<CR>,
    users: Arc<UR>,
    bookings: Arc<BR>,
    notifier: Arc<N>,
}

impl<CR, UR, BR, N> CampaignService<CR, UR, BR, N>
where
    CR: CampaignRepository,
    UR: UserRepository,
    BR: BookingRepository,
    N: Notifier,
{
    pub fn new(campaigns: Arc<CR>, users: Arc<UR>, bookings: Arc<BR>, notifier: Arc<N>) -> Self {
        Self {
            campaigns,
            users,
            bookings,
            notifier,
        }
    }

    pub async fn create(&self, campaign: &NewCampaign) -> Result<Campaign, AppError> {
        validate_len("name", &campaign.name, 100)?;
        validate_len("title", &campaign.title, 200)?;
        validate_len("message", &campaign.message, 2000)?;
        campaign.audience.validate().map_err(DomainError::Validation)?;

        let campaign = self.campaigns.create(campaign).await?;
        tracing::info!(campaign_id = %campaign.id, status = %campaign.status, "Campaign created");
        Ok(campaign)
    }

    pub async fn get(&self, id: &CampaignId) -> Result<Campaign, AppError> {
        self.campaigns
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {}", id)))
    }

    pub async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Campaign>, AppError> {
        Ok(self.campaigns.list(limit.clamp(1, 100), offset).await?)
    }

    /// Edit a campaign that has not been sent yet
    pub async fn update(
        &self,
        id: &CampaignId,
        update: &CampaignUpdate,
    ) -> Result<Campaign, AppError> {
        let campaign = self.get(id).await?;
        if !campaign.status.is_sendable() {
            return Err(DomainError::Conflict(format!(
                "A {} campaign cannot be edited",
                campaign.status
            ))
            .into());
        }
        if update.status == Some(CampaignStatus::Sent) {
            return Err(AppError::BadRequest(
                "Campaigns are marked sent by sending them".to_string(),
            ));
        }

        if let Some(name) = &update.name {
            validate_len("name", name, 100)?;
        }
        if let Some(title) = &update.title {
            validate_len("title", title, 200)?;
        }
        if let Some(message) = &update.message {
            validate_len("message", message, 2000)?;
        }
        if let Some(audience) = &update.audience {
            audience.validate().map_err(DomainError::Validation)?;
        }

        Ok(self.campaigns.update(id, update).await?)
    }

    pub async fn delete(&self, id: &CampaignId) -> Result<(), AppError> {
        self.get(id).await?;
        self.campaigns.soft_delete(id).await?;
        Ok(())
    }

    /// Customers a campaign goes to, evaluated at `now`, sorted by id
    pub async fn resolve_audience(
        &self,
        audience: &CampaignAudience,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserId>, AppError> {
        let customers: Vec<UserId> = self
            .users
            .list(Some(Role::Customer))
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect();

        let mut recipients = match audience {
            CampaignAudience::AllCustomers => customers,
            CampaignAudience::InactiveCustomers { days } => {
                let active = self.active_since(now - Duration::days(*days)).await?;
                customers
                    .into_iter()
                    .filter(|id| !active.contains(id))
                    .collect()
            }
            CampaignAudience::RecentCustomers { days } => {
                let active = self.active_since(now - Duration::days(*days)).await?;
                customers
                    .into_iter()
                    .filter(|id| active.contains(id))
                    .collect()
            }
        };

        recipients.sort();
        Ok(recipients)
    }

    async fn active_since(&self, since: DateTime<Utc>) -> Result<HashSet<UserId>, AppError> {
        Ok(self
            .bookings
            .customers_with_bookings_since(since)
            .await?
            .into_iter()
            .collect())
    }

    /// Send a draft or scheduled campaign. A campaign is sent at most once:
    /// it is claimed before any recipient is contacted.
    pub async fn send(
        &self,
        id: &CampaignId,
        now: DateTime<Utc>,
    ) -> Result<CampaignSendResult, AppError> {
        let campaign = self.get(id).await?;
        if !campaign.status.is_sendable() {
            return Err(DomainError::Conflict(format!(
                "Campaign {} is already {}",
                campaign.id, campaign.status
            ))
            .into());
        }

        let recipients = self.resolve_audience(&campaign.audience, now).await?;
        let campaign = self.campaigns.claim_for_send(id, now).await?;

        let template = NotificationRequest::new(
            UserId::default(),
            NotificationType::Promotion,
            campaign.title.clone(),
            campaign.message.clone(),
        )
        .with_data(serde_json::json!({
            "campaign_id": campaign.id,
            "campaign_name": campaign.name,
        }))
        .with_reference(campaign.id.0);

        let mut stored = 0usize;
        let mut failed = 0usize;
        for recipient in &recipients {
            match self.notifier.dispatch(template.to(*recipient)).await {
                Ok(_) => stored += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        campaign_id = %campaign.id,
                        user_id = %recipient,
                        error = %e,
                        "Campaign delivery failed"
                    );
                }
            }
        }

        let count = i32::try_from(stored).unwrap_or(i32::MAX);
        let campaign = match self.campaigns.record_recipients(id, count).await {
            Ok(campaign) => campaign,
            Err(e) => {
                tracing::warn!(
                    campaign_id = %campaign.id,
                    error = %e,
                    "Failed to record campaign recipients"
                );
                Campaign {
                    recipients_count: count,
                    ..campaign
                }
            }
        };
        tracing::info!(
            campaign_id = %campaign.id,
            recipients = stored,
            failed,
            "Campaign sent"
        );

        Ok(CampaignSendResult {
            campaign,
            recipients: stored,
            failed,
        })
    }
}

fn validate_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len == 0 || len > max {
        return Err(AppError::BadRequest(format!(
            "Campaign {} must be 1-{} characters",
            field, max
        )));
    }
    Ok(())
}
