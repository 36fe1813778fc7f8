//! Ad service

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entities::{Ad, AdId, AdPlacement, AdUpdate, NewAd};
use crate::domain::ports::AdRepository;
use crate::error::AppError;

pub struct AdService<AR>
where
    AR: AdRepository,
{
    ads: Arc<AR>,
}

impl<AR> AdService<AR>
where
    AR: AdRepository,
{
    pub fn new(ads: Arc<AR>) -> Self {
        Self { ads }
    }

    pub async fn create(&self, ad: &NewAd) -> Result<Ad, AppError> {
        validate_title(&ad.title)?;
        validate_url("image_url", &ad.image_url)?;
        if let Some(link) = &ad.link_url {
            validate_url("link_url", link)?;
        }
        validate_window(ad.starts_at, ad.ends_at)?;

        let ad = self.ads.create(ad).await?;
        tracing::info!(ad_id = %ad.id, placement = %ad.placement, "Ad created");
        Ok(ad)
    }

    pub async fn update(&self, id: &AdId, update: &AdUpdate) -> Result<Ad, AppError> {
        let current = self
            .ads
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ad {}", id)))?;

        if let Some(title) = &update.title {
            validate_title(title)?;
        }
        if let Some(url) = &update.image_url {
            validate_url("image_url", url)?;
        }
        if let Some(link) = &update.link_url {
            validate_url("link_url", link)?;
        }
        validate_window(
            update.starts_at.or(current.starts_at),
            update.ends_at.or(current.ends_at),
        )?;

        Ok(self.ads.update(id, update).await?)
    }

    pub async fn delete(&self, id: &AdId) -> Result<(), AppError> {
        self.ads
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ad {}", id)))?;
        self.ads.soft_delete(id).await?;
        Ok(())
    }

    /// Every ad, live or not (admin)
    pub async fn list_all(&self, placement: Option<AdPlacement>) -> Result<Vec<Ad>, AppError> {
        Ok(self.ads.list(placement).await?)
    }

    /// Ads to show right now
    pub async fn live(
        &self,
        placement: Option<AdPlacement>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ad>, AppError> {
        Ok(self
            .ads
            .list(placement)
            .await?
            .into_iter()
            .filter(|ad| ad.is_live(now))
            .collect())
    }
}

fn validate_title(title: &str) -> Result<(), AppError> {
    let len = title.trim().chars().count();
    if len == 0 || len > 120 {
        return Err(AppError::BadRequest(
            "Ad title must be 1-120 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<(), AppError> {
    if !(url.starts_with("https://") || url.starts_with("http://")) || url.len() > 2048 {
        return Err(AppError::BadRequest(format!(
            "{} must be an http(s) URL",
            field
        )));
    }
    Ok(())
}

fn validate_window(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (starts_at, ends_at) {
        if end <= start {
            return Err(AppError::BadRequest(
                "Ad must end after it starts".to_string(),
            ));
        }
    }
    Ok(())
}
