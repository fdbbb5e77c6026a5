use crate::types::{AdId, CampaignId, EventId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Event {event_id} references ad {ad_id}, which does not exist")]
    DanglingAd { event_id: EventId, ad_id: AdId },

    #[error("Ad {ad_id} references campaign {campaign_id}, which does not exist")]
    DanglingCampaign { ad_id: AdId, campaign_id: CampaignId },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
