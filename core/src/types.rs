//! Shared primitive types used across the engine.

/// Opaque user identifier, as delivered by the import.
pub type UserId = String;

/// Campaign identifier.
pub type CampaignId = i64;

/// Ad identifier.
pub type AdId = i64;

/// Event identifier.
pub type EventId = i64;

/// Calendar day an event occurred on. Rollups are keyed by this, never by
/// the campaign's date range.
pub type Day = chrono::NaiveDate;
