//! `ProgressStore` trait: the local durability seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Keys used for local persistence.
pub mod keys {
    /// Key for the `LocalProgress` record.
    pub const ONBOARDING_PROGRESS: &str = "onboarding:progress";
}

/// Cached onboarding position for this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalProgress {
    pub session_id: Uuid,
    pub step: u32,
    pub total: u32,
    pub updated_at: DateTime<Utc>,
}

impl LocalProgress {
    pub fn new(session_id: Uuid, step: u32, total: u32) -> Self {
        Self {
            session_id,
            step,
            total,
            updated_at: Utc::now(),
        }
    }
}

/// Durable key-value store for progress records.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<LocalProgress>, DatabaseError>;

    /// Insert or overwrite.
    async fn set(&self, key: &str, record: &LocalProgress) -> Result<(), DatabaseError>;

    /// Returns whether a record was removed.
    async fn delete(&self, key: &str) -> Result<bool, DatabaseError>;
}
