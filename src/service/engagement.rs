//! Edge toggles: likes and subscriptions
//!
//! A toggle is insert-first: try to create the edge, and if the unique
//! index says it already exists, remove it instead. Both directions are
//! idempotent under concurrency; the losing side of a race observes a
//! no-op and still gets a truthful final state back.

use std::sync::Arc;

use serde::Serialize;

use crate::data::{Database, LikeTarget};
use crate::error::AppError;
use crate::metrics::TOGGLES_TOTAL;

/// Result of a toggle: the edge's new state plus the recomputed count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub active: bool,
    pub count: i64,
}

pub struct EngagementService {
    db: Arc<Database>,
}

impl EngagementService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Toggle a like edge on a video, comment or tweet.
    ///
    /// # Errors
    /// Returns not-found if the target does not exist
    pub async fn toggle_like(
        &self,
        actor_id: &str,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<ToggleOutcome, AppError> {
        self.ensure_target_exists(target, target_id).await?;

        let active = if self.db.try_insert_like(actor_id, target, target_id).await? {
            true
        } else {
            // Edge already present: this call is the "off" direction.
            // A concurrent remover winning the delete still leaves us
            // with the right answer.
            self.db.delete_like(actor_id, target, target_id).await?;
            false
        };

        let outcome = if active { "on" } else { "off" };
        TOGGLES_TOTAL
            .with_label_values(&["like", outcome])
            .inc();
        tracing::debug!(target = target.as_str(), %target_id, active, "Like toggled");

        Ok(ToggleOutcome {
            active,
            count: self.db.count_likes(target, target_id).await?,
        })
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Toggle a subscription edge from subscriber to channel.
    ///
    /// # Errors
    /// Returns validation error on self-subscription, not-found for an
    /// unknown channel
    pub async fn toggle_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<ToggleOutcome, AppError> {
        if subscriber_id == channel_id {
            return Err(AppError::Validation(
                "cannot subscribe to your own channel".to_string(),
            ));
        }
        if self.db.get_account_by_id(channel_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let active = if self
            .db
            .try_insert_subscription(subscriber_id, channel_id)
            .await?
        {
            true
        } else {
            self.db
                .delete_subscription(subscriber_id, channel_id)
                .await?;
            false
        };

        let outcome = if active { "on" } else { "off" };
        TOGGLES_TOTAL
            .with_label_values(&["subscription", outcome])
            .inc();
        tracing::debug!(%channel_id, active, "Subscription toggled");

        Ok(ToggleOutcome {
            active,
            count: self.db.count_subscribers(channel_id).await?,
        })
    }

    async fn ensure_target_exists(
        &self,
        target: LikeTarget,
        target_id: &str,
    ) -> Result<(), AppError> {
        let exists = match target {
            LikeTarget::Video => self.db.get_video(target_id).await?.is_some(),
            LikeTarget::Comment => self.db.get_comment(target_id).await?.is_some(),
            LikeTarget::Tweet => self.db.get_tweet(target_id).await?.is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}
