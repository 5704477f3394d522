// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{WebhookEventType, WebhookHeaders, WebhookSubscription};
use crate::domain::repositories::subscription_repository::SubscriptionRepository;
use crate::infrastructure::database::entities::webhook_subscription;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use metrics::counter;
use sea_orm::*;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Webhook订阅仓库实现
#[derive(Clone)]
pub struct SubscriptionRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepoImpl {
    /// 创建新的订阅仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn encode_events(events: &[WebhookEventType]) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(events).map_err(|e| RepositoryError::InvalidData(e.to_string()))
}

fn encode_headers(
    headers: &Option<WebhookHeaders>,
) -> Result<Option<serde_json::Value>, RepositoryError> {
    headers
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| RepositoryError::InvalidData(e.to_string()))
}

#[async_trait]
impl SubscriptionRepository for SubscriptionRepoImpl {
    async fn create(
        &self,
        subscription: &WebhookSubscription,
    ) -> Result<WebhookSubscription, RepositoryError> {
        let model = webhook_subscription::ActiveModel {
            id: Set(subscription.id),
            owner_id: Set(subscription.owner_id),
            name: Set(subscription.name.clone()),
            url: Set(subscription.url.clone()),
            events: Set(encode_events(&subscription.events)?),
            secret: Set(subscription.secret.clone()),
            headers: Set(encode_headers(&subscription.headers)?),
            is_active: Set(subscription.is_active),
            retry_count: Set(subscription.retry_count),
            timeout_ms: Set(subscription.timeout_ms),
            created_at: Set(subscription.created_at.into()),
            updated_at: Set(subscription.updated_at.into()),
        };

        webhook_subscription::Entity::insert(model)
            .exec(self.db.as_ref())
            .await?;
        Ok(subscription.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookSubscription>, RepositoryError> {
        webhook_subscription::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(WebhookSubscription::try_from)
            .transpose()
    }

    async fn find_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<WebhookSubscription>, RepositoryError> {
        webhook_subscription::Entity::find()
            .filter(webhook_subscription::Column::OwnerId.eq(owner_id))
            .order_by_desc(webhook_subscription::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(WebhookSubscription::try_from)
            .collect()
    }

    async fn find_active_for_event(
        &self,
        event_type: WebhookEventType,
    ) -> Result<Vec<WebhookSubscription>, RepositoryError> {
        // Event sets are stored as JSON arrays; matching happens here so the
        // query stays portable between PostgreSQL and SQLite.
        let models = webhook_subscription::Entity::find()
            .filter(webhook_subscription::Column::IsActive.eq(true))
            .order_by_asc(webhook_subscription::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        let mut matched = Vec::new();
        for model in models {
            let id = model.id;
            let subscription = match WebhookSubscription::try_from(model) {
                Ok(subscription) => subscription,
                Err(e) => {
                    // An unreadable row must not block delivery to the others
                    warn!("Skipping unreadable webhook subscription {}: {}", id, e);
                    counter!("webhook_delivery_skipped_total", "reason" => "invalid_subscription")
                        .increment(1);
                    continue;
                }
            };
            if subscription.accepts(event_type) {
                matched.push(subscription);
            }
        }
        Ok(matched)
    }

    async fn update(
        &self,
        subscription: &WebhookSubscription,
    ) -> Result<WebhookSubscription, RepositoryError> {
        let mut active: webhook_subscription::ActiveModel =
            webhook_subscription::Entity::find_by_id(subscription.id)
                .one(self.db.as_ref())
                .await?
                .ok_or(RepositoryError::NotFound)?
                .into();

        active.name = Set(subscription.name.clone());
        active.url = Set(subscription.url.clone());
        active.events = Set(encode_events(&subscription.events)?);
        active.headers = Set(encode_headers(&subscription.headers)?);
        active.is_active = Set(subscription.is_active);
        active.updated_at = Set(subscription.updated_at.into());

        let updated = active.update(self.db.as_ref()).await?;
        WebhookSubscription::try_from(updated)
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, RepositoryError> {
        let result = webhook_subscription::Entity::delete_many()
            .filter(webhook_subscription::Column::Id.eq(id))
            .filter(webhook_subscription::Column::OwnerId.eq(owner_id))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }
}

impl TryFrom<webhook_subscription::Model> for WebhookSubscription {
    type Error = RepositoryError;

    fn try_from(model: webhook_subscription::Model) -> Result<Self, Self::Error> {
        let events: Vec<WebhookEventType> = serde_json::from_value(model.events)
            .map_err(|e| RepositoryError::InvalidData(format!("events: {}", e)))?;
        let headers = model
            .headers
            .filter(|value| !value.is_null())
            .map(serde_json::from_value::<WebhookHeaders>)
            .transpose()
            .map_err(|e| RepositoryError::InvalidData(format!("headers: {}", e)))?;

        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            url: model.url,
            events,
            secret: model.secret,
            headers,
            is_active: model.is_active,
            retry_count: model.retry_count,
            timeout_ms: model.timeout_ms,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}
