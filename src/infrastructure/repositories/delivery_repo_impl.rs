// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::webhook::{WebhookDelivery, WebhookEventType};
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::infrastructure::database::entities::sea_orm_active_enums::SeaDeliveryStatus;
use crate::infrastructure::database::entities::webhook_delivery;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

const OPEN_STATUSES: [SeaDeliveryStatus; 2] = [SeaDeliveryStatus::Pending, SeaDeliveryStatus::Retrying];

/// Webhook投递仓库实现
#[derive(Clone)]
pub struct DeliveryRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl DeliveryRepoImpl {
    /// 创建新的投递仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeliveryRepository for DeliveryRepoImpl {
    async fn create(&self, delivery: &WebhookDelivery) -> Result<WebhookDelivery, RepositoryError> {
        let active_model = webhook_delivery::ActiveModel {
            id: Set(delivery.id),
            webhook_id: Set(delivery.webhook_id),
            event_type: Set(delivery.event_type.to_string()),
            payload: Set(delivery.payload.clone()),
            status: Set(delivery.status.into()),
            response_status: Set(delivery.response_status),
            response_body: Set(delivery.response_body.clone()),
            error_message: Set(delivery.error_message.clone()),
            attempt_count: Set(delivery.attempt_count),
            delivered_at: Set(delivery.delivered_at.map(Into::into)),
            created_at: Set(delivery.created_at.into()),
            updated_at: Set(delivery.updated_at.into()),
        };

        webhook_delivery::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await?;

        Ok(delivery.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookDelivery>, RepositoryError> {
        webhook_delivery::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(WebhookDelivery::try_from)
            .transpose()
    }

    async fn find_by_webhook(
        &self,
        webhook_id: Uuid,
        limit: u64,
    ) -> Result<Vec<WebhookDelivery>, RepositoryError> {
        webhook_delivery::Entity::find()
            .filter(webhook_delivery::Column::WebhookId.eq(webhook_id))
            .order_by_desc(webhook_delivery::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(WebhookDelivery::try_from)
            .collect()
    }

    async fn find_unfinished(&self, limit: u64) -> Result<Vec<WebhookDelivery>, RepositoryError> {
        webhook_delivery::Entity::find()
            .filter(webhook_delivery::Column::Status.is_in(OPEN_STATUSES))
            .order_by_asc(webhook_delivery::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(WebhookDelivery::try_from)
            .collect()
    }

    async fn claim_attempt(&self, id: Uuid, expected: i32) -> Result<bool, RepositoryError> {
        let claim = webhook_delivery::ActiveModel {
            attempt_count: Set(expected + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let result = webhook_delivery::Entity::update_many()
            .set(claim)
            .filter(webhook_delivery::Column::Id.eq(id))
            .filter(webhook_delivery::Column::AttemptCount.eq(expected))
            .filter(webhook_delivery::Column::Status.is_in(OPEN_STATUSES))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn record_outcome(&self, delivery: &WebhookDelivery) -> Result<bool, RepositoryError> {
        let outcome = webhook_delivery::ActiveModel {
            status: Set(delivery.status.into()),
            response_status: Set(delivery.response_status),
            response_body: Set(delivery.response_body.clone()),
            error_message: Set(delivery.error_message.clone()),
            delivered_at: Set(delivery.delivered_at.map(Into::into)),
            updated_at: Set(delivery.updated_at.into()),
            ..Default::default()
        };

        let result = webhook_delivery::Entity::update_many()
            .set(outcome)
            .filter(webhook_delivery::Column::Id.eq(delivery.id))
            .filter(webhook_delivery::Column::AttemptCount.eq(delivery.attempt_count))
            .filter(webhook_delivery::Column::Status.is_in(OPEN_STATUSES))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected == 1)
    }
}

impl TryFrom<webhook_delivery::Model> for WebhookDelivery {
    type Error = RepositoryError;

    fn try_from(model: webhook_delivery::Model) -> Result<Self, Self::Error> {
        let event_type = model
            .event_type
            .parse::<WebhookEventType>()
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;

        Ok(Self {
            id: model.id,
            webhook_id: model.webhook_id,
            event_type,
            payload: model.payload,
            status: model.status.into(),
            response_status: model.response_status,
            response_body: model.response_body,
            error_message: model.error_message,
            attempt_count: model.attempt_count,
            delivered_at: model.delivered_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}
