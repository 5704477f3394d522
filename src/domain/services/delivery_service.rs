// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{WebhookDelivery, WebhookEventType};
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::subscription_repository::SubscriptionRepository;
use crate::domain::services::dispatcher::Dispatcher;
use crate::utils::errors::WebhookError;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 投递记录默认返回条数
pub const DEFAULT_DELIVERY_LIMIT: u64 = 50;
/// 投递记录最大返回条数
pub const MAX_DELIVERY_LIMIT: u64 = 100;

/// 投递管理服务
///
/// 提供投递历史查询、手动重新投递和测试投递
pub struct DeliveryService<S, D>
where
    S: SubscriptionRepository,
    D: DeliveryRepository,
{
    subscriptions: Arc<S>,
    deliveries: Arc<D>,
    dispatcher: Arc<Dispatcher<S, D>>,
}

impl<S, D> DeliveryService<S, D>
where
    S: SubscriptionRepository,
    D: DeliveryRepository,
{
    pub fn new(subscriptions: Arc<S>, deliveries: Arc<D>, dispatcher: Arc<Dispatcher<S, D>>) -> Self {
        Self {
            subscriptions,
            deliveries,
            dispatcher,
        }
    }

    /// 列出订阅的投递记录，最新的在前
    pub async fn list_deliveries(
        &self,
        webhook_id: Uuid,
        owner_id: Uuid,
        limit: Option<u64>,
    ) -> Result<Vec<WebhookDelivery>, WebhookError> {
        self.owned_subscription(webhook_id, owner_id).await?;

        let limit = limit
            .unwrap_or(DEFAULT_DELIVERY_LIMIT)
            .clamp(1, MAX_DELIVERY_LIMIT);
        Ok(self.deliveries.find_by_webhook(webhook_id, limit).await?)
    }

    /// 重新投递
    ///
    /// 终态记录保持不变，使用相同的事件和负载创建一条新的投递记录
    pub async fn redeliver(
        &self,
        delivery_id: Uuid,
        owner_id: Uuid,
    ) -> Result<WebhookDelivery, WebhookError> {
        let original = self
            .deliveries
            .find_by_id(delivery_id)
            .await?
            .ok_or(WebhookError::NotFound)?;
        let subscription = self
            .owned_subscription(original.webhook_id, owner_id)
            .await?;

        let delivery = self
            .dispatcher
            .dispatch_to(&subscription, original.event_type, original.payload)
            .await?;
        info!(
            original_id = %delivery_id,
            delivery_id = %delivery.id,
            "Delivery redelivered"
        );
        Ok(delivery)
    }

    /// 发送测试投递
    pub async fn send_test(
        &self,
        webhook_id: Uuid,
        owner_id: Uuid,
    ) -> Result<WebhookDelivery, WebhookError> {
        let subscription = self.owned_subscription(webhook_id, owner_id).await?;

        let payload = json!({
            "test": true,
            "message": "This is a test webhook delivery",
            "timestamp": Utc::now(),
        });

        self.dispatcher
            .dispatch_to(&subscription, WebhookEventType::ProjectCreated, payload)
            .await
    }

    async fn owned_subscription(
        &self,
        webhook_id: Uuid,
        owner_id: Uuid,
    ) -> Result<crate::domain::models::webhook::WebhookSubscription, WebhookError> {
        self.subscriptions
            .find_by_id(webhook_id)
            .await?
            .filter(|sub| sub.owner_id == owner_id)
            .ok_or(WebhookError::NotFound)
    }
}
