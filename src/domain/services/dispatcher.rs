// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{WebhookDelivery, WebhookEventType, WebhookSubscription};
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::subscription_repository::SubscriptionRepository;
use crate::queue::delivery_queue::{DeliveryJob, DeliveryQueue};
use crate::utils::errors::WebhookError;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 事件分发器
///
/// 将一个领域事件扇出到所有匹配的启用订阅：每个订阅创建一条投递记录，
/// 然后交给投递队列异步处理，调用方不等待投递结果。
pub struct Dispatcher<S, D>
where
    S: SubscriptionRepository,
    D: DeliveryRepository,
{
    subscriptions: Arc<S>,
    deliveries: Arc<D>,
    queue: DeliveryQueue,
}

impl<S, D> Dispatcher<S, D>
where
    S: SubscriptionRepository,
    D: DeliveryRepository,
{
    pub fn new(subscriptions: Arc<S>, deliveries: Arc<D>, queue: DeliveryQueue) -> Self {
        Self {
            subscriptions,
            deliveries,
            queue,
        }
    }

    /// 触发事件
    ///
    /// 没有匹配的订阅时静默返回空列表。单个订阅创建失败只记录日志，
    /// 仍返回已创建的记录；全部失败时返回最后一个错误。
    ///
    /// # 返回值
    ///
    /// 新创建的投递记录ID
    pub async fn trigger(
        &self,
        event_type: WebhookEventType,
        payload: serde_json::Value,
    ) -> Result<Vec<Uuid>, WebhookError> {
        let subscriptions = self.subscriptions.find_active_for_event(event_type).await?;

        if subscriptions.is_empty() {
            debug!("No subscriptions for event {}", event_type);
            return Ok(Vec::new());
        }

        let mut created = Vec::with_capacity(subscriptions.len());
        let mut last_error = None;
        for subscription in &subscriptions {
            match self
                .dispatch_to(subscription, event_type, payload.clone())
                .await
            {
                Ok(delivery) => created.push(delivery.id),
                Err(e) => {
                    warn!(
                        webhook_id = %subscription.id,
                        "Failed to dispatch event {}: {}", event_type, e
                    );
                    last_error = Some(e);
                }
            }
        }

        // Nothing was written, so the caller can safely retry the whole trigger
        if let (true, Some(e)) = (created.is_empty(), last_error) {
            return Err(e);
        }

        info!(
            "Event {} dispatched to {} of {} subscriptions",
            event_type,
            created.len(),
            subscriptions.len()
        );
        Ok(created)
    }

    /// 为单个订阅创建投递记录并入队
    pub async fn dispatch_to(
        &self,
        subscription: &WebhookSubscription,
        event_type: WebhookEventType,
        payload: serde_json::Value,
    ) -> Result<WebhookDelivery, WebhookError> {
        let delivery = WebhookDelivery::new(subscription.id, event_type, payload);
        let delivery = self.deliveries.create(&delivery).await?;

        counter!("webhook_dispatch_total").increment(1);

        // A pending row that never reaches the queue is picked up by startup recovery.
        match self
            .queue
            .enqueue(DeliveryJob::new(delivery.id, delivery.attempt_count))
        {
            Ok(()) => debug!(
                delivery_id = %delivery.id,
                webhook_id = %subscription.id,
                "Delivery queued"
            ),
            Err(e) => warn!(
                delivery_id = %delivery.id,
                "Failed to queue delivery: {}", e
            ),
        }
        Ok(delivery)
    }
}
