// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{setup, Deliveries};
use async_trait::async_trait;
use hookrs::domain::models::webhook::{
    DeliveryStatus, SubscriptionPatch, WebhookDelivery, WebhookEventType,
};
use hookrs::domain::repositories::delivery_repository::DeliveryRepository;
use hookrs::domain::services::dispatcher::Dispatcher;
use hookrs::infrastructure::database::entities::webhook_subscription;
use hookrs::queue::delivery_queue::DeliveryJob;
use hookrs::utils::errors::{RepositoryError, WebhookError};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sea_orm::sea_query::Expr;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 对指定订阅的创建操作返回错误，其余委托给真实仓库
struct RejectingDeliveries {
    inner: Arc<Deliveries>,
    rejected: Vec<Uuid>,
}

#[async_trait]
impl DeliveryRepository for RejectingDeliveries {
    async fn create(&self, delivery: &WebhookDelivery) -> Result<WebhookDelivery, RepositoryError> {
        if self.rejected.contains(&delivery.webhook_id) {
            return Err(RepositoryError::InvalidData("rejected".to_string()));
        }
        self.inner.create(delivery).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookDelivery>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_webhook(
        &self,
        webhook_id: Uuid,
        limit: u64,
    ) -> Result<Vec<WebhookDelivery>, RepositoryError> {
        self.inner.find_by_webhook(webhook_id, limit).await
    }

    async fn find_unfinished(&self, limit: u64) -> Result<Vec<WebhookDelivery>, RepositoryError> {
        self.inner.find_unfinished(limit).await
    }

    async fn claim_attempt(&self, id: Uuid, expected: i32) -> Result<bool, RepositoryError> {
        self.inner.claim_attempt(id, expected).await
    }

    async fn record_outcome(&self, delivery: &WebhookDelivery) -> Result<bool, RepositoryError> {
        self.inner.record_outcome(delivery).await
    }
}

#[tokio::test]
async fn test_trigger_creates_one_delivery_per_matching_active_subscription() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();

    let first = ctx
        .subscribe(owner, "https://example.com/1", vec![WebhookEventType::ProjectCreated])
        .await;
    let second = ctx
        .subscribe(
            Uuid::new_v4(),
            "https://example.com/2",
            vec![WebhookEventType::ProjectCreated, WebhookEventType::ProjectUpdated],
        )
        .await;
    let inactive = ctx
        .subscribe(owner, "https://example.com/3", vec![WebhookEventType::ProjectCreated])
        .await;
    ctx.subscriptions
        .update(
            inactive.id,
            owner,
            SubscriptionPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let unrelated = ctx
        .subscribe(owner, "https://example.com/4", vec![WebhookEventType::ProjectDeleted])
        .await;

    let payload = json!({ "project_id": "p-1" });
    let ids = ctx
        .dispatcher
        .trigger(WebhookEventType::ProjectCreated, payload.clone())
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);

    for sub in [&first, &second] {
        let deliveries = ctx.delivery_repo.find_by_webhook(sub.id, 10).await.unwrap();
        assert_eq!(deliveries.len(), 1);
        let delivery = &deliveries[0];
        assert_eq!(delivery.status, DeliveryStatus::Pending);
        assert_eq!(delivery.attempt_count, 0);
        assert_eq!(delivery.event_type, WebhookEventType::ProjectCreated);
        assert_eq!(delivery.payload, payload);
        assert!(ids.contains(&delivery.id));
    }
    for sub in [&inactive, &unrelated] {
        let deliveries = ctx.delivery_repo.find_by_webhook(sub.id, 10).await.unwrap();
        assert!(deliveries.is_empty());
    }
}

#[tokio::test]
async fn test_trigger_without_matching_subscription_is_noop() {
    let ctx = setup().await;
    let sub = ctx
        .subscribe(
            Uuid::new_v4(),
            "https://example.com/tickets",
            vec![WebhookEventType::TicketPurchased],
        )
        .await;

    let ids = ctx
        .dispatcher
        .trigger(WebhookEventType::TicketRefunded, json!({ "ticket": 7 }))
        .await
        .unwrap();

    assert!(ids.is_empty());
    assert!(ctx
        .delivery_repo
        .find_by_webhook(sub.id, 10)
        .await
        .unwrap()
        .is_empty());
    assert!(ctx.receiver.lock().await.try_recv().is_err());
}

#[tokio::test]
async fn test_trigger_enqueues_jobs_for_workers() {
    let ctx = setup().await;
    ctx.subscribe(
        Uuid::new_v4(),
        "https://example.com/users",
        vec![WebhookEventType::UserCreated],
    )
    .await;

    let ids = ctx
        .dispatcher
        .trigger(WebhookEventType::UserCreated, json!({ "user": "u-1" }))
        .await
        .unwrap();

    let job = ctx.receiver.lock().await.try_recv().unwrap();
    assert_eq!(job, DeliveryJob::new(ids[0], 0));
}

#[tokio::test]
async fn test_trigger_skips_unreadable_subscription_rows() {
    let ctx = setup().await;
    let healthy = ctx
        .subscribe(
            Uuid::new_v4(),
            "https://example.com/healthy",
            vec![WebhookEventType::TicketPurchased],
        )
        .await;
    let broken = ctx
        .subscribe(
            Uuid::new_v4(),
            "https://example.com/broken",
            vec![WebhookEventType::TicketPurchased],
        )
        .await;

    // A tag written by a release that has since dropped it
    webhook_subscription::Entity::update_many()
        .col_expr(
            webhook_subscription::Column::Events,
            Expr::value(json!(["user.archived"])),
        )
        .filter(webhook_subscription::Column::Id.eq(broken.id))
        .exec(ctx.db.as_ref())
        .await
        .unwrap();

    let ids = ctx
        .dispatcher
        .trigger(WebhookEventType::TicketPurchased, json!({}))
        .await
        .unwrap();

    assert_eq!(ids.len(), 1);
    let deliveries = ctx
        .delivery_repo
        .find_by_webhook(healthy.id, 10)
        .await
        .unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].id, ids[0]);
}

#[tokio::test]
async fn test_trigger_returns_created_ids_when_one_subscription_fails() {
    let ctx = setup().await;
    let first = ctx
        .subscribe(Uuid::new_v4(), "https://example.com/a", vec![WebhookEventType::CrewAssigned])
        .await;
    let failing = ctx
        .subscribe(Uuid::new_v4(), "https://example.com/b", vec![WebhookEventType::CrewAssigned])
        .await;
    let last = ctx
        .subscribe(Uuid::new_v4(), "https://example.com/c", vec![WebhookEventType::CrewAssigned])
        .await;

    let dispatcher = Dispatcher::new(
        ctx.subscription_repo.clone(),
        Arc::new(RejectingDeliveries {
            inner: ctx.delivery_repo.clone(),
            rejected: vec![failing.id],
        }),
        ctx.queue.clone(),
    );

    let ids = dispatcher
        .trigger(WebhookEventType::CrewAssigned, json!({ "crew": 4 }))
        .await
        .unwrap();
    assert_eq!(ids.len(), 2);

    for sub in [&first, &last] {
        let deliveries = ctx.delivery_repo.find_by_webhook(sub.id, 10).await.unwrap();
        assert_eq!(deliveries.len(), 1);
        assert!(ids.contains(&deliveries[0].id));
    }
    assert!(ctx
        .delivery_repo
        .find_by_webhook(failing.id, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_trigger_fails_when_no_delivery_could_be_created() {
    let ctx = setup().await;
    let only = ctx
        .subscribe(Uuid::new_v4(), "https://example.com/a", vec![WebhookEventType::AssetReturned])
        .await;

    let dispatcher = Dispatcher::new(
        ctx.subscription_repo.clone(),
        Arc::new(RejectingDeliveries {
            inner: ctx.delivery_repo.clone(),
            rejected: vec![only.id],
        }),
        ctx.queue.clone(),
    );

    let result = dispatcher
        .trigger(WebhookEventType::AssetReturned, json!({}))
        .await;
    assert!(matches!(result, Err(WebhookError::Repository(_))));
}
