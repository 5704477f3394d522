// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::setup;
use hookrs::domain::models::webhook::{DeliveryStatus, WebhookDelivery, WebhookEventType};
use hookrs::domain::repositories::delivery_repository::DeliveryRepository;
use hookrs::utils::errors::WebhookError;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
async fn test_list_deliveries_newest_first_with_limit() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let sub = ctx
        .subscribe(owner, "https://example.com/a", vec![WebhookEventType::EventCreated])
        .await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let created = ctx
            .dispatcher
            .trigger(WebhookEventType::EventCreated, json!({ "n": i }))
            .await
            .unwrap();
        ids.push(created[0]);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let all = ctx.deliveries.list_deliveries(sub.id, owner, None).await.unwrap();
    let listed: Vec<Uuid> = all.iter().map(|d| d.id).collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

    let limited = ctx
        .deliveries
        .list_deliveries(sub.id, owner, Some(2))
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);

    let foreign = ctx
        .deliveries
        .list_deliveries(sub.id, Uuid::new_v4(), None)
        .await;
    assert!(matches!(foreign, Err(WebhookError::NotFound)));
}

#[tokio::test]
async fn test_redeliver_creates_new_delivery_and_keeps_original() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let sub = ctx
        .subscribe(owner, "https://example.com/a", vec![WebhookEventType::OrderCancelled])
        .await;

    let mut failed = WebhookDelivery::new(
        sub.id,
        WebhookEventType::OrderCancelled,
        json!({ "order": 12 }),
    );
    failed.status = DeliveryStatus::Failed;
    failed.attempt_count = 3;
    failed.response_status = Some(500);
    ctx.delivery_repo.create(&failed).await.unwrap();

    let redelivered = ctx.deliveries.redeliver(failed.id, owner).await.unwrap();
    assert_ne!(redelivered.id, failed.id);
    assert_eq!(redelivered.status, DeliveryStatus::Pending);
    assert_eq!(redelivered.attempt_count, 0);
    assert_eq!(redelivered.event_type, WebhookEventType::OrderCancelled);
    assert_eq!(redelivered.payload, json!({ "order": 12 }));

    let original = ctx.delivery(failed.id).await;
    assert_eq!(original.status, DeliveryStatus::Failed);
    assert_eq!(original.attempt_count, 3);

    assert!(matches!(
        ctx.deliveries.redeliver(failed.id, Uuid::new_v4()).await,
        Err(WebhookError::NotFound)
    ));
    assert!(matches!(
        ctx.deliveries.redeliver(Uuid::new_v4(), owner).await,
        Err(WebhookError::NotFound)
    ));
}

#[tokio::test]
async fn test_send_test_creates_project_created_delivery() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let sub = ctx
        .subscribe(owner, "https://example.com/a", vec![WebhookEventType::UserUpdated])
        .await;

    let delivery = ctx.deliveries.send_test(sub.id, owner).await.unwrap();
    assert_eq!(delivery.webhook_id, sub.id);
    assert_eq!(delivery.event_type, WebhookEventType::ProjectCreated);
    assert_eq!(delivery.payload["test"], json!(true));
    assert_eq!(
        delivery.payload["message"],
        json!("This is a test webhook delivery")
    );
    assert!(delivery.payload["timestamp"].is_string());

    let job = ctx.receiver.lock().await.try_recv().unwrap();
    assert_eq!(job.delivery_id, delivery.id);

    assert!(matches!(
        ctx.deliveries.send_test(sub.id, Uuid::new_v4()).await,
        Err(WebhookError::NotFound)
    ));
}
