// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::setup;
use hookrs::domain::models::webhook::{SubscriptionPatch, WebhookEventType, WebhookHeaders};
use hookrs::domain::services::subscription_service::NewSubscription;
use hookrs::utils::errors::WebhookError;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
async fn test_create_generates_secret_and_defaults() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();

    let sub = ctx
        .subscribe(
            owner,
            "https://example.com/hooks",
            vec![WebhookEventType::TicketPurchased],
        )
        .await;

    assert!(sub.secret.len() >= 32);
    assert!(sub.is_active);
    assert_eq!(sub.retry_count, 3);
    assert_eq!(sub.timeout_ms, 5000);
    assert_eq!(sub.owner_id, owner);

    let stored = ctx.subscriptions.get(sub.id, owner).await.unwrap();
    assert_eq!(stored.secret, sub.secret);
    assert_eq!(stored.events, vec![WebhookEventType::TicketPurchased]);
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();

    let bad_url = ctx
        .subscriptions
        .create(
            owner,
            NewSubscription::new("hook", "not-a-url", vec![WebhookEventType::UserCreated]),
        )
        .await;
    assert!(matches!(bad_url, Err(WebhookError::Validation(_))));

    let no_events = ctx
        .subscriptions
        .create(owner, NewSubscription::new("hook", "https://example.com", vec![]))
        .await;
    assert!(matches!(no_events, Err(WebhookError::Validation(_))));

    assert!(ctx.subscriptions.list_by_owner(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_is_scoped_to_owner() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let sub = ctx
        .subscribe(owner, "https://example.com/a", vec![WebhookEventType::UserCreated])
        .await;

    let patch = SubscriptionPatch {
        name: Some("renamed".to_string()),
        ..Default::default()
    };
    let foreign = ctx
        .subscriptions
        .update(sub.id, Uuid::new_v4(), patch.clone())
        .await;
    assert!(matches!(foreign, Err(WebhookError::NotFound)));

    let updated = ctx.subscriptions.update(sub.id, owner, patch).await.unwrap();
    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.url, sub.url);
    assert_eq!(updated.secret, sub.secret);
}

#[tokio::test]
async fn test_partial_update_of_headers_events_and_active() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let mut input = NewSubscription::new(
        "hook",
        "https://example.com/a",
        vec![WebhookEventType::UserCreated],
    );
    input.headers = Some(WebhookHeaders::from([(
        "X-Api-Key".to_string(),
        "abc".to_string(),
    )]));
    let sub = ctx.subscribe_with(owner, input).await;

    let updated = ctx
        .subscriptions
        .update(
            sub.id,
            owner,
            SubscriptionPatch {
                events: Some(vec![
                    WebhookEventType::PaymentFailed,
                    WebhookEventType::PaymentFailed,
                ]),
                headers: Some(WebhookHeaders::new()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.events, vec![WebhookEventType::PaymentFailed]);
    assert!(updated.headers.is_none());
    assert!(!updated.is_active);

    let invalid = ctx
        .subscriptions
        .update(
            sub.id,
            owner,
            SubscriptionPatch {
                url: Some("ftp://example.com".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(invalid, Err(WebhookError::Validation(_))));
}

#[tokio::test]
async fn test_list_by_owner_newest_first() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();

    let first = ctx
        .subscribe(owner, "https://example.com/1", vec![WebhookEventType::UserCreated])
        .await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = ctx
        .subscribe(owner, "https://example.com/2", vec![WebhookEventType::UserCreated])
        .await;
    ctx.subscribe(
        Uuid::new_v4(),
        "https://example.com/other",
        vec![WebhookEventType::UserCreated],
    )
    .await;

    let listed = ctx.subscriptions.list_by_owner(owner).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_list_active_for_event_filters() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();

    let matching = ctx
        .subscribe(
            owner,
            "https://example.com/match",
            vec![WebhookEventType::TicketPurchased, WebhookEventType::TicketRefunded],
        )
        .await;
    let inactive = ctx
        .subscribe(owner, "https://example.com/off", vec![WebhookEventType::TicketPurchased])
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
    ctx.subscribe(owner, "https://example.com/other", vec![WebhookEventType::UserCreated])
        .await;

    let active = ctx
        .subscriptions
        .list_active_for_event(WebhookEventType::TicketPurchased)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, matching.id);
}

#[tokio::test]
async fn test_delete_keeps_delivery_history() {
    let ctx = setup().await;
    let owner = Uuid::new_v4();
    let sub = ctx
        .subscribe(owner, "https://example.com/a", vec![WebhookEventType::UserCreated])
        .await;
    let ids = ctx
        .dispatcher
        .trigger(WebhookEventType::UserCreated, serde_json::json!({ "id": 1 }))
        .await
        .unwrap();

    assert!(matches!(
        ctx.subscriptions.delete(sub.id, Uuid::new_v4()).await,
        Err(WebhookError::NotFound)
    ));
    ctx.subscriptions.delete(sub.id, owner).await.unwrap();

    assert!(matches!(
        ctx.subscriptions.get(sub.id, owner).await,
        Err(WebhookError::NotFound)
    ));
    assert!(matches!(
        ctx.subscriptions.delete(sub.id, owner).await,
        Err(WebhookError::NotFound)
    ));

    let delivery = ctx.delivery(ids[0]).await;
    assert_eq!(delivery.webhook_id, sub.id);
}
