// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{setup, TestContext, TEST_USER_AGENT};
use chrono::Utc;
use hookrs::domain::models::webhook::{
    DeliveryStatus, SubscriptionPatch, WebhookEventType, WebhookHeaders, WebhookSubscription,
};
use hookrs::domain::services::subscription_service::NewSubscription;
use hookrs::queue::delivery_queue::DeliveryJob;
use hookrs::utils::signature;
use hookrs::workers::delivery_worker::{AttemptOutcome, SkipReason};
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_endpoint(status: u16, body: &str, times: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(times)
        .mount(&server)
        .await;
    server
}

async fn subscribe_to(
    ctx: &TestContext,
    server: &MockServer,
    configure: impl FnOnce(&mut NewSubscription),
) -> WebhookSubscription {
    let mut input = NewSubscription::new(
        "receiver",
        format!("{}/hook", server.uri()),
        vec![WebhookEventType::TicketPurchased],
    );
    configure(&mut input);
    ctx.subscribe_with(Uuid::new_v4(), input).await
}

async fn dispatch_one(ctx: &TestContext) -> Uuid {
    let ids = ctx
        .dispatcher
        .trigger(
            WebhookEventType::TicketPurchased,
            json!({ "ticket_id": "t-42", "amount": 1999 }),
        )
        .await
        .unwrap();
    assert_eq!(ids.len(), 1);
    ids[0]
}

#[tokio::test]
async fn test_successful_delivery_is_signed_and_recorded() {
    let ctx = setup().await;
    let server = mock_endpoint(200, "received", 1).await;
    let sub = subscribe_to(&ctx, &server, |_| {}).await;
    let delivery_id = dispatch_one(&ctx).await;

    let outcome = ctx.worker().attempt(delivery_id).await.unwrap();
    assert_eq!(outcome, AttemptOutcome::Delivered);

    let delivery = ctx.delivery(delivery_id).await;
    assert_eq!(delivery.status, DeliveryStatus::Delivered);
    assert_eq!(delivery.attempt_count, 1);
    assert_eq!(delivery.response_status, Some(200));
    assert_eq!(delivery.response_body.as_deref(), Some("received"));
    assert!(delivery.delivered_at.is_some());
    assert!(delivery.error_message.is_none());

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let request = &received[0];

    let header = |name: &str| {
        request
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    assert_eq!(header("Content-Type").as_deref(), Some("application/json"));
    assert_eq!(header("X-Webhook-Event").as_deref(), Some("ticket.purchased"));
    assert_eq!(header("X-Webhook-Delivery"), Some(delivery_id.to_string()));
    assert_eq!(header("User-Agent").as_deref(), Some(TEST_USER_AGENT));

    let signature_header = header("X-Webhook-Signature").expect("signature header");
    assert!(signature_header.starts_with("t="));
    assert!(signature::verify(
        &sub.secret,
        &request.body,
        &signature_header,
        chrono::Duration::minutes(5),
        Utc::now(),
    )
    .is_ok());
    assert!(signature::verify(
        "whsec_wrong",
        &request.body,
        &signature_header,
        chrono::Duration::minutes(5),
        Utc::now(),
    )
    .is_err());

    let body: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["event"], "ticket.purchased");
    assert_eq!(body["data"]["ticket_id"], "t-42");
    assert_eq!(body["webhook_id"], sub.id.to_string());
    assert_eq!(body["delivery_id"], delivery_id.to_string());
    assert!(body["timestamp"].is_string());

    // Terminal deliveries are never attempted again.
    let again = ctx.worker().attempt(delivery_id).await.unwrap();
    assert_eq!(again, AttemptOutcome::Skipped(SkipReason::Terminal));
}

#[tokio::test]
async fn test_always_failing_endpoint_exhausts_retries() {
    let ctx = setup().await;
    let server = mock_endpoint(503, "unavailable", 3).await;
    subscribe_to(&ctx, &server, |input| input.timeout_ms = Some(5000)).await;
    let delivery_id = dispatch_one(&ctx).await;
    let worker = ctx.worker();

    let mut job = DeliveryJob::new(delivery_id, 0);
    let mut retrying = 0;
    let outcome = loop {
        match worker.attempt_job(job).await.unwrap() {
            AttemptOutcome::Retrying { next, delay } => {
                retrying += 1;
                assert_eq!(next.expected_attempt, retrying);
                assert_eq!(delay, Duration::from_millis(20 * retrying as u64));
                assert_eq!(ctx.delivery(delivery_id).await.status, DeliveryStatus::Retrying);
                job = next;
            }
            other => break other,
        }
    };

    assert_eq!(outcome, AttemptOutcome::Failed);
    assert_eq!(retrying, 2);

    let delivery = ctx.delivery(delivery_id).await;
    assert_eq!(delivery.status, DeliveryStatus::Failed);
    assert_eq!(delivery.attempt_count, 3);
    assert_eq!(delivery.response_status, Some(503));
    assert_eq!(delivery.response_body.as_deref(), Some("unavailable"));
    assert!(delivery.delivered_at.is_none());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);

    let after = worker
        .attempt_job(DeliveryJob::new(delivery_id, 3))
        .await
        .unwrap();
    assert_eq!(after, AttemptOutcome::Skipped(SkipReason::Terminal));
}

#[tokio::test]
async fn test_long_response_body_is_truncated() {
    let ctx = setup().await;
    let long_body = "é".repeat(2500);
    let server = mock_endpoint(500, &long_body, 1).await;
    subscribe_to(&ctx, &server, |_| {}).await;
    let delivery_id = dispatch_one(&ctx).await;

    ctx.worker().attempt(delivery_id).await.unwrap();

    let delivery = ctx.delivery(delivery_id).await;
    let stored = delivery.response_body.unwrap();
    assert_eq!(stored.chars().count(), 1000);
    assert!(long_body.starts_with(&stored));
}

#[tokio::test]
async fn test_deactivated_subscription_stops_retries_without_mutation() {
    let ctx = setup().await;
    let server = mock_endpoint(500, "boom", 1).await;
    let sub = subscribe_to(&ctx, &server, |_| {}).await;
    let delivery_id = dispatch_one(&ctx).await;
    let worker = ctx.worker();

    let next = match worker.attempt(delivery_id).await.unwrap() {
        AttemptOutcome::Retrying { next, .. } => next,
        other => panic!("expected retry, got {:?}", other),
    };
    let before = ctx.delivery(delivery_id).await;

    ctx.subscriptions
        .update(
            sub.id,
            sub.owner_id,
            SubscriptionPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let outcome = worker.attempt_job(next).await.unwrap();
    assert_eq!(
        outcome,
        AttemptOutcome::Skipped(SkipReason::SubscriptionInactive)
    );

    let after = ctx.delivery(delivery_id).await;
    assert_eq!(after.status, DeliveryStatus::Retrying);
    assert_eq!(after.attempt_count, before.attempt_count);
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deleted_subscription_is_skipped() {
    let ctx = setup().await;
    let server = mock_endpoint(200, "ok", 0).await;
    let sub = subscribe_to(&ctx, &server, |_| {}).await;
    let delivery_id = dispatch_one(&ctx).await;

    ctx.subscriptions.delete(sub.id, sub.owner_id).await.unwrap();

    let outcome = ctx.worker().attempt(delivery_id).await.unwrap();
    assert_eq!(
        outcome,
        AttemptOutcome::Skipped(SkipReason::SubscriptionInactive)
    );
    assert_eq!(ctx.delivery(delivery_id).await.status, DeliveryStatus::Pending);
}

#[tokio::test]
async fn test_duplicate_jobs_send_once() {
    let ctx = setup().await;
    let server = mock_endpoint(200, "ok", 1).await;
    subscribe_to(&ctx, &server, |_| {}).await;
    let delivery_id = dispatch_one(&ctx).await;
    let worker = ctx.worker();
    let job = DeliveryJob::new(delivery_id, 0);

    let (a, b) = tokio::join!(worker.attempt_job(job), worker.attempt_job(job));
    let outcomes = [a.unwrap(), b.unwrap()];

    let delivered = outcomes
        .iter()
        .filter(|o| **o == AttemptOutcome::Delivered)
        .count();
    assert_eq!(delivered, 1);
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, AttemptOutcome::Skipped(_))));

    let delivery = ctx.delivery(delivery_id).await;
    assert_eq!(delivery.attempt_count, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_job_is_dropped() {
    let ctx = setup().await;
    let server = mock_endpoint(500, "boom", 1).await;
    subscribe_to(&ctx, &server, |_| {}).await;
    let delivery_id = dispatch_one(&ctx).await;
    let worker = ctx.worker();

    worker.attempt(delivery_id).await.unwrap();

    let stale = worker
        .attempt_job(DeliveryJob::new(delivery_id, 0))
        .await
        .unwrap();
    assert_eq!(stale, AttemptOutcome::Skipped(SkipReason::Stale));
    assert_eq!(ctx.delivery(delivery_id).await.attempt_count, 1);
}

#[tokio::test]
async fn test_timeout_is_retryable_transport_failure() {
    let ctx = setup().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
        .mount(&server)
        .await;
    subscribe_to(&ctx, &server, |input| input.timeout_ms = Some(100)).await;
    let delivery_id = dispatch_one(&ctx).await;

    let outcome = ctx.worker().attempt(delivery_id).await.unwrap();
    assert!(matches!(outcome, AttemptOutcome::Retrying { .. }));

    let delivery = ctx.delivery(delivery_id).await;
    assert_eq!(delivery.status, DeliveryStatus::Retrying);
    assert_eq!(delivery.attempt_count, 1);
    assert!(delivery.response_status.is_none());
    assert!(delivery
        .error_message
        .unwrap_or_default()
        .contains("timed out"));
}

#[tokio::test]
async fn test_unreachable_endpoint_records_error() {
    let ctx = setup().await;
    let mut input = NewSubscription::new(
        "nowhere",
        "http://127.0.0.1:9/hook",
        vec![WebhookEventType::TicketPurchased],
    );
    input.retry_count = Some(1);
    ctx.subscribe_with(Uuid::new_v4(), input).await;
    let delivery_id = dispatch_one(&ctx).await;

    let outcome = ctx.worker().attempt(delivery_id).await.unwrap();
    assert_eq!(outcome, AttemptOutcome::Failed);

    let delivery = ctx.delivery(delivery_id).await;
    assert_eq!(delivery.status, DeliveryStatus::Failed);
    assert_eq!(delivery.attempt_count, 1);
    assert!(delivery.error_message.is_some());
}

#[tokio::test]
async fn test_custom_headers_cannot_override_reserved_headers() {
    let ctx = setup().await;
    let server = mock_endpoint(200, "ok", 1).await;
    subscribe_to(&ctx, &server, |input| {
        input.headers = Some(WebhookHeaders::from([
            ("X-Webhook-Event".to_string(), "spoofed".to_string()),
            ("x-webhook-signature".to_string(), "t=0,v1=00".to_string()),
            ("X-Tenant".to_string(), "acme".to_string()),
            ("Bad Header".to_string(), "ignored".to_string()),
        ]));
    })
    .await;
    let delivery_id = dispatch_one(&ctx).await;

    let outcome = ctx.worker().attempt(delivery_id).await.unwrap();
    assert_eq!(outcome, AttemptOutcome::Delivered);

    let received = server.received_requests().await.unwrap();
    let headers = &received[0].headers;
    assert_eq!(headers.get_all("X-Webhook-Event").iter().count(), 1);
    assert_eq!(headers.get("X-Webhook-Event").unwrap(), "ticket.purchased");
    assert_ne!(headers.get("X-Webhook-Signature").unwrap(), "t=0,v1=00");
    assert_eq!(headers.get("X-Tenant").unwrap(), "acme");
}
