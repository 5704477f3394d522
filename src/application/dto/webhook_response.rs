// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{WebhookEventType, WebhookHeaders, WebhookSubscription};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 订阅响应，不包含密钥
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub events: Vec<WebhookEventType>,
    pub headers: Option<WebhookHeaders>,
    pub is_active: bool,
    pub retry_count: i32,
    pub timeout_ms: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WebhookSubscription> for WebhookResponse {
    fn from(sub: WebhookSubscription) -> Self {
        Self {
            id: sub.id,
            name: sub.name,
            url: sub.url,
            events: sub.events,
            headers: sub.headers,
            is_active: sub.is_active,
            retry_count: sub.retry_count,
            timeout_ms: sub.timeout_ms,
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

/// 创建订阅的响应，密钥只在这里返回一次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedWebhookResponse {
    #[serde(flatten)]
    pub webhook: WebhookResponse,
    pub secret: String,
}

impl From<WebhookSubscription> for CreatedWebhookResponse {
    fn from(mut sub: WebhookSubscription) -> Self {
        let secret = std::mem::take(&mut sub.secret);
        Self {
            webhook: sub.into(),
            secret,
        }
    }
}

/// 事件分发响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub delivery_ids: Vec<Uuid>,
}
