// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{SubscriptionPatch, WebhookEventType, WebhookHeaders};
use crate::domain::services::subscription_service::NewSubscription;
use crate::utils::errors::WebhookError;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 创建订阅请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateWebhookRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 1))]
    pub events: Vec<String>,
    pub headers: Option<WebhookHeaders>,
    #[validate(range(min = 1, max = 10))]
    pub retry_count: Option<i32>,
    #[validate(range(min = 100, max = 60000))]
    pub timeout_ms: Option<i32>,
}

impl TryFrom<CreateWebhookRequest> for NewSubscription {
    type Error = WebhookError;

    fn try_from(request: CreateWebhookRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: request.name,
            url: request.url,
            events: parse_events(&request.events)?,
            headers: request.headers,
            retry_count: request.retry_count,
            timeout_ms: request.timeout_ms,
        })
    }
}

/// 部分更新订阅请求
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct UpdateWebhookRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
    #[validate(length(min = 1))]
    pub events: Option<Vec<String>>,
    pub headers: Option<WebhookHeaders>,
    pub is_active: Option<bool>,
}

impl TryFrom<UpdateWebhookRequest> for SubscriptionPatch {
    type Error = WebhookError;

    fn try_from(request: UpdateWebhookRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: request.name,
            url: request.url,
            events: request.events.as_deref().map(parse_events).transpose()?,
            headers: request.headers,
            is_active: request.is_active,
        })
    }
}

/// 触发事件请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct TriggerEventRequest {
    #[validate(length(min = 1))]
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl TriggerEventRequest {
    pub fn event_type(&self) -> Result<WebhookEventType, WebhookError> {
        self.event
            .parse()
            .map_err(|e: crate::domain::models::webhook::UnknownEventType| {
                WebhookError::Validation(e.to_string())
            })
    }
}

/// 投递历史查询参数
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct DeliveryQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
}

fn parse_events(events: &[String]) -> Result<Vec<WebhookEventType>, WebhookError> {
    events
        .iter()
        .map(|event| {
            event
                .parse::<WebhookEventType>()
                .map_err(|e| WebhookError::Validation(e.to_string()))
        })
        .collect()
}
