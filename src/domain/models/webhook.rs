// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 自定义请求头集合
///
/// 使用有序映射，保证序列化结果稳定
pub type WebhookHeaders = BTreeMap<String, String>;

/// Webhook订阅实体
///
/// 表示一个已注册的Webhook端点，包含事件过滤条件、签名密钥以及
/// 投递时使用的重试与超时配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
    /// 订阅唯一标识符
    pub id: Uuid,
    /// 所属用户ID，用于权限隔离和归属管理
    pub owner_id: Uuid,
    /// 显示名称
    pub name: String,
    /// 回调URL，接收通知的目标地址
    pub url: String,
    /// 订阅的事件类型
    pub events: Vec<WebhookEventType>,
    /// 签名密钥，仅在创建时返回给调用方
    pub secret: String,
    /// 额外的HTTP请求头
    pub headers: Option<WebhookHeaders>,
    /// 是否启用
    pub is_active: bool,
    /// 最大投递次数（含首次投递）
    pub retry_count: i32,
    /// 单次请求超时（毫秒）
    pub timeout_ms: i32,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl WebhookSubscription {
    /// 创建一个新的Webhook订阅
    ///
    /// 新订阅默认处于启用状态
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: Uuid,
        name: String,
        url: String,
        events: Vec<WebhookEventType>,
        secret: String,
        headers: Option<WebhookHeaders>,
        retry_count: i32,
        timeout_ms: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            url,
            events,
            secret,
            headers,
            is_active: true,
            retry_count,
            timeout_ms,
            created_at: now,
            updated_at: now,
        }
    }

    /// 判断订阅是否应接收指定事件
    pub fn accepts(&self, event_type: WebhookEventType) -> bool {
        self.is_active && self.events.contains(&event_type)
    }

    /// 应用部分更新
    pub fn apply(&mut self, patch: SubscriptionPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(events) = patch.events {
            self.events = events;
        }
        if let Some(headers) = patch.headers {
            self.headers = if headers.is_empty() {
                None
            } else {
                Some(headers)
            };
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

/// 订阅的部分更新
///
/// 只有名称、URL、事件、请求头和启用状态可以修改。
/// 传入空的请求头集合表示清除全部自定义请求头。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub events: Option<Vec<WebhookEventType>>,
    pub headers: Option<WebhookHeaders>,
    pub is_active: Option<bool>,
}

impl SubscriptionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.events.is_none()
            && self.headers.is_none()
            && self.is_active.is_none()
    }
}

/// Webhook投递记录
///
/// 记录一次事件向一个订阅的投递过程（包括所有重试）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    /// 投递唯一标识符
    pub id: Uuid,
    /// 所属订阅ID，订阅被删除后仍保留
    pub webhook_id: Uuid,
    /// 事件类型
    pub event_type: WebhookEventType,
    /// 事件负载数据
    pub payload: serde_json::Value,
    /// 投递状态
    pub status: DeliveryStatus,
    /// 最后一次HTTP响应状态码
    pub response_status: Option<i32>,
    /// 最后一次HTTP响应体（已截断）
    pub response_body: Option<String>,
    /// 最后一次失败的错误描述
    pub error_message: Option<String>,
    /// 已尝试次数
    pub attempt_count: i32,
    /// 成功投递时间
    pub delivered_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl WebhookDelivery {
    /// 为订阅创建一条待投递记录
    pub fn new(webhook_id: Uuid, event_type: WebhookEventType, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            webhook_id,
            event_type,
            payload,
            status: DeliveryStatus::Pending,
            response_status: None,
            response_body: None,
            error_message: None,
            attempt_count: 0,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 投递状态
///
/// `Delivered` 和 `Failed` 为终态，进入后不再变化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// 已创建，尚未尝试
    #[default]
    Pending,
    /// 已成功投递
    Delivered,
    /// 重试次数耗尽
    Failed,
    /// 失败，等待下一次重试
    Retrying,
}

impl DeliveryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Failed)
    }

    /// 根据一次尝试的结果计算下一个状态
    ///
    /// `attempt_count` 为本次尝试计入后的次数
    pub fn after_attempt(success: bool, attempt_count: i32, retry_limit: i32) -> Self {
        if success {
            DeliveryStatus::Delivered
        } else if attempt_count < retry_limit {
            DeliveryStatus::Retrying
        } else {
            DeliveryStatus::Failed
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Retrying => "retrying",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Webhook事件类型枚举
///
/// 平台对外发布的固定事件集合，序列化为点分形式的标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEventType {
    #[serde(rename = "project.created")]
    ProjectCreated,
    #[serde(rename = "project.updated")]
    ProjectUpdated,
    #[serde(rename = "project.deleted")]
    ProjectDeleted,
    #[serde(rename = "event.created")]
    EventCreated,
    #[serde(rename = "event.updated")]
    EventUpdated,
    #[serde(rename = "event.deleted")]
    EventDeleted,
    #[serde(rename = "ticket.purchased")]
    TicketPurchased,
    #[serde(rename = "ticket.refunded")]
    TicketRefunded,
    #[serde(rename = "order.completed")]
    OrderCompleted,
    #[serde(rename = "order.cancelled")]
    OrderCancelled,
    #[serde(rename = "payment.succeeded")]
    PaymentSucceeded,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(rename = "crew.assigned")]
    CrewAssigned,
    #[serde(rename = "crew.removed")]
    CrewRemoved,
    #[serde(rename = "asset.checked_out")]
    AssetCheckedOut,
    #[serde(rename = "asset.returned")]
    AssetReturned,
    #[serde(rename = "document.uploaded")]
    DocumentUploaded,
    #[serde(rename = "user.created")]
    UserCreated,
    #[serde(rename = "user.updated")]
    UserUpdated,
}

impl WebhookEventType {
    pub const ALL: [WebhookEventType; 19] = [
        WebhookEventType::ProjectCreated,
        WebhookEventType::ProjectUpdated,
        WebhookEventType::ProjectDeleted,
        WebhookEventType::EventCreated,
        WebhookEventType::EventUpdated,
        WebhookEventType::EventDeleted,
        WebhookEventType::TicketPurchased,
        WebhookEventType::TicketRefunded,
        WebhookEventType::OrderCompleted,
        WebhookEventType::OrderCancelled,
        WebhookEventType::PaymentSucceeded,
        WebhookEventType::PaymentFailed,
        WebhookEventType::CrewAssigned,
        WebhookEventType::CrewRemoved,
        WebhookEventType::AssetCheckedOut,
        WebhookEventType::AssetReturned,
        WebhookEventType::DocumentUploaded,
        WebhookEventType::UserCreated,
        WebhookEventType::UserUpdated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WebhookEventType::ProjectCreated => "project.created",
            WebhookEventType::ProjectUpdated => "project.updated",
            WebhookEventType::ProjectDeleted => "project.deleted",
            WebhookEventType::EventCreated => "event.created",
            WebhookEventType::EventUpdated => "event.updated",
            WebhookEventType::EventDeleted => "event.deleted",
            WebhookEventType::TicketPurchased => "ticket.purchased",
            WebhookEventType::TicketRefunded => "ticket.refunded",
            WebhookEventType::OrderCompleted => "order.completed",
            WebhookEventType::OrderCancelled => "order.cancelled",
            WebhookEventType::PaymentSucceeded => "payment.succeeded",
            WebhookEventType::PaymentFailed => "payment.failed",
            WebhookEventType::CrewAssigned => "crew.assigned",
            WebhookEventType::CrewRemoved => "crew.removed",
            WebhookEventType::AssetCheckedOut => "asset.checked_out",
            WebhookEventType::AssetReturned => "asset.returned",
            WebhookEventType::DocumentUploaded => "document.uploaded",
            WebhookEventType::UserCreated => "user.created",
            WebhookEventType::UserUpdated => "user.updated",
        }
    }
}

impl fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知的事件类型标签
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown webhook event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for WebhookEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WebhookEventType::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// 发送给订阅方的请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: WebhookEventType,
    pub data: serde_json::Value,
    pub webhook_id: Uuid,
    pub delivery_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl WebhookEnvelope {
    pub fn for_delivery(delivery: &WebhookDelivery, timestamp: DateTime<Utc>) -> Self {
        Self {
            event: delivery.event_type,
            data: delivery.payload.clone(),
            webhook_id: delivery.webhook_id,
            delivery_id: delivery.id,
            timestamp,
        }
    }
}
