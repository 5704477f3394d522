// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{
    SubscriptionPatch, WebhookEventType, WebhookHeaders, WebhookSubscription,
};
use crate::domain::repositories::subscription_repository::SubscriptionRepository;
use crate::utils::errors::WebhookError;
use crate::utils::validators::validate_target_url;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 密钥前缀
const SECRET_PREFIX: &str = "whsec_";
/// 密钥随机部分长度
const SECRET_LENGTH: usize = 32;

/// 新订阅的默认配置
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionDefaults {
    /// 最大投递次数
    pub retry_count: i32,
    /// 请求超时（毫秒）
    pub timeout_ms: i32,
}

impl Default for SubscriptionDefaults {
    fn default() -> Self {
        Self {
            retry_count: 3,
            timeout_ms: 5000,
        }
    }
}

/// 创建订阅的参数
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub name: String,
    pub url: String,
    pub events: Vec<WebhookEventType>,
    pub headers: Option<WebhookHeaders>,
    pub retry_count: Option<i32>,
    pub timeout_ms: Option<i32>,
}

impl NewSubscription {
    pub fn new(name: impl Into<String>, url: impl Into<String>, events: Vec<WebhookEventType>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            events,
            headers: None,
            retry_count: None,
            timeout_ms: None,
        }
    }
}

/// 订阅管理服务
///
/// 负责订阅的创建、修改、删除和查询，所有修改操作都限定在所属用户范围内
pub struct SubscriptionService<S: SubscriptionRepository> {
    repo: Arc<S>,
    defaults: SubscriptionDefaults,
}

impl<S: SubscriptionRepository> SubscriptionService<S> {
    pub fn new(repo: Arc<S>, defaults: SubscriptionDefaults) -> Self {
        Self { repo, defaults }
    }

    /// 创建订阅
    ///
    /// 生成新的签名密钥，新订阅默认启用
    ///
    /// # 返回值
    ///
    /// * `Ok(WebhookSubscription)` - 包含明文密钥的订阅
    /// * `Err(WebhookError::Validation)` - URL无效或事件为空
    pub async fn create(
        &self,
        owner_id: Uuid,
        input: NewSubscription,
    ) -> Result<WebhookSubscription, WebhookError> {
        validate_name(&input.name)?;
        validate_url(&input.url)?;
        let events = validate_events(input.events)?;

        let retry_count = input.retry_count.unwrap_or(self.defaults.retry_count);
        if retry_count < 1 {
            return Err(WebhookError::Validation(
                "retry_count must be at least 1".to_string(),
            ));
        }
        let timeout_ms = input.timeout_ms.unwrap_or(self.defaults.timeout_ms);
        if timeout_ms < 1 {
            return Err(WebhookError::Validation(
                "timeout_ms must be positive".to_string(),
            ));
        }

        let subscription = WebhookSubscription::new(
            owner_id,
            input.name,
            input.url,
            events,
            generate_secret(),
            input.headers.filter(|h| !h.is_empty()),
            retry_count,
            timeout_ms,
        );

        let created = self.repo.create(&subscription).await?;
        info!(
            webhook_id = %created.id,
            owner_id = %owner_id,
            "Webhook subscription created"
        );
        Ok(created)
    }

    /// 部分更新订阅
    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: SubscriptionPatch,
    ) -> Result<WebhookSubscription, WebhookError> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(url) = &patch.url {
            validate_url(url)?;
        }
        let patch = SubscriptionPatch {
            events: patch.events.map(validate_events).transpose()?,
            ..patch
        };

        let mut subscription = self.get(id, owner_id).await?;
        if patch.is_empty() {
            return Ok(subscription);
        }

        subscription.apply(patch);
        let updated = self.repo.update(&subscription).await?;
        info!(
            webhook_id = %id,
            active = updated.is_active,
            "Webhook subscription updated"
        );
        Ok(updated)
    }

    /// 删除订阅
    ///
    /// 投递历史保留，不做级联删除
    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<(), WebhookError> {
        if self.repo.delete(id, owner_id).await? {
            info!(webhook_id = %id, "Webhook subscription deleted");
            Ok(())
        } else {
            Err(WebhookError::NotFound)
        }
    }

    /// 获取单个订阅
    pub async fn get(&self, id: Uuid, owner_id: Uuid) -> Result<WebhookSubscription, WebhookError> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|sub| sub.owner_id == owner_id)
            .ok_or(WebhookError::NotFound)
    }

    /// 列出用户的全部订阅，最新的在前
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<WebhookSubscription>, WebhookError> {
        Ok(self.repo.find_by_owner(owner_id).await?)
    }

    /// 列出订阅了指定事件的启用订阅
    pub async fn list_active_for_event(
        &self,
        event_type: WebhookEventType,
    ) -> Result<Vec<WebhookSubscription>, WebhookError> {
        Ok(self.repo.find_active_for_event(event_type).await?)
    }
}

/// 生成订阅密钥
///
/// `whsec_` 前缀加32位字母数字随机串
pub fn generate_secret() -> String {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect();
    format!("{}{}", SECRET_PREFIX, token)
}

fn validate_name(name: &str) -> Result<(), WebhookError> {
    if name.trim().is_empty() {
        return Err(WebhookError::Validation("name cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), WebhookError> {
    validate_target_url(url)
        .map(|_| ())
        .map_err(|e| WebhookError::Validation(e.to_string()))
}

fn validate_events(events: Vec<WebhookEventType>) -> Result<Vec<WebhookEventType>, WebhookError> {
    if events.is_empty() {
        return Err(WebhookError::Validation(
            "events cannot be empty".to_string(),
        ));
    }

    let mut unique = Vec::with_capacity(events.len());
    for event in events {
        if !unique.contains(&event) {
            unique.push(event);
        }
    }
    Ok(unique)
}
