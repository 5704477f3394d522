// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{WebhookEventType, WebhookSubscription};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// Webhook订阅仓库特质
///
/// 定义Webhook订阅数据访问接口
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// 创建订阅
    async fn create(
        &self,
        subscription: &WebhookSubscription,
    ) -> Result<WebhookSubscription, RepositoryError>;
    /// 根据ID查找订阅
    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookSubscription>, RepositoryError>;
    /// 查找用户的全部订阅，按创建时间倒序
    async fn find_by_owner(&self, owner_id: Uuid)
        -> Result<Vec<WebhookSubscription>, RepositoryError>;
    /// 查找订阅了指定事件的启用订阅
    async fn find_active_for_event(
        &self,
        event_type: WebhookEventType,
    ) -> Result<Vec<WebhookSubscription>, RepositoryError>;
    /// 更新订阅
    async fn update(
        &self,
        subscription: &WebhookSubscription,
    ) -> Result<WebhookSubscription, RepositoryError>;
    /// 删除订阅，返回是否删除了记录
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, RepositoryError>;
}
