// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::WebhookDelivery;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// Webhook投递仓库特质
///
/// 投递记录本身是唯一的状态来源。工作器的所有写入都以 `attempt_count`
/// 作为乐观锁版本：条件不满足时不写入并返回 `false`。
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// 创建投递记录
    async fn create(&self, delivery: &WebhookDelivery) -> Result<WebhookDelivery, RepositoryError>;
    /// 根据ID查找投递记录
    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookDelivery>, RepositoryError>;
    /// 查找订阅的投递记录，按创建时间倒序
    async fn find_by_webhook(
        &self,
        webhook_id: Uuid,
        limit: u64,
    ) -> Result<Vec<WebhookDelivery>, RepositoryError>;
    /// 查找尚未进入终态的投递记录，按创建时间正序
    async fn find_unfinished(&self, limit: u64) -> Result<Vec<WebhookDelivery>, RepositoryError>;
    /// 占用一次尝试：`attempt_count` 从 `expected` 加一
    async fn claim_attempt(&self, id: Uuid, expected: i32) -> Result<bool, RepositoryError>;
    /// 写入尝试结果，仅当 `attempt_count` 仍等于记录中的值且未进入终态
    async fn record_outcome(&self, delivery: &WebhookDelivery) -> Result<bool, RepositoryError>;
}
