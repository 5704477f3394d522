// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::application::dto::webhook_request::{CreateWebhookRequest, UpdateWebhookRequest};
use crate::application::dto::webhook_response::{CreatedWebhookResponse, WebhookResponse};
use crate::domain::models::webhook::SubscriptionPatch;
use crate::domain::repositories::subscription_repository::SubscriptionRepository;
use crate::domain::services::subscription_service::{NewSubscription, SubscriptionService};
use crate::presentation::errors::AppError;
use crate::presentation::extractors::owner_id::OwnerId;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 创建订阅
///
/// 响应中包含明文密钥，之后的查询不再返回
pub async fn create_webhook<S: SubscriptionRepository + 'static>(
    Extension(service): Extension<Arc<SubscriptionService<S>>>,
    OwnerId(owner_id): OwnerId,
    Json(request): Json<CreateWebhookRequest>,
) -> Result<(StatusCode, Json<CreatedWebhookResponse>), AppError> {
    request.validate()?;
    let subscription = service
        .create(owner_id, NewSubscription::try_from(request)?)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription.into())))
}

/// 列出当前用户的订阅
pub async fn list_webhooks<S: SubscriptionRepository + 'static>(
    Extension(service): Extension<Arc<SubscriptionService<S>>>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<Vec<WebhookResponse>>, AppError> {
    let subscriptions = service.list_by_owner(owner_id).await?;
    Ok(Json(subscriptions.into_iter().map(Into::into).collect()))
}

/// 获取订阅详情
pub async fn get_webhook<S: SubscriptionRepository + 'static>(
    Extension(service): Extension<Arc<SubscriptionService<S>>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<WebhookResponse>, AppError> {
    let subscription = service.get(id, owner_id).await?;
    Ok(Json(subscription.into()))
}

/// 部分更新订阅
pub async fn update_webhook<S: SubscriptionRepository + 'static>(
    Extension(service): Extension<Arc<SubscriptionService<S>>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWebhookRequest>,
) -> Result<Json<WebhookResponse>, AppError> {
    request.validate()?;
    let subscription = service
        .update(id, owner_id, SubscriptionPatch::try_from(request)?)
        .await?;
    Ok(Json(subscription.into()))
}

/// 删除订阅
pub async fn delete_webhook<S: SubscriptionRepository + 'static>(
    Extension(service): Extension<Arc<SubscriptionService<S>>>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service.delete(id, owner_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
