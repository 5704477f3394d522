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

use crate::application::dto::webhook_request::DeliveryQuery;
use crate::domain::models::webhook::WebhookDelivery;
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::subscription_repository::SubscriptionRepository;
use crate::domain::services::delivery_service::DeliveryService;
use crate::presentation::errors::AppError;
use crate::presentation::extractors::owner_id::OwnerId;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 列出订阅的投递记录
pub async fn list_deliveries<S, D>(
    Extension(service): Extension<Arc<DeliveryService<S, D>>>,
    OwnerId(owner_id): OwnerId,
    Path(webhook_id): Path<Uuid>,
    Query(query): Query<DeliveryQuery>,
) -> Result<Json<Vec<WebhookDelivery>>, AppError>
where
    S: SubscriptionRepository + 'static,
    D: DeliveryRepository + 'static,
{
    query.validate()?;
    let deliveries = service
        .list_deliveries(webhook_id, owner_id, query.limit)
        .await?;
    Ok(Json(deliveries))
}

/// 重新投递，返回新建的投递记录
pub async fn redeliver<S, D>(
    Extension(service): Extension<Arc<DeliveryService<S, D>>>,
    OwnerId(owner_id): OwnerId,
    Path(delivery_id): Path<Uuid>,
) -> Result<(StatusCode, Json<WebhookDelivery>), AppError>
where
    S: SubscriptionRepository + 'static,
    D: DeliveryRepository + 'static,
{
    let delivery = service.redeliver(delivery_id, owner_id).await?;
    Ok((StatusCode::ACCEPTED, Json(delivery)))
}

/// 向订阅发送测试事件
pub async fn test_webhook<S, D>(
    Extension(service): Extension<Arc<DeliveryService<S, D>>>,
    OwnerId(owner_id): OwnerId,
    Path(webhook_id): Path<Uuid>,
) -> Result<(StatusCode, Json<WebhookDelivery>), AppError>
where
    S: SubscriptionRepository + 'static,
    D: DeliveryRepository + 'static,
{
    let delivery = service.send_test(webhook_id, owner_id).await?;
    Ok((StatusCode::ACCEPTED, Json(delivery)))
}
