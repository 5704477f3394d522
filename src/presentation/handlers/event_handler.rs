// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::webhook_request::TriggerEventRequest;
use crate::application::dto::webhook_response::DispatchResponse;
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::subscription_repository::SubscriptionRepository;
use crate::domain::services::dispatcher::Dispatcher;
use crate::presentation::errors::AppError;
use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

/// 触发领域事件
///
/// 只创建投递记录，不等待投递结果
pub async fn trigger_event<S, D>(
    Extension(dispatcher): Extension<Arc<Dispatcher<S, D>>>,
    Json(request): Json<TriggerEventRequest>,
) -> Result<(StatusCode, Json<DispatchResponse>), AppError>
where
    S: SubscriptionRepository + 'static,
    D: DeliveryRepository + 'static,
{
    request.validate()?;
    let event_type = request.event_type()?;
    let delivery_ids = dispatcher.trigger(event_type, request.data).await?;
    Ok((StatusCode::ACCEPTED, Json(DispatchResponse { delivery_ids })))
}
